//! # jflap-grader
//!
//! Grades JFLAP automata and Turing machines against test files. A test file
//! lists words with the verdict the machine should reach, and may script
//! extra words or verdicts with small Rhai hooks.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Enumeration of binary strings and the length-lexicographic order
pub mod bitstrings;
/// Environment-driven runtime configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// For all things related to grading
pub mod grade;
/// Running external commands under a deadline
pub mod process;
/// Test file parsing and hook evaluation
pub mod testfile;
/// Utility functions for convenience
pub mod util;

pub use grade::{
    CheckerCommand, GradeError, GradeOptions, GradingOutcome, GradingReport, GradingSummary,
    SetupError, run_tests, try_run_tests,
};
pub use testfile::{
    ParseError, ResolvedSpecification, Verdict, parse_test_file, parse_test_file_with, test_names,
};
