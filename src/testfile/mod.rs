#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use serde::Serialize;

/// Indentation-driven collection of `words` / `check` hook bodies.
pub mod hooks;
/// Result specifier keyword table.
pub mod keywords;
/// Test file parsing, in both legacy and modern formats.
pub mod parse;
/// Line-level grammars used by the test file parser.
pub mod parsers;
/// Rhai sandbox evaluating hook bodies.
pub mod sandbox;
/// Quote-aware tokenizer for test case lines.
pub mod split;

pub use hooks::{HookCollector, HookDefinition, Hooks, LineClass};
pub use keywords::{KeywordMatch, ResultKeywords};
pub use parse::{
    ResolvedSpecification, Specification, parse_test_file, parse_test_file_with, test_names,
};
pub use sandbox::HookLimits;
pub use split::{QuoteKind, SplitError, split_with_quotes};

/// What the automaton is expected to do with a word, once known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The automaton must accept the word.
    Accept,
    /// The automaton must reject the word.
    Reject,
}

impl Verdict {
    /// `Accept` when `accepted` is true, `Reject` otherwise.
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted { Self::Accept } else { Self::Reject }
    }

    /// Whether this verdict is `Accept`.
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accepted"),
            Self::Reject => write!(f, "rejected"),
        }
    }
}

/// Expectation attached to a word while a test file is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    /// The word must be accepted.
    Accept,
    /// The word must be rejected.
    Reject,
    /// Not decided yet; resolved by the `check` hook or defaults to accept.
    Pending,
}

impl Expectation {
    /// The decided verdict, or `None` while pending.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Self::Accept => Some(Verdict::Accept),
            Self::Reject => Some(Verdict::Reject),
            Self::Pending => None,
        }
    }
}

impl From<Verdict> for Expectation {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Self::Accept,
            Verdict::Reject => Self::Reject,
        }
    }
}

/// The two hooks a test file may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    /// `words()`: yields extra words to test.
    Words,
    /// `check(word)`: decides the verdict of words without one.
    Check,
}

impl HookName {
    /// Number of parameters the hook must declare.
    pub fn arity(self) -> usize {
        match self {
            Self::Words => 0,
            Self::Check => 1,
        }
    }

    /// Name of the hook as written in test files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Check => "check",
        }
    }

    /// Looks a hook up by the name used in test files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "words" => Some(Self::Words),
            "check" => Some(Self::Check),
            _ => None,
        }
    }

    /// Human readable arity, used in diagnostics.
    fn arity_description(self) -> &'static str {
        match self {
            Self::Words => "no arguments",
            Self::Check => "one argument",
        }
    }
}

impl Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error in a test file. Every variant blames a 1-based line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A test case could not be tokenized.
    #[error("malformed test case on line {line}: {source}")]
    MalformedTestCase {
        /// offending line
        line:   usize,
        /// tokenizer error
        source: SplitError,
    },
    /// A hook was defined twice.
    #[error("duplicate definitions of '{hook}' on lines {first} and {second}")]
    DuplicateHook {
        /// which hook
        hook:   HookName,
        /// line of the first definition
        first:  usize,
        /// line of the second definition
        second: usize,
    },
    /// The last token of a test case matched no result keyword.
    #[error(
        "result specifier '{specifier}' on line {line} does not match any of the valid result \
         specifiers, which are: {candidates}"
    )]
    UnrecognizedSpecifier {
        /// the (lower-cased) specifier
        specifier:  String,
        /// offending line
        line:       usize,
        /// quoted list of the valid keywords
        candidates: String,
    },
    /// The last token of a test case matched both an accept and a reject
    /// keyword.
    #[error(
        "result specifier '{specifier}' on line {line} is ambiguous, could match either '{accept}' \
         or '{reject}'"
    )]
    AmbiguousSpecifier {
        /// the (lower-cased) specifier
        specifier: String,
        /// offending line
        line:      usize,
        /// a matching accept keyword
        accept:    String,
        /// a matching reject keyword
        reject:    String,
    },
    /// Two explicit test cases disagree on the verdict for one word.
    #[error(
        "test case on line {first} specifies that input string '{word}' should be {previous}, but \
         test case on line {second} specifies that it should be {current}"
    )]
    ConflictingVerdicts {
        /// the word in question
        word:     String,
        /// line of the earlier test case
        first:    usize,
        /// verdict of the earlier test case
        previous: Verdict,
        /// line of the later test case
        second:   usize,
        /// verdict of the later test case
        current:  Verdict,
    },
    /// A hook declares the wrong number of parameters.
    #[error(
        "'{hook}' must be a function of {}, but it is defined with {found} required arguments (on \
         line {line})",
        .hook.arity_description()
    )]
    HookArity {
        /// which hook
        hook:  HookName,
        /// number of declared parameters
        found: usize,
        /// line of the hook header
        line:  usize,
    },
    /// A hook body does not compile.
    #[error("syntax error in definition of '{hook}' on line {line}: {message}")]
    HookSyntax {
        /// which hook
        hook:    HookName,
        /// file line the error points at
        line:    usize,
        /// compiler message
        message: String,
    },
    /// A hook failed while running.
    #[error("error on line {line} while invoking {call}: {message}")]
    HookRuntime {
        /// file line the error points at
        line:    usize,
        /// the call that failed, eg. `check('01')`
        call:    String,
        /// runtime message
        message: String,
    },
}

impl ParseError {
    /// The 1-based line this error blames. For errors naming two lines, the
    /// later one.
    pub fn line(&self) -> usize {
        match self {
            Self::MalformedTestCase { line, .. }
            | Self::UnrecognizedSpecifier { line, .. }
            | Self::AmbiguousSpecifier { line, .. }
            | Self::HookArity { line, .. }
            | Self::HookSyntax { line, .. }
            | Self::HookRuntime { line, .. } => *line,
            Self::DuplicateHook { second, .. } | Self::ConflictingVerdicts { second, .. } => *second,
        }
    }
}
