#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # jflap-grader
//!
//! `jflap-grader check <TESTFILE>` shows what a test file expects.
//! `jflap-grader grade <TESTFILE>...` grades the JFLAP file sitting next to
//! each test file and prints the report as JSON, or as a table with
//! `--table`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use indexmap::IndexMap;
use jflap_grader::{
    GradeOptions, GradingReport, Verdict,
    bitstrings::len_lex,
    config, run_tests,
    testfile::{HookLimits, ResultKeywords, parse_test_file_with},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Print the words a test file tests, with their verdicts
    Check(PathBuf),
    /// Grade the JFLAP files next to the given test files
    Grade {
        /// time budget per test file, in seconds
        timeout: Option<f64>,
        /// arguments placed before the checker command
        prefix:  Vec<String>,
        /// print a table instead of JSON
        table:   bool,
        /// test files to grade
        files:   Vec<PathBuf>,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses a test file path
    fn f() -> impl Parser<PathBuf> {
        positional("TESTFILE").help("Path to a JFLAP test file")
    }

    let check = construct!(Cmd::Check(f()))
        .to_options()
        .command("check")
        .help("List the words a test file tests, in length-lexicographic order");

    let timeout = long("timeout")
        .help("Time budget for each test file in seconds, shared among its words")
        .argument::<f64>("SECS")
        .optional();
    let prefix = long("prefix")
        .help("Argument placed before the checker command, may be repeated")
        .argument::<String>("ARG")
        .many();
    let table = long("table")
        .help("Print a table of failures instead of JSON")
        .switch();
    let files = positional::<PathBuf>("TESTFILE")
        .help("Path to a JFLAP test file")
        .some("at least one test file is required");
    let grade = construct!(Cmd::Grade {
        timeout,
        prefix,
        table,
        files
    })
    .to_options()
    .command("grade")
    .help("Grade the JFLAP file next to each test file");

    let cmd = construct!([check, grade]);

    cmd.to_options()
        .descr("Grades JFLAP automata against test files")
        .run()
}

/// Prints every word of a test file with its verdict.
fn check(path: &Path, limits: &HookLimits) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read test file {}", path.display()))?;
    let spec = parse_test_file_with(&contents, &ResultKeywords::default(), limits)
        .with_context(|| format!("Could not parse test file '{}'", path.display()))?;

    let mut words: Vec<(&str, Verdict)> = spec.iter().collect();
    words.sort_by(|(a, _), (b, _)| len_lex(a).cmp(&len_lex(b)));
    for (word, verdict) in words {
        let verdict = match verdict {
            Verdict::Accept => verdict.to_string().green(),
            Verdict::Reject => verdict.to_string().red(),
        };
        println!("{}\t{verdict}", snailquote::escape(word));
    }
    Ok(())
}

/// Prints a short summary and the failure table of one report.
fn print_table(path: &Path, report: &GradingReport) {
    let summary = &report.summary;
    if summary.crashed {
        println!("{}: {}", path.display(), "could not grade".red().bold());
        println!("{}", summary.raw_stderr);
        return;
    }

    let score = format!("{}/{} passed", report.passed(), summary.total_tests);
    let score = if summary.failed_tests == 0 {
        score.green()
    } else {
        score.yellow()
    };
    println!("{}: {}", path.display(), score.bold());
    if !report.failures.is_empty() {
        println!("{}", report.failure_table());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let config = config::ensure_initialized()?;
    let limits = HookLimits::builder()
        .max_operations(config.hook_max_operations())
        .build();

    match options() {
        Cmd::Check(path) => check(&path, &limits)?,
        Cmd::Grade {
            timeout,
            prefix,
            table,
            files,
        } => {
            let time_limit = match timeout {
                Some(secs) => Some(
                    Duration::try_from_secs_f64(secs)
                        .with_context(|| format!("Invalid timeout: {secs}"))?,
                ),
                None => config.time_limit(),
            };
            let options = GradeOptions::builder()
                .command_prefix(prefix)
                .time_limit(time_limit)
                .hook_limits(limits)
                .build();

            let mut reports = IndexMap::new();
            for path in files {
                let report = run_tests(&path, &options).await;
                if table {
                    print_table(&path, &report);
                }
                reports.insert(path.display().to_string(), report);
            }

            if !table {
                let json = match reports.first() {
                    Some((_, report)) if reports.len() == 1 => {
                        serde_json::to_string_pretty(report)
                    }
                    _ => serde_json::to_string_pretty(&reports),
                }
                .context("Failed to serialize grading report")?;
                println!("{json}");
            }
        }
    };

    Ok(())
}
