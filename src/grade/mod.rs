#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path, time::Duration};

use anyhow::Context;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

use crate::{
    config::{self, ConfigState},
    constants::{CHECKER_RUN_SUBCOMMAND, JAVA_HEADLESS_FLAG},
    process::run_bounded,
    testfile::{HookLimits, ParseError, ResultKeywords, parse_test_file_with},
};

/// Locating the JFLAP file a test file is meant for.
pub mod artifact;
/// Classifying one checker run.
pub mod outcome;
/// Grading reports and their renderings.
pub mod report;

pub use artifact::resolve_artifact;
pub use outcome::{Classified, GradingOutcome, classify};
pub use report::{FailedTest, GradingReport, GradingSummary};

/// A test file that cannot be graded, with a message meant for students.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    /// The test file is malformed.
    #[error("Could not parse test file '{path}': {source}")]
    Parse {
        /// the test file, as given
        path:   String,
        /// what is wrong with it
        source: ParseError,
    },
    /// Several JFLAP files are present and the test file name does not say
    /// which one to use.
    #[error("Test file '{test_file}' does not have an extension")]
    NoExtension {
        /// file name of the test file
        test_file: String,
    },
    /// No JFLAP file matches the test file name.
    #[error(
        "Test file '{test_file}' does not match any of the available JFLAP files, which are: \
         {candidates}"
    )]
    NoMatchingArtifact {
        /// file name of the test file
        test_file:  String,
        /// quoted, comma separated JFLAP file names
        candidates: String,
    },
}

/// Why a grading run produced no per-word results.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// An expected problem with the inputs.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Anything else; reported with its full chain.
    #[error(transparent)]
    Crash(#[from] anyhow::Error),
}

/// The launcher arguments placed before the artifact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerCommand(Vec<OsString>);

impl CheckerCommand {
    /// An arbitrary launcher, eg. a script standing in for the checker.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self(argv.into_iter().map(Into::into).collect())
    }

    /// `<java> -Dapple.awt.UIElement=true -jar <jar> run`.
    pub fn java(java: impl Into<OsString>, jar: impl Into<OsString>) -> Self {
        Self(vec![
            java.into(),
            JAVA_HEADLESS_FLAG.into(),
            "-jar".into(),
            jar.into(),
            CHECKER_RUN_SUBCOMMAND.into(),
        ])
    }

    /// The Java checker described by `config`.
    pub fn from_config(config: &ConfigState) -> Self {
        Self::java(config.java(), config.checker_jar())
    }

    /// The launcher arguments.
    pub fn args(&self) -> &[OsString] {
        &self.0
    }
}

impl Default for CheckerCommand {
    fn default() -> Self {
        Self::from_config(&config::get())
    }
}

/// Settings for one grading run.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct GradeOptions {
    /// Arguments placed before the checker command, eg. a sandbox wrapper.
    pub command_prefix: Vec<String>,
    /// The checker launcher.
    pub checker:        CheckerCommand,
    /// Time budget for the whole test file, split evenly among its words.
    pub time_limit:     Option<Duration>,
    /// Result specifier keywords.
    pub keywords:       ResultKeywords,
    /// Limits for the test file's hooks.
    #[builder(default = HookLimits::builder().max_operations(config::hook_max_operations()).build())]
    pub hook_limits:    HookLimits,
    /// Extra environment for the checker.
    pub env:            Vec<(OsString, OsString)>,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GradeOptions {
    /// Full command line checking `word` against `artifact`.
    ///
    /// The checker's argument parser trims each argument and strips one pair
    /// of surrounding double quotes, so the word is always wrapped in quotes.
    fn checker_argv(&self, artifact: &Path, word: &str) -> Vec<OsString> {
        self.command_prefix
            .iter()
            .map(OsString::from)
            .chain(self.checker.args().iter().cloned())
            .chain([artifact.as_os_str().to_owned(), OsString::from(format!("\"{word}\""))])
            .collect()
    }
}

/// Time each word gets out of `limit` when `total` words are tested. A zero
/// budget means no limit.
fn per_test_timeout(limit: Option<Duration>, total: usize) -> Option<Duration> {
    match (limit, total) {
        (Some(limit), total) if total > 0 && !limit.is_zero() => {
            Some(limit.div_f64(total as f64))
        }
        _ => None,
    }
}

/// Grades the JFLAP file next to `test_file`, or explains why it could not.
pub async fn try_run_tests(
    test_file: &Path,
    options: &GradeOptions,
) -> Result<GradingReport, GradeError> {
    let contents = tokio::fs::read_to_string(test_file)
        .await
        .with_context(|| format!("failed to read test file {}", test_file.display()))?;
    let spec = parse_test_file_with(&contents, &options.keywords, &options.hook_limits).map_err(
        |source| SetupError::Parse {
            path: test_file.display().to_string(),
            source,
        },
    )?;
    let artifact = resolve_artifact(test_file)?;

    let total = spec.len();
    let timeout = per_test_timeout(options.time_limit, total);
    info!(
        "grading {} with {total} words from {} (per-word limit: {timeout:?})",
        artifact.display(),
        test_file.display()
    );

    let mut report = GradingReport::default();
    report.summary.total_tests = total;

    for (word, expected) in spec.iter() {
        let argv = options.checker_argv(&artifact, word);
        debug!("running {argv:?}");
        let output = run_bounded(&argv, timeout, &options.env).await;
        report.summary.raw_stdout.push_str(&output.stdout);
        report.summary.raw_stderr.push_str(&output.stderr);

        let Classified { outcome, hint } = classify(&output, expected, timeout);
        if !outcome.is_pass() {
            warn!("word {:?}: {outcome}", word);
            report
                .failures
                .insert(word.to_string(), FailedTest { outcome, hint });
        }
    }
    report.summary.failed_tests = report.failures.len();

    Ok(report)
}

/// Grades the JFLAP file next to `test_file`. Never fails: problems are
/// reported through [`GradingSummary::crashed`] and
/// [`GradingSummary::raw_stderr`].
pub async fn run_tests(test_file: &Path, options: &GradeOptions) -> GradingReport {
    match try_run_tests(test_file, options).await {
        Ok(report) => report,
        Err(GradeError::Setup(e)) => {
            warn!("{e}");
            GradingReport::crashed(e.to_string())
        }
        Err(GradeError::Crash(e)) => {
            error!("grading {} crashed: {e:#}", test_file.display());
            GradingReport::crashed(format!("{e:?}"))
        }
    }
}
