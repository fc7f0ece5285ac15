#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Result specifiers meaning a word should be accepted.
pub const ACCEPT_KEYWORDS: &[&str] = &["accepted", "accepts", "yes", "good", "ok"];

/// Result specifiers meaning a word should be rejected.
pub const REJECT_KEYWORDS: &[&str] = &["rejected", "rejects", "no", "bad"];

/// Suffix marking a rejected word in legacy test files.
pub const LEGACY_REJECT_SUFFIX: &str = "reject";

/// File extension of JFLAP automata.
pub const ARTIFACT_EXTENSION: &str = "jff";

/// file name of the JFLAP command line checker jar
pub const CHECKER_JAR: &str = "jflaplib-cli.jar";

/// Keeps the JVM out of the macOS app switcher while the checker runs.
pub const JAVA_HEADLESS_FLAG: &str = "-Dapple.awt.UIElement=true";

/// Checker subcommand that runs an automaton on one word.
pub const CHECKER_RUN_SUBCOMMAND: &str = "run";

/// Substring in checker output meaning the word was accepted.
pub const ACCEPT_MARKER: &str = "true";

/// Substring in checker output meaning the word was rejected.
pub const REJECT_MARKER: &str = "false";

/// Placeholder for empty output in failure hints.
pub const NO_OUTPUT_PLACEHOLDER: &str = "(none)";

/// Default limit on Rhai operations per hook invocation.
pub const DEFAULT_HOOK_MAX_OPERATIONS: u64 = 1_000_000;
