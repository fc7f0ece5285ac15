#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, time::Duration};

use crate::{
    constants::{ACCEPT_MARKER, NO_OUTPUT_PLACEHOLDER, REJECT_MARKER},
    process::RunOutput,
    testfile::Verdict,
};

/// How a single word fared against the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingOutcome {
    /// The checker agreed with the expected verdict.
    Pass,
    /// The checker did not finish within its share of the time limit.
    Timeout,
    /// The checker printed both `true` and `false`.
    AmbiguousOutput,
    /// The checker printed neither `true` nor `false`.
    NoOutput,
    /// The checker disagreed with the expected verdict.
    WrongAnswer,
}

impl GradingOutcome {
    /// Whether the word passed.
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl Display for GradingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pass => "pass",
            Self::Timeout => "timeout",
            Self::AmbiguousOutput => "ambiguous output",
            Self::NoOutput => "no output",
            Self::WrongAnswer => "wrong answer",
        };
        f.write_str(label)
    }
}

/// An outcome with the hint shown to students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// what happened
    pub outcome: GradingOutcome,
    /// explanation; empty for [`GradingOutcome::Pass`]
    pub hint:    String,
}

/// Trimmed text, or the placeholder when nothing is left.
fn or_none(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.is_empty() { NO_OUTPUT_PLACEHOLDER } else { trimmed }
}

/// Classifies one checker run against the expected verdict.
///
/// A timeout wins over anything the checker printed. Otherwise stdout is
/// searched for the substrings `true` and `false`.
pub fn classify(output: &RunOutput, expected: Verdict, timeout: Option<Duration>) -> Classified {
    let (outcome, hint) = if output.timed_out {
        let limit = timeout.map_or_else(|| "the time limit".to_string(), |t| {
            format!("{} seconds", t.as_secs_f64())
        });
        (GradingOutcome::Timeout, format!("Timed out (took more than {limit})"))
    } else {
        let accepted = output.stdout.contains(ACCEPT_MARKER);
        let rejected = output.stdout.contains(REJECT_MARKER);
        let streams = || {
            format!("output: {}; error: {}", or_none(&output.stdout), or_none(&output.stderr))
        };

        match (accepted, rejected) {
            (true, true) => (
                GradingOutcome::AmbiguousOutput,
                format!("JFLAP reported both 'accept' and 'reject', {}", streams()),
            ),
            (false, false) => (
                GradingOutcome::NoOutput,
                format!("JFLAP reported neither 'accept' nor 'reject', {}", streams()),
            ),
            (accepted, _) => {
                let actual = Verdict::from_accepted(accepted);
                if actual == expected {
                    (GradingOutcome::Pass, String::new())
                } else {
                    (
                        GradingOutcome::WrongAnswer,
                        format!("This word should have been {expected}, but it was {actual}"),
                    )
                }
            }
        }
    };
    Classified { outcome, hint }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str, timed_out: bool) -> RunOutput {
        RunOutput {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out,
        }
    }

    #[test]
    fn timeout_wins_over_output() {
        let c = classify(
            &output("true\n", "", true),
            Verdict::Accept,
            Some(Duration::from_millis(500)),
        );
        assert_eq!(c.outcome, GradingOutcome::Timeout);
        assert_eq!(c.hint, "Timed out (took more than 0.5 seconds)");
    }

    #[test]
    fn ambiguous_and_missing_output() {
        let c = classify(&output("true false", "", false), Verdict::Accept, None);
        assert_eq!(c.outcome, GradingOutcome::AmbiguousOutput);
        assert_eq!(
            c.hint,
            "JFLAP reported both 'accept' and 'reject', output: true false; error: (none)"
        );

        let c = classify(&output("  \n", "boom\n", false), Verdict::Reject, None);
        assert_eq!(c.outcome, GradingOutcome::NoOutput);
        assert_eq!(
            c.hint,
            "JFLAP reported neither 'accept' nor 'reject', output: (none); error: boom"
        );
    }

    #[test]
    fn verdicts() {
        let c = classify(&output("true\n", "", false), Verdict::Accept, None);
        assert!(c.outcome.is_pass());
        assert!(c.hint.is_empty());

        let c = classify(&output("false\n", "", false), Verdict::Accept, None);
        assert_eq!(c.outcome, GradingOutcome::WrongAnswer);
        assert_eq!(c.hint, "This word should have been accepted, but it was rejected");
    }
}
