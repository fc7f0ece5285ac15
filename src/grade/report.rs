#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use indexmap::IndexMap;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Modify, Style, Width, object::Columns},
};

use super::outcome::GradingOutcome;

/// Aggregate numbers for one grading run, serialized with the field names
/// the result formatters expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradingSummary {
    /// whether grading could not run at all
    #[serde(rename = "died")]
    pub crashed:      bool,
    /// always `false`; timeouts are only reported per word
    pub timeout:      bool,
    /// number of words tested
    #[serde(rename = "totalTests")]
    pub total_tests:  usize,
    /// number of words that did not pass
    #[serde(rename = "failedTests")]
    pub failed_tests: usize,
    /// checker stdout, concatenated over all runs
    #[serde(rename = "rawOut")]
    pub raw_stdout:   String,
    /// checker stderr, concatenated over all runs; the diagnostic when
    /// `crashed`
    #[serde(rename = "rawErr")]
    pub raw_stderr:   String,
}

/// Why a word failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTest {
    /// the failure kind
    #[serde(skip)]
    pub outcome: GradingOutcome,
    /// explanation shown to students
    pub hint:    String,
}

/// Everything a grading run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradingReport {
    /// aggregate numbers and raw output
    pub summary:  GradingSummary,
    /// failed words, in test order
    pub failures: IndexMap<String, FailedTest>,
}

/// One row of the failure table.
#[derive(Tabled)]
struct FailureRow {
    /// the word, quoted
    #[tabled(rename = "Word")]
    word:    String,
    /// the failure kind
    #[tabled(rename = "Outcome")]
    outcome: String,
    /// the hint
    #[tabled(rename = "Hint")]
    hint:    String,
}

impl GradingReport {
    /// Report for a run that could not grade anything.
    pub fn crashed(diagnostic: impl Into<String>) -> Self {
        Self {
            summary:  GradingSummary {
                crashed: true,
                raw_stderr: diagnostic.into(),
                ..GradingSummary::default()
            },
            failures: IndexMap::new(),
        }
    }

    /// Number of words that passed.
    pub fn passed(&self) -> usize {
        self.summary.total_tests - self.summary.failed_tests
    }

    /// Renders the failures as a table.
    pub fn failure_table(&self) -> String {
        let rows = self.failures.iter().map(|(word, failure)| FailureRow {
            word:    snailquote::escape(word).into_owned(),
            outcome: failure.outcome.to_string(),
            hint:    failure.hint.clone(),
        });

        Table::new(rows)
            .with(Style::modern())
            .with(Modify::new(Columns::last()).with(Width::wrap(60).keep_words(true)))
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_report_field_names() {
        let report = GradingReport {
            summary:  GradingSummary {
                total_tests: 2,
                failed_tests: 1,
                raw_stdout: "true\nfalse\n".into(),
                ..GradingSummary::default()
            },
            failures: IndexMap::from([("01".to_string(), FailedTest {
                outcome: GradingOutcome::WrongAnswer,
                hint:    "nope".into(),
            })]),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "summary": {
                    "died": false,
                    "timeout": false,
                    "totalTests": 2,
                    "failedTests": 1,
                    "rawOut": "true\nfalse\n",
                    "rawErr": "",
                },
                "failures": { "01": { "hint": "nope" } },
            })
        );
        assert_eq!(report.passed(), 1);
        assert!(report.failure_table().contains("wrong answer"));
    }

    #[test]
    fn crashed_report_has_zero_counts() {
        let report = GradingReport::crashed("no such file");
        assert!(report.summary.crashed);
        assert!(!report.summary.timeout);
        assert_eq!(report.summary.total_tests, 0);
        assert_eq!(report.summary.failed_tests, 0);
        assert_eq!(report.summary.raw_stderr, "no such file");
        assert!(report.failures.is_empty());
    }
}
