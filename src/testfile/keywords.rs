#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::Verdict;
use crate::constants::{ACCEPT_KEYWORDS, REJECT_KEYWORDS};

/// Outcome of matching a result specifier against a [`ResultKeywords`]
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordMatch {
    /// The specifier only matched keywords with this verdict.
    Verdict(Verdict),
    /// The specifier matched keywords with both verdicts.
    Ambiguous {
        /// an accept keyword the specifier is a prefix of
        accept: String,
        /// a reject keyword the specifier is a prefix of
        reject: String,
    },
    /// The specifier matched nothing.
    Unrecognized,
}

/// Table of words that may end a test case to mark it accepted or rejected.
/// A result specifier may be any case-insensitive prefix of a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultKeywords {
    /// keywords meaning the word should be accepted
    accept: Vec<String>,
    /// keywords meaning the word should be rejected
    reject: Vec<String>,
}

impl Default for ResultKeywords {
    fn default() -> Self {
        Self::new(ACCEPT_KEYWORDS.iter().copied(), REJECT_KEYWORDS.iter().copied())
    }
}

impl ResultKeywords {
    /// Creates a keyword table. Keywords are stored lower-cased.
    pub fn new<A, R>(accept: A, reject: R) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Self {
            accept: accept.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
            reject: reject.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Matches `specifier` against the table.
    ///
    /// When several keywords of one group match, the last one listed is
    /// reported.
    pub fn classify(&self, specifier: &str) -> KeywordMatch {
        let prefix = specifier.to_lowercase();
        let accept = self.accept.iter().rfind(|k| k.starts_with(&prefix));
        let reject = self.reject.iter().rfind(|k| k.starts_with(&prefix));

        match (accept, reject) {
            (Some(accept), Some(reject)) => KeywordMatch::Ambiguous {
                accept: accept.clone(),
                reject: reject.clone(),
            },
            (Some(_), None) => KeywordMatch::Verdict(Verdict::Accept),
            (None, Some(_)) => KeywordMatch::Verdict(Verdict::Reject),
            (None, None) => KeywordMatch::Unrecognized,
        }
    }

    /// Comma separated, quoted listing of every keyword, for diagnostics.
    pub fn describe(&self) -> String {
        self.accept
            .iter()
            .chain(self.reject.iter())
            .map(|k| format!("'{k}'"))
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_prefixes() {
        let keywords = ResultKeywords::default();
        assert_eq!(keywords.classify("y"), KeywordMatch::Verdict(Verdict::Accept));
        assert_eq!(keywords.classify("ACCEPT"), KeywordMatch::Verdict(Verdict::Accept));
        assert_eq!(keywords.classify("Reject"), KeywordMatch::Verdict(Verdict::Reject));
        assert_eq!(keywords.classify("n"), KeywordMatch::Verdict(Verdict::Reject));
        assert_eq!(keywords.classify("maybe"), KeywordMatch::Unrecognized);
    }

    #[test]
    fn overlapping_table_is_ambiguous() {
        let keywords = ResultKeywords::new(["okay"], ["oops"]);
        assert_eq!(keywords.classify("o"), KeywordMatch::Ambiguous {
            accept: "okay".into(),
            reject: "oops".into(),
        });
        assert_eq!(keywords.classify("ok"), KeywordMatch::Verdict(Verdict::Accept));
        assert_eq!(keywords.describe(), "'okay', 'oops'");
    }
}
