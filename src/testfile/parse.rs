#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, path::Path};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::{
    Expectation, HookCollector, Hooks, KeywordMatch, LineClass, ParseError, ResultKeywords,
    Verdict, parsers::parser, sandbox::HookLimits, split::split_with_quotes,
};
use crate::constants::LEGACY_REJECT_SUFFIX;

/// A parsed test file whose hooks have not run yet.
///
/// Words keep the order in which they were first seen. Words without an
/// explicit result specifier are [`Expectation::Pending`].
#[derive(Debug, Clone, Default)]
pub struct Specification {
    /// word to expectation, in first-seen order
    entries:    IndexMap<String, Expectation>,
    /// line of the most recent explicit test case for each word
    defined_on: HashMap<String, usize>,
    /// hook definitions found in the file
    hooks:      Hooks,
    /// whether the file was read in the legacy format
    legacy:     bool,
}

impl Specification {
    /// Parses test file contents, without running hooks.
    ///
    /// Files where every line is a single word optionally followed by
    /// `reject` are read in the legacy format, where blank lines stand for
    /// the empty word.
    pub fn parse(contents: &str, keywords: &ResultKeywords) -> Result<Self, ParseError> {
        if contents.lines().all(|line| parser::legacy_line(line).is_ok()) {
            debug!("reading test file in legacy mode");
            return Ok(Self::parse_legacy(contents));
        }
        Self::parse_modern(contents, keywords)
    }

    /// Reads the legacy format. Cannot fail.
    fn parse_legacy(contents: &str) -> Self {
        let mut spec = Self {
            legacy: true,
            ..Self::default()
        };
        for line in contents.lines() {
            let line = line.trim();
            let (word, expectation) = match line.strip_suffix(LEGACY_REJECT_SUFFIX) {
                Some(rest) => (rest.trim_end(), Expectation::Reject),
                None => (line, Expectation::Accept),
            };
            spec.entries.insert(word.to_string(), expectation);
        }
        spec
    }

    /// Reads the modern format: quoted test cases plus optional hooks.
    fn parse_modern(contents: &str, keywords: &ResultKeywords) -> Result<Self, ParseError> {
        let mut spec = Self::default();
        let mut collector = HookCollector::new();

        for (index, raw) in contents.lines().enumerate() {
            let line_no = index + 1;
            if collector.feed(line_no, raw)? != LineClass::TestCase {
                continue;
            }

            let tokens = split_with_quotes(raw.trim_end()).map_err(|source| {
                ParseError::MalformedTestCase {
                    line: line_no,
                    source,
                }
            })?;
            let Some((word, rest)) = tokens.split_first() else {
                warn!("line {line_no} holds no test case, skipping it: {raw:?}");
                continue;
            };

            match rest.last() {
                None => {
                    spec.insert_pending(word);
                }
                Some(specifier) => {
                    let verdict = match keywords.classify(specifier) {
                        KeywordMatch::Verdict(verdict) => verdict,
                        KeywordMatch::Ambiguous { accept, reject } => {
                            return Err(ParseError::AmbiguousSpecifier {
                                specifier: specifier.to_lowercase(),
                                line: line_no,
                                accept,
                                reject,
                            });
                        }
                        KeywordMatch::Unrecognized => {
                            return Err(ParseError::UnrecognizedSpecifier {
                                specifier:  specifier.to_lowercase(),
                                line:       line_no,
                                candidates: keywords.describe(),
                            });
                        }
                    };
                    spec.define(word, verdict, line_no)?;
                }
            }
        }

        spec.hooks = collector.finish();
        Ok(spec)
    }

    /// Records an explicit verdict for `word` given on `line`.
    fn define(&mut self, word: &str, verdict: Verdict, line: usize) -> Result<(), ParseError> {
        if let Some(previous) = self.entries.get(word).and_then(|e| e.verdict())
            && previous != verdict
        {
            return Err(ParseError::ConflictingVerdicts {
                word: word.to_string(),
                first: self.defined_on.get(word).copied().unwrap_or(line),
                previous,
                second: line,
                current: verdict,
            });
        }
        self.entries.insert(word.to_string(), verdict.into());
        self.defined_on.insert(word.to_string(), line);
        Ok(())
    }

    /// Adds `word` as pending unless it is already present. Returns whether
    /// it was added.
    pub fn insert_pending(&mut self, word: &str) -> bool {
        if self.entries.contains_key(word) {
            return false;
        }
        self.entries.insert(word.to_string(), Expectation::Pending);
        true
    }

    /// Sets the expectation of a word that is already present.
    pub(crate) fn settle(&mut self, word: &str, verdict: Verdict) {
        if let Some(slot) = self.entries.get_mut(word) {
            *slot = verdict.into();
        }
    }

    /// Expectation for `word`, if it is part of the file.
    pub fn get(&self, word: &str) -> Option<Expectation> {
        self.entries.get(word).copied()
    }

    /// Words and expectations in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Expectation)> {
        self.entries.iter().map(|(w, e)| (w.as_str(), *e))
    }

    /// Words still waiting for a verdict, in order.
    pub fn pending_words(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| **e == Expectation::Pending)
            .map(|(w, _)| w.clone())
            .collect()
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the file defines no words.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The hooks defined by the file.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Whether the file was read in the legacy format.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// Runs the hooks and settles every pending word.
    pub fn resolve(self, limits: &HookLimits) -> Result<ResolvedSpecification, ParseError> {
        super::sandbox::resolve(self, limits)
    }

    /// Converts into the resolved form. Pending words become accepted.
    pub(crate) fn into_resolved(self) -> ResolvedSpecification {
        let verdicts = self
            .entries
            .into_iter()
            .map(|(word, e)| (word, e.verdict().unwrap_or(Verdict::Accept)))
            .collect();
        ResolvedSpecification { verdicts }
    }
}

/// A fully resolved test file: every word has a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSpecification {
    /// word to verdict, in file order
    verdicts: IndexMap<String, Verdict>,
}

impl ResolvedSpecification {
    /// Verdict for `word`, if it is tested.
    pub fn get(&self, word: &str) -> Option<Verdict> {
        self.verdicts.get(word).copied()
    }

    /// Words and verdicts in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Verdict)> {
        self.verdicts.iter().map(|(w, v)| (w.as_str(), *v))
    }

    /// Tested words in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.verdicts.keys().map(String::as_str)
    }

    /// Number of tested words.
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    /// Whether nothing is tested.
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

impl FromIterator<(String, Verdict)> for ResolvedSpecification {
    fn from_iter<T: IntoIterator<Item = (String, Verdict)>>(iter: T) -> Self {
        Self {
            verdicts: iter.into_iter().collect(),
        }
    }
}

/// Parses a test file and runs its hooks with the default keyword table and
/// limits.
pub fn parse_test_file(contents: &str) -> Result<ResolvedSpecification, ParseError> {
    parse_test_file_with(contents, &ResultKeywords::default(), &HookLimits::default())
}

/// Parses a test file and runs its hooks.
pub fn parse_test_file_with(
    contents: &str,
    keywords: &ResultKeywords,
    limits: &HookLimits,
) -> Result<ResolvedSpecification, ParseError> {
    Specification::parse(contents, keywords)?.resolve(limits)
}

/// Returns the words tested by the file at `path`, or nothing if it cannot be
/// read or parsed (the reason is logged).
pub fn test_names(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            error!("could not read test file {}: {e}", path.display());
            return Vec::new();
        }
    };
    match parse_test_file(&contents) {
        Ok(spec) => spec.words().map(str::to_string).collect(),
        Err(e) => {
            error!("could not parse test file {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Specification {
        Specification::parse(text, &ResultKeywords::default()).expect("should parse")
    }

    fn parse_err(text: &str) -> ParseError {
        Specification::parse(text, &ResultKeywords::default()).expect_err("should fail")
    }

    #[test]
    fn legacy_format() {
        let spec = parse("\n0\n1\n00\n01 reject\n10 reject\n11");
        assert!(spec.is_legacy());
        let expected = [
            ("", Expectation::Accept),
            ("0", Expectation::Accept),
            ("1", Expectation::Accept),
            ("00", Expectation::Accept),
            ("01", Expectation::Reject),
            ("10", Expectation::Reject),
            ("11", Expectation::Accept),
        ];
        assert_eq!(spec.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn legacy_without_blank_lines_has_no_empty_word() {
        let spec = parse("0\n1\n00\n01 reject\n10 reject\n11");
        assert_eq!(spec.get(""), None);
        assert_eq!(spec.len(), 6);
        assert!(parse("").is_empty());
    }

    #[test]
    fn line_without_tokens_is_skipped() {
        let spec = parse("'\n0 yes\n");
        assert!(!spec.is_legacy());
        assert_eq!(spec.iter().collect::<Vec<_>>(), [("0", Expectation::Accept)]);
    }

    #[test]
    fn modern_test_cases() {
        let spec = parse(concat!(
            "foo should be accepted\n",
            "\"\" (the empty string) should be rejected\n",
            "# this is a comment\n",
            "'string with spaces' -> ok\n",
            "lonely\n",
            "lonely\n",
        ));
        assert!(!spec.is_legacy());
        assert_eq!(spec.iter().collect::<Vec<_>>(), [
            ("foo", Expectation::Accept),
            ("", Expectation::Reject),
            ("string with spaces", Expectation::Accept),
            ("lonely", Expectation::Pending),
        ]);
        assert_eq!(spec.pending_words(), ["lonely"]);
    }

    #[test]
    fn bare_word_keeps_explicit_verdict() {
        let spec = parse("01 no\n01\n");
        assert_eq!(spec.get("01"), Some(Expectation::Reject));
    }

    #[test]
    fn conflicting_verdicts() {
        let err = parse_err("\n10 reject\n11 reject\n11\n10 accept");
        assert_eq!(
            err.to_string(),
            "test case on line 2 specifies that input string '10' should be rejected, but test \
             case on line 5 specifies that it should be accepted"
        );
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn repeated_identical_verdicts_are_fine() {
        let spec = parse("10 x reject\n10 -> no");
        assert_eq!(spec.get("10"), Some(Expectation::Reject));
    }

    #[test]
    fn unrecognized_specifier() {
        let err = parse_err("a maybe\n01 no");
        assert_eq!(
            err.to_string(),
            "result specifier 'maybe' on line 1 does not match any of the valid result specifiers, \
             which are: 'accepted', 'accepts', 'yes', 'good', 'ok', 'rejected', 'rejects', 'no', \
             'bad'"
        );
    }

    #[test]
    fn ambiguous_specifier_with_custom_table() {
        let keywords = ResultKeywords::new(["accepted", "sounds good"], ["rejected", "sorry"]);
        let err = Specification::parse("word -> so", &keywords).unwrap_err();
        assert_eq!(err, ParseError::AmbiguousSpecifier {
            specifier: "so".into(),
            line:      1,
            accept:    "sounds good".into(),
            reject:    "sorry".into(),
        });
        assert!(err.to_string().contains("is ambiguous"));
    }

    #[test]
    fn malformed_quotes_report_line() {
        let err = parse_err("\n\"ok test case\" -> accept\n\"malforme\\d test case\" -> reject");
        assert_eq!(
            err.to_string(),
            "malformed test case on line 3: invalid backslash escape \"\\d\" in double-quoted \
             string literal in: \"malforme\\d test case\" -> reject"
        );
    }

    #[test]
    fn resolve_without_hooks_accepts_pending() {
        let resolved = parse("a yes\nc\nd no").resolve(&HookLimits::default()).unwrap();
        assert_eq!(resolved.iter().collect::<Vec<_>>(), [
            ("a", Verdict::Accept),
            ("c", Verdict::Accept),
            ("d", Verdict::Reject),
        ]);
    }
}
