#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{HookName, ParseError, parsers::parser};

/// A hook as written in a test file: its header line and indented body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDefinition {
    /// which hook this is
    name:   HookName,
    /// 1-based line of the header
    line:   usize,
    /// header text, eg. `def check(word):`
    header: String,
    /// body lines, verbatim (blank lines included)
    body:   Vec<String>,
}

impl HookDefinition {
    /// Starts a definition from its header line.
    fn new(name: HookName, line: usize, header: &str) -> Self {
        Self {
            name,
            line,
            header: header.to_string(),
            body: Vec::new(),
        }
    }

    /// Which hook this is.
    pub fn name(&self) -> HookName {
        self.name
    }

    /// 1-based line of the header.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Header text.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Body lines in file order.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Minimum indentation a line needs to belong to the body: that of the
    /// first body line, or one more than the header's. A blank first body
    /// line has width 0, so every following line joins the body.
    fn body_indent(&self) -> usize {
        self.body
            .first()
            .map(|line| indent_width(line))
            .unwrap_or_else(|| indent_width(&self.header) + 1)
    }
}

/// Number of leading whitespace characters.
fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// The hooks found in one test file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    /// the `words` hook, if defined
    pub words: Option<HookDefinition>,
    /// the `check` hook, if defined
    pub check: Option<HookDefinition>,
}

impl Hooks {
    /// The definition slot for `name`.
    fn slot_mut(&mut self, name: HookName) -> &mut Option<HookDefinition> {
        match name {
            HookName::Words => &mut self.words,
            HookName::Check => &mut self.check,
        }
    }
}

/// How the collector classified a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// blank line or comment outside a hook
    Skip,
    /// hook header or body line
    Hook,
    /// anything else: a test case for the caller to tokenize
    TestCase,
}

/// Where the collector is in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CollectorState {
    /// reading test cases
    #[default]
    Standard,
    /// reading the body of `words`
    InWordsBody,
    /// reading the body of `check`
    InCheckBody,
}

impl CollectorState {
    /// The body state entered after a header for `name`.
    fn body_of(name: HookName) -> Self {
        match name {
            HookName::Words => Self::InWordsBody,
            HookName::Check => Self::InCheckBody,
        }
    }
}

/// Line-by-line state machine that pulls hook definitions out of a test
/// file, leaving test cases to the caller.
#[derive(Debug, Default)]
pub struct HookCollector {
    /// current state
    state: CollectorState,
    /// hooks collected so far
    hooks: Hooks,
}

impl HookCollector {
    /// Creates a collector in the standard state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next line (numbered from 1) and classifies it.
    ///
    /// A line that ends a hook body is classified as if the body had already
    /// been closed, so no line is lost.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Result<LineClass, ParseError> {
        let line = line.trim_end();

        let open = match self.state {
            CollectorState::InWordsBody => self.hooks.words.as_mut(),
            CollectorState::InCheckBody => self.hooks.check.as_mut(),
            CollectorState::Standard => None,
        };
        if let Some(definition) = open {
            if line.is_empty() || indent_width(line) >= definition.body_indent() {
                definition.body.push(line.to_string());
                return Ok(LineClass::Hook);
            }
            self.state = CollectorState::Standard;
        }

        // standard state
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') {
            return Ok(LineClass::Skip);
        }

        let Some(name) = parser::hook_start(line)
            .ok()
            .and_then(HookName::from_name)
        else {
            return Ok(LineClass::TestCase);
        };

        let slot = self.hooks.slot_mut(name);
        if let Some(existing) = slot {
            return Err(ParseError::DuplicateHook {
                hook:   name,
                first:  existing.line,
                second: line_no,
            });
        }
        *slot = Some(HookDefinition::new(name, line_no, line));
        self.state = CollectorState::body_of(name);
        Ok(LineClass::Hook)
    }

    /// Ends collection and returns the hooks found.
    pub fn finish(self) -> Hooks {
        self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Result<(Vec<LineClass>, Hooks), ParseError> {
        let mut collector = HookCollector::new();
        let classes = text
            .lines()
            .enumerate()
            .map(|(i, line)| collector.feed(i + 1, line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((classes, collector.finish()))
    }

    #[test]
    fn body_ends_at_dedent_and_line_is_reprocessed() {
        let (classes, hooks) = collect("a\ndef words():\n    [\"x\"]\n\nb yes\n# c").unwrap();
        use LineClass::*;
        assert_eq!(classes, vec![TestCase, Hook, Hook, Hook, TestCase, Skip]);

        let words = hooks.words.unwrap();
        assert_eq!(words.line(), 2);
        assert_eq!(words.body(), ["    [\"x\"]", ""]);
        assert!(hooks.check.is_none());
    }

    #[test]
    fn empty_body_uses_header_indent() {
        let (classes, hooks) = collect("  fn check(w)\n   w == \"\"\n  x").unwrap();
        assert_eq!(classes, vec![LineClass::Hook, LineClass::Hook, LineClass::TestCase]);
        assert_eq!(hooks.check.unwrap().body(), ["   w == \"\""]);
    }

    #[test]
    fn comments_inside_bodies_are_kept() {
        let (_, hooks) = collect("def check(word):\n    # note\n    true").unwrap();
        assert_eq!(hooks.check.unwrap().body(), ["    # note", "    true"]);
    }

    #[test]
    fn one_header_per_hook() {
        let err = collect("def check(w):\n    true\nx\ndef check(w):\n    false").unwrap_err();
        assert_eq!(err, ParseError::DuplicateHook {
            hook:   HookName::Check,
            first:  1,
            second: 4,
        });
        assert_eq!(err.to_string(), "duplicate definitions of 'check' on lines 1 and 4");
    }

    #[test]
    fn duplicate_words_headers() {
        let err = collect("def words():\n    [\"a\"]\n0 yes\n\ndef words():\n    []").unwrap_err();
        assert_eq!(err, ParseError::DuplicateHook {
            hook:   HookName::Words,
            first:  1,
            second: 5,
        });
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn blank_first_body_line_keeps_the_rest_in_the_body() {
        let (classes, hooks) = collect("def check(word):\n\n    word.len() == 0\nfoo\n").unwrap();
        assert_eq!(classes, vec![LineClass::Hook; 4]);
        assert_eq!(hooks.check.unwrap().body(), ["", "    word.len() == 0", "foo"]);
    }

    #[test]
    fn header_inside_a_body_is_body_text() {
        let (_, hooks) = collect("def words():\n    def check(w):\n").unwrap();
        assert!(hooks.check.is_none());
        assert_eq!(hooks.words.unwrap().body(), ["    def check(w):"]);
    }
}
