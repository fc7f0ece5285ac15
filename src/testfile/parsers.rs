#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

peg::parser! {
    /// line-level grammars for test files: the legacy line shape and hook
    /// headers.
    pub grammar parser() for str {
        /// matches one whitespace character
        rule ws() = quiet!{[c if c.is_whitespace()]}

        /// matches one non-whitespace character
        rule non_ws() = [c if !c.is_whitespace()]

        /// matches an identifier
        rule ident() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)

        /// matches the keyword introducing a hook header
        rule def_keyword() = "def" / "fn"

        /// matches the name of one of the two recognised hooks
        rule hook_name() -> &'input str
            = $("words") / $("check")

        /// matches a line in the legacy format: a single word, optionally
        /// followed by the literal `reject`
        pub rule legacy_line()
            = ws()* non_ws()* ws()* ("reject" ws()*)?

        /// matches the start of a hook header (`def words(` or
        /// `fn check(`), returning the hook name; anything may follow
        pub rule hook_start() -> &'input str
            = ws()* def_keyword() ws()+ name:hook_name() ws()* "(" [_]* { name }

        /// parses a complete hook header and returns its name and parameter
        /// names, eg. `def check(word):`
        pub rule hook_signature() -> (&'input str, Vec<&'input str>)
            = ws()* def_keyword() ws()+ name:hook_name() ws()*
              "(" ws()* params:(ident() ** (ws()* "," ws()*)) ws()* ")"
              ws()* ":"? ws()*
            { (name, params) }
    }
}

#[cfg(test)]
mod tests {
    use super::parser;

    #[test]
    fn legacy_lines() {
        for line in ["0", "01 reject", "  10   reject  ", "", "   ", "xreject", "reject"] {
            assert!(parser::legacy_line(line).is_ok(), "{line:?} should be legacy");
        }
        for line in ["foo bar", "01 reject x", "foo should be accepted", "'a b'"] {
            assert!(parser::legacy_line(line).is_err(), "{line:?} should not be legacy");
        }
    }

    #[test]
    fn hook_headers() {
        assert_eq!(parser::hook_start("def words():").ok(), Some("words"));
        assert_eq!(parser::hook_start("  fn check(word)").ok(), Some("check"));
        assert!(parser::hook_start("def wordsmith():").is_err());
        assert!(parser::hook_start("words ok").is_err());

        assert_eq!(parser::hook_signature("def words():").ok(), Some(("words", vec![])));
        assert_eq!(parser::hook_signature("fn check( word ) :").ok(), Some(("check", vec!["word"])));
        assert_eq!(parser::hook_signature("def check(a, b):").ok(), Some(("check", vec!["a", "b"])));
        assert!(parser::hook_signature("def check(word").is_err());
    }
}
