#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

/// The two kinds of quoted regions a test case may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
}

impl QuoteKind {
    /// Maps a quote character to its kind.
    fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            _ => None,
        }
    }

    /// The character that opens and closes this kind of region.
    pub fn delimiter(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }
}

impl Display for QuoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single-quoted"),
            Self::Double => write!(f, "double-quoted"),
        }
    }
}

/// Error raised while splitting a malformed line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// A backslash escape other than `\<quote>` or `\\` inside quotes.
    #[error(
        "invalid backslash escape {delimiter}\\{escape}{delimiter} in {quote} string literal in: \
         {line}"
    )]
    InvalidEscape {
        /// The character following the backslash.
        escape:    char,
        /// Kind of quoted region the escape appeared in.
        quote:     QuoteKind,
        /// Quote character used to wrap the escape in the message.
        delimiter: char,
        /// The full line being split.
        line:      String,
    },
}

/// Splits a line on whitespace, allowing single or double quotes to group
/// text into one token.
///
/// A quote always starts a token boundary, even in the middle of a word, and
/// `""` produces an empty token. Inside quotes the only valid escapes are the
/// quote itself and a backslash. An unterminated quote simply runs to the end
/// of the line.
pub fn split_with_quotes(line: &str) -> Result<Vec<String>, SplitError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut quote: Option<QuoteKind> = None;
    let mut backslash = false;

    for c in line.chars() {
        match quote {
            None => {
                let opening = QuoteKind::from_char(c);
                if opening.is_some() || c.is_whitespace() {
                    if !current.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    quote = opening;
                } else {
                    current.push(c);
                }
            }
            Some(kind) => {
                let delimiter = kind.delimiter();
                if c == delimiter && !backslash {
                    quote = None;
                    groups.push(std::mem::take(&mut current));
                } else if c == '\\' && !backslash {
                    backslash = true;
                } else if backslash && c != delimiter && c != '\\' {
                    return Err(SplitError::InvalidEscape {
                        escape: c,
                        quote: kind,
                        delimiter,
                        line: line.to_string(),
                    });
                } else {
                    current.push(c);
                    backslash = false;
                }
            }
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}
