#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Iterator over every bit-string of at most a given length, ordered first by
/// length and then lexicographically. Created by [`all_bitstrings`].
#[derive(Debug, Clone)]
pub struct Bitstrings {
    /// Longest bit-string to yield.
    max_len: usize,
    /// The next bit-string to hand out, if any remain.
    next:    Option<String>,
}

/// Returns all bit-strings of length `<= length`, including the empty one.
///
/// A negative `length` yields nothing, so `all_bitstrings(-1)` is empty and
/// `all_bitstrings(2)` yields `"", "0", "1", "00", "01", "10", "11"`.
pub fn all_bitstrings(length: i64) -> Bitstrings {
    match usize::try_from(length) {
        Ok(max_len) => Bitstrings {
            max_len,
            next: Some(String::new()),
        },
        Err(_) => Bitstrings {
            max_len: 0,
            next:    None,
        },
    }
}

/// Successor of `current` in (length, lexicographic) order.
fn successor(current: &str) -> String {
    match current.rfind('0') {
        Some(i) => {
            let mut next = String::with_capacity(current.len());
            next.push_str(&current[..i]);
            next.push('1');
            next.extend(std::iter::repeat_n('0', current.len() - i - 1));
            next
        }
        None => "0".repeat(current.len() + 1),
    }
}

impl Iterator for Bitstrings {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let following = successor(&current);
        if following.len() <= self.max_len {
            self.next = Some(following);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.next {
            None => (0, Some(0)),
            Some(_) => (1, None),
        }
    }
}

/// Sort key ordering strings by length first and then lexicographically.
pub fn len_lex(word: &str) -> (usize, &str) {
    (word.chars().count(), word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_lengths() {
        assert!(all_bitstrings(-1).next().is_none());
        assert_eq!(all_bitstrings(0).collect::<Vec<_>>(), vec![""]);
        assert_eq!(all_bitstrings(1).collect::<Vec<_>>(), vec!["", "0", "1"]);
        assert_eq!(
            all_bitstrings(2).collect::<Vec<_>>(),
            vec!["", "0", "1", "00", "01", "10", "11"]
        );
    }

    #[test]
    fn count_and_order() {
        let words: Vec<String> = all_bitstrings(6).collect();
        assert_eq!(words.len(), (1 << 7) - 1);

        let mut sorted = words.clone();
        sorted.sort_by(|a, b| len_lex(a).cmp(&len_lex(b)));
        assert_eq!(sorted, words);
    }

    #[test]
    fn len_lex_orders_by_length_first() {
        let mut words = vec!["b", "abc", "ca", "ac", "bb", "aaaa", ""];
        words.sort_by_key(|w| len_lex(w));
        assert_eq!(words, vec!["", "b", "ac", "bb", "ca", "abc", "aaaa"]);
    }
}
