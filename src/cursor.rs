//! The scanning cursor.
//!
//! A [`Cursor`] owns a position into the source text and nothing else: it
//! knows how to test the input at that position against characters, literals,
//! sets and regular expressions, and how to checkpoint and rewind. It has no
//! notion of tokens or trees.
//!
//! Every `scan_*` method either consumes the matched input and returns `Ok`,
//! or leaves the position untouched and returns a
//! [`ParseError::Scanning`] describing what was expected and what was found.
//!
//! ```text
//! source:   "let x"
//!            ^ position 0
//! scan_literal("let")  -> Ok, position 3
//! scan_char('=')       -> Err("expected '=' but found \" \""), position 3
//! ```

use crate::{CharacterSet, ParseError, Range};
use regex::Regex;

/// A saved cursor position. Restoring is O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(usize);

impl Mark {
    pub fn position(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Cursor<'s> {
    source: &'s str,
    position: usize,
}

impl<'s> Cursor<'s> {
    pub fn new(source: &'s str) -> Self {
        Cursor { source, position: 0 }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> &'s str {
        &self.source[self.position..]
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// The character at the position, or `None` at end of input.
    pub fn current(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.position)
    }

    pub fn restore(&mut self, mark: Mark) {
        self.position = mark.0;
    }

    /// Consume any one character.
    pub fn scan_next(&mut self) -> Result<char, ParseError> {
        match self.current() {
            Some(c) => {
                self.position += c.len_utf8();
                Ok(c)
            }
            None => Err(self.mismatch("any character", 1)),
        }
    }

    pub fn scan_char(&mut self, expected: char) -> Result<(), ParseError> {
        match self.current() {
            Some(c) if c == expected => {
                self.position += c.len_utf8();
                Ok(())
            }
            _ => Err(self.mismatch(&format!("{expected:?}"), 1)),
        }
    }

    pub fn scan_literal(&mut self, literal: &str) -> Result<(), ParseError> {
        if self.remaining().starts_with(literal) {
            self.position += literal.len();
            Ok(())
        } else {
            Err(self.mismatch(&format!("{literal:?}"), literal.chars().count().max(1)))
        }
    }

    pub fn scan_set(&mut self, set: &CharacterSet) -> Result<char, ParseError> {
        match self.current() {
            Some(c) if set.contains(c) => {
                self.position += c.len_utf8();
                Ok(c)
            }
            _ => Err(self.mismatch(&set.to_string(), 1)),
        }
    }

    /// Match `regex` anchored at the position.
    ///
    /// The regex only sees the remaining input, so assertions such as `\b` or
    /// `^` are evaluated relative to the position, not to the whole source.
    pub fn scan_regex(&mut self, regex: &Regex) -> Result<Range, ParseError> {
        let start = self.position;
        match regex.find(self.remaining()) {
            Some(m) if m.start() == 0 => {
                self.position += m.end();
                Ok(Range::new(start, self.position))
            }
            _ => Err(self.mismatch(&format!("/{}/", display_pattern(regex)), 1)),
        }
    }

    /// Move straight to `position` (used when replaying cached matches).
    pub(crate) fn jump(&mut self, position: usize) {
        self.position = position.min(self.source.len());
    }

    /// Scanning error at the position; `width` is how many characters of the
    /// actual input to quote.
    fn mismatch(&self, expected: &str, width: usize) -> ParseError {
        let found: String = self.remaining().chars().take(width).collect();
        let end = self.position + found.len();
        let found = if found.is_empty() { "EOF".to_string() } else { format!("{found:?}") };
        ParseError::scanning(format!("expected {expected} but found {found}"), Range::new(self.position, end))
    }
}

/// Pattern without the `\A(?:...)` anchor added by the grammar builder.
fn display_pattern(regex: &Regex) -> &str {
    let pattern = regex.as_str();
    pattern.strip_prefix(r"\A(?:").and_then(|p| p.strip_suffix(')')).unwrap_or(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_restore() {
        let mut cursor = Cursor::new("hello");
        let mark = cursor.mark();
        cursor.scan_literal("hel").unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.current(), Some('l'));
        cursor.restore(mark);
        assert_eq!(cursor.position(), 0);
        assert_eq!(mark.position(), 0);
    }

    #[test]
    fn failed_scans_do_not_move() {
        let mut cursor = Cursor::new("dog");
        let err = cursor.scan_literal("cat").unwrap_err();
        assert_eq!(err.to_string(), "expected \"cat\" but found \"dog\"");
        assert_eq!(err.range(), Range::new(0, 3));
        assert_eq!(cursor.position(), 0);

        let err = cursor.scan_set(&CharacterSet::decimal_digits()).unwrap_err();
        assert_eq!(err.to_string(), "expected .decimalDigit but found \"d\"");
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn end_of_input_is_reported_as_eof() {
        let mut cursor = Cursor::new("a");
        cursor.scan_char('a').unwrap();
        assert!(cursor.at_end());
        assert_eq!(cursor.current(), None);
        let err = cursor.scan_char('b').unwrap_err();
        assert_eq!(err.to_string(), "expected 'b' but found EOF");
        assert_eq!(err.range(), Range::empty(1));
        assert!(cursor.scan_next().is_err());
    }

    #[test]
    fn multibyte_characters_advance_by_their_width() {
        let mut cursor = Cursor::new("été!");
        assert_eq!(cursor.scan_set(&CharacterSet::letters()).unwrap(), 'é');
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.scan_next().unwrap(), 't');
        cursor.scan_char('é').unwrap();
        assert_eq!(cursor.remaining(), "!");
    }

    #[test]
    fn regex_is_anchored_at_position() {
        let re = Regex::new(r"\A(?:[0-9]+)").unwrap();
        let mut cursor = Cursor::new("ab12");
        let err = cursor.scan_regex(&re).unwrap_err();
        assert_eq!(err.to_string(), "expected /[0-9]+/ but found \"a\"");
        cursor.scan_literal("ab").unwrap();
        assert_eq!(cursor.scan_regex(&re).unwrap(), Range::new(2, 4));
        assert!(cursor.at_end());
    }
}
