//! Character sets for set terminals.
//!
//! A [`CharacterSet`] is either one of the predefined classes (combined as
//! [`CharClass`] bit flags, the way STLR writes `.letter` or `.decimalDigit`),
//! an explicit list of characters, an inclusive range, a union of sets or the
//! inversion of a set.
//!
//! ```text
//! .letter | "_"          -> Union([Class(LETTER), Chars(['_'])])
//! "0"..."9"              -> Range('0', '9')
//! !.newline              -> Not(Class(NEWLINE))
//! ```
//!
//! Classes follow the Unicode predicates from `char` where they exist;
//! punctuation and symbols are limited to the ASCII repertoire.

use std::fmt;

bitflags::bitflags! {
    /// Predefined character classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharClass: u16 {
        const LETTER        = 1 << 0;
        const UPPERCASE     = 1 << 1;
        const LOWERCASE     = 1 << 2;
        const DECIMAL_DIGIT = 1 << 3;
        const ALPHANUMERIC  = 1 << 4;
        const WHITESPACE    = 1 << 5;
        const NEWLINE       = 1 << 6;
        const PUNCTUATION   = 1 << 7;
        const SYMBOL        = 1 << 8;
    }
}

const ASCII_SYMBOLS: &str = "$+<=>^`|~";

impl CharClass {
    /// True when `c` belongs to any of the classes in `self`.
    pub fn matches(self, c: char) -> bool {
        (self.contains(CharClass::LETTER) && c.is_alphabetic())
            || (self.contains(CharClass::UPPERCASE) && c.is_uppercase())
            || (self.contains(CharClass::LOWERCASE) && c.is_lowercase())
            || (self.contains(CharClass::DECIMAL_DIGIT) && c.is_ascii_digit())
            || (self.contains(CharClass::ALPHANUMERIC) && c.is_alphanumeric())
            || (self.contains(CharClass::WHITESPACE) && c.is_whitespace() && !is_newline(c))
            || (self.contains(CharClass::NEWLINE) && is_newline(c))
            || (self.contains(CharClass::PUNCTUATION) && c.is_ascii_punctuation() && !ASCII_SYMBOLS.contains(c))
            || (self.contains(CharClass::SYMBOL) && ASCII_SYMBOLS.contains(c))
    }

    fn stlr_name(name: &str) -> &'static str {
        match name {
            "LETTER" => ".letter",
            "UPPERCASE" => ".uppercaseLetter",
            "LOWERCASE" => ".lowercaseLetter",
            "DECIMAL_DIGIT" => ".decimalDigit",
            "ALPHANUMERIC" => ".alphanumeric",
            "WHITESPACE" => ".whitespace",
            "NEWLINE" => ".newline",
            "PUNCTUATION" => ".punctuation",
            "SYMBOL" => ".symbol",
            _ => ".unknown",
        }
    }
}

fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterSet {
    Class(CharClass),
    /// Explicit list of characters, in any order; [`CharacterSet::of`] sorts
    /// and de-duplicates it.
    Chars(Vec<char>),
    /// Inclusive range.
    Range(char, char),
    Union(Vec<CharacterSet>),
    Not(Box<CharacterSet>),
}

impl CharacterSet {
    pub fn letters() -> Self {
        CharacterSet::Class(CharClass::LETTER)
    }

    pub fn uppercase_letters() -> Self {
        CharacterSet::Class(CharClass::UPPERCASE)
    }

    pub fn lowercase_letters() -> Self {
        CharacterSet::Class(CharClass::LOWERCASE)
    }

    pub fn decimal_digits() -> Self {
        CharacterSet::Class(CharClass::DECIMAL_DIGIT)
    }

    pub fn alphanumerics() -> Self {
        CharacterSet::Class(CharClass::ALPHANUMERIC)
    }

    pub fn whitespaces() -> Self {
        CharacterSet::Class(CharClass::WHITESPACE)
    }

    pub fn newlines() -> Self {
        CharacterSet::Class(CharClass::NEWLINE)
    }

    pub fn whitespaces_and_newlines() -> Self {
        CharacterSet::Class(CharClass::WHITESPACE | CharClass::NEWLINE)
    }

    pub fn punctuation() -> Self {
        CharacterSet::Class(CharClass::PUNCTUATION)
    }

    pub fn symbols() -> Self {
        CharacterSet::Class(CharClass::SYMBOL)
    }

    /// Set of the characters in `chars`.
    pub fn of(chars: &str) -> Self {
        let mut list: Vec<char> = chars.chars().collect();
        list.sort_unstable();
        list.dedup();
        CharacterSet::Chars(list)
    }

    /// Inclusive range; bounds are swapped when given in reverse.
    pub fn range(lo: char, hi: char) -> Self {
        if lo <= hi { CharacterSet::Range(lo, hi) } else { CharacterSet::Range(hi, lo) }
    }

    pub fn union(self, other: CharacterSet) -> Self {
        match (self, other) {
            (CharacterSet::Class(a), CharacterSet::Class(b)) => CharacterSet::Class(a | b),
            (CharacterSet::Union(mut a), CharacterSet::Union(b)) => {
                a.extend(b);
                CharacterSet::Union(a)
            }
            (CharacterSet::Union(mut a), b) => {
                a.push(b);
                CharacterSet::Union(a)
            }
            (a, b) => CharacterSet::Union(vec![a, b]),
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            CharacterSet::Not(inner) => *inner,
            other => CharacterSet::Not(Box::new(other)),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        match self {
            CharacterSet::Class(class) => class.matches(c),
            CharacterSet::Chars(chars) => chars.contains(&c),
            CharacterSet::Range(lo, hi) => (*lo..=*hi).contains(&c),
            CharacterSet::Union(sets) => sets.iter().any(|set| set.contains(c)),
            CharacterSet::Not(inner) => !inner.contains(c),
        }
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterSet::Class(class) => {
                let names: Vec<&str> = class.iter_names().map(|(name, _)| CharClass::stlr_name(name)).collect();
                f.write_str(&names.join(" | "))
            }
            CharacterSet::Chars(chars) => {
                let text: String = chars.iter().collect();
                write!(f, "{text:?}")
            }
            CharacterSet::Range(lo, hi) => write!(f, "{lo:?}...{hi:?}"),
            CharacterSet::Union(sets) => {
                for (idx, set) in sets.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{set}")?;
                }
                Ok(())
            }
            CharacterSet::Not(inner) => write!(f, "!({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_classes() {
        let cases: Vec<(CharacterSet, &str, &str)> = vec![
            (CharacterSet::letters(), "aZé", "1 _"),
            (CharacterSet::decimal_digits(), "0459", "a٣"),
            (CharacterSet::whitespaces(), " \t", "\nx"),
            (CharacterSet::newlines(), "\n\r\u{2028}", " \t"),
            (CharacterSet::whitespaces_and_newlines(), " \n\t", "x"),
            (CharacterSet::alphanumerics(), "a1Z", "-"),
            (CharacterSet::punctuation(), "!,.(_", "+$a"),
            (CharacterSet::symbols(), "+$<|", ".,a"),
            (CharacterSet::uppercase_letters(), "AZ", "a1"),
            (CharacterSet::lowercase_letters(), "az", "A1"),
        ];
        for (set, inside, outside) in cases {
            for c in inside.chars() {
                assert!(set.contains(c), "{set} should contain {c:?}");
            }
            for c in outside.chars() {
                assert!(!set.contains(c), "{set} should not contain {c:?}");
            }
        }
    }

    #[test]
    fn composite_sets() {
        let ident = CharacterSet::letters().union(CharacterSet::of("_"));
        assert!(ident.contains('_'));
        assert!(ident.contains('q'));
        assert!(!ident.contains('1'));

        let not_quote = CharacterSet::of("\"").inverted();
        assert!(not_quote.contains('a'));
        assert!(!not_quote.contains('"'));
        assert_eq!(not_quote.clone().inverted(), CharacterSet::of("\""));

        let hex = CharacterSet::range('9', '0').union(CharacterSet::range('a', 'f'));
        assert!(hex.contains('c'));
        assert!(hex.contains('5'));
        assert!(!hex.contains('g'));

        let unsorted = CharacterSet::Chars(vec!['c', 'b', 'a', 'b']);
        assert!("abc".chars().all(|c| unsorted.contains(c)));
        assert!(!unsorted.contains('d'));
    }

    #[test]
    fn display_uses_stlr_names() {
        assert_eq!(CharacterSet::letters().to_string(), ".letter");
        assert_eq!(CharacterSet::whitespaces_and_newlines().to_string(), ".whitespace | .newline");
        assert_eq!(CharacterSet::range('0', '9').to_string(), "'0'...'9'");
        assert_eq!(CharacterSet::of("ba").to_string(), "\"ab\"");
    }
}
