//! How a rule is applied: kind, repetition, negation and lookahead.
//!
//! A [`Behaviour`] is a plain value. Changing it never mutates a rule in place;
//! the builder produces a new rule instance carrying the new behaviour (see
//! [`GrammarBuilder::instance_with`](crate::GrammarBuilder::instance_with)).

use crate::Token;
use crate::error::GrammarError;
use std::fmt;

/// Whether a successful match produces a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Consumes input; produces no node of its own.
    #[default]
    Scanning,
    /// Produces a node labelled with the token.
    Structural(Token),
}

/// Repetition range `[min, max]`; `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    min: usize,
    max: Option<usize>,
}

impl Cardinality {
    pub const fn one() -> Self {
        Cardinality { min: 1, max: Some(1) }
    }

    pub const fn optional() -> Self {
        Cardinality { min: 0, max: Some(1) }
    }

    pub const fn zero_or_more() -> Self {
        Cardinality { min: 0, max: None }
    }

    pub const fn one_or_more() -> Self {
        Cardinality { min: 1, max: None }
    }

    pub const fn at_least(min: usize) -> Self {
        Cardinality { min, max: None }
    }

    /// Explicit range; fails when `min > max`.
    pub fn range(min: usize, max: usize) -> Result<Self, GrammarError> {
        if min > max {
            return Err(GrammarError::InvalidCardinality { min, max });
        }
        Ok(Cardinality { min, max: Some(max) })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn is_one(&self) -> bool {
        *self == Cardinality::one()
    }

    /// `min == 0`: failing to match at all is not fatal to the container.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Whether another repetition may be attempted after `count` matches.
    pub fn allows_more(&self, count: usize) -> bool {
        self.max.is_none_or(|max| count < max)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::one()
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, Some(1)) => Ok(()),
            (0, Some(1)) => f.write_str("?"),
            (0, None) => f.write_str("*"),
            (1, None) => f.write_str("+"),
            (min, None) => write!(f, "{{{min},}}"),
            (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
            (min, Some(max)) => write!(f, "{{{min},{max}}}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Behaviour {
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub negated: bool,
    /// Match without consuming input or emitting nodes.
    pub lookahead: bool,
}

impl Behaviour {
    pub fn scanning() -> Self {
        Behaviour::default()
    }

    pub fn structural(token: impl Into<Token>) -> Self {
        Behaviour { kind: Kind::Structural(token.into()), ..Behaviour::default() }
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn lookahead(mut self) -> Self {
        self.lookahead = true;
        self
    }

    pub fn token(&self) -> Option<&Token> {
        match &self.kind {
            Kind::Structural(token) => Some(token),
            Kind::Scanning => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self.kind, Kind::Structural(_))
    }
}

/// STLR-style rendering of the modifiers: `!>token?`.
impl fmt::Display for Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        if self.lookahead {
            f.write_str(">")?;
        }
        match &self.kind {
            Kind::Structural(token) => write!(f, "{token}")?,
            Kind::Scanning => f.write_str("_")?,
        }
        write!(f, "{}", self.cardinality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_cardinalities() {
        let cases = [
            (Cardinality::one(), 1, Some(1), ""),
            (Cardinality::optional(), 0, Some(1), "?"),
            (Cardinality::zero_or_more(), 0, None, "*"),
            (Cardinality::one_or_more(), 1, None, "+"),
            (Cardinality::at_least(3), 3, None, "{3,}"),
        ];
        for (card, min, max, text) in cases {
            assert_eq!(card.min(), min);
            assert_eq!(card.max(), max);
            assert_eq!(card.to_string(), text);
        }
    }

    #[test]
    fn explicit_range_is_validated() {
        let card = Cardinality::range(2, 4).unwrap();
        assert_eq!(card.to_string(), "{2,4}");
        assert!(card.allows_more(3));
        assert!(!card.allows_more(4));
        assert_eq!(Cardinality::range(2, 2).unwrap().to_string(), "{2}");
        assert_eq!(Cardinality::range(5, 1), Err(GrammarError::InvalidCardinality { min: 5, max: 1 }));
    }

    #[test]
    fn behaviour_builders_do_not_share_state() {
        let base = Behaviour::scanning();
        let token = base.clone().with_kind(Kind::Structural(Token::new("word")));
        assert!(!base.is_structural());
        assert_eq!(token.token(), Some(&Token::new("word")));
        assert_eq!(Behaviour::structural("x").negate().lookahead().to_string(), "!>x");
        assert_eq!(Behaviour::scanning().with_cardinality(Cardinality::zero_or_more()).to_string(), "_*");
    }
}
