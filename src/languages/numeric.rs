//! Number literals.
//!
//! ```text
//! number   = sign? integer fraction? exponent?
//! sign     = "+" | "-"
//! integer  = digit+
//! fraction = "." digit+
//! exponent = ("e" | "E") sign? digit+
//! ```
//!
//! An exponent needs at least one digit after the marker and optional sign.
//! Otherwise it is not part of the literal: `1e`, `1e+` and `2E-x` match `1`,
//! `1` and `2`. A `.` without digits after it is likewise left unconsumed.

use crate::{CharacterSet, Grammar, GrammarBuilder, Node, ParseError, RuleId};
use once_cell::sync::Lazy;

static GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    let mut g = GrammarBuilder::new();
    let number = number_rule(&mut g);
    g.build([number]).expect("number grammar is well formed")
});

/// Add the number literal rules to `g` and return the `number` token rule.
///
/// The node has `integer`, `fraction` and `exponent` children (the last two
/// only when present); the sign is part of the `number` range only.
pub fn number_rule(g: &mut GrammarBuilder) -> RuleId {
    let digit = g.set(CharacterSet::decimal_digits());
    let digits = g.one_or_more(digit);
    let sign = g.set(CharacterSet::of("+-"));
    let sign = g.optional(sign);

    let integer = g.token(digits, "integer");
    let fraction = seq!(g; '.', digits);
    let fraction = g.token(fraction, "fraction");
    let fraction = g.optional(fraction);
    let marker = g.set(CharacterSet::of("eE"));
    let exponent = seq!(g; marker, sign, digits);
    let exponent = g.token(exponent, "exponent");
    let exponent = g.optional(exponent);

    let number = seq!(g; sign, integer, fraction, exponent);
    g.token(number, "number")
}

/// Standalone grammar matching a single number literal.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Value of the first `number` node in `node` (itself included).
pub fn value(node: &Node, source: &str) -> Option<f64> {
    node.find("number")?.text(source).parse().ok()
}

/// Parse `text` as exactly one number literal.
pub fn parse_value(text: &str) -> Result<f64, Vec<ParseError>> {
    let tree = crate::parse(grammar(), text)?;
    value(&tree, text).ok_or_else(|| {
        vec![ParseError::interpretation(format!("{text:?} is not a number"), tree.range, Vec::new())]
    })
}
