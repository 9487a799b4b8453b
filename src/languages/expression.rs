//! Arithmetic expressions.
//!
//! ```text
//! expression = sum
//! sum        = product (ws? ("+" | "-") ws? product)+  -> sum
//!            | product
//! product    = atom (ws? ("*" | "/") ws? atom)+        -> product
//!            | atom
//! atom       = number | group
//! group      = "(" ws? expression ws? ")"              (transient)
//! ws         = whitespace+                              (void)
//! ```
//!
//! `sum` and `product` nodes only appear when an operator is present, so `42`
//! parses to a bare `number` node. Their children alternate operands and
//! `operator` nodes, left to right. Parentheses never produce a node: `group`
//! is transient and hands its single child to the parent.
//!
//! ```text
//! "2 * (3 + 4)"
//! product 0..11
//!     number 0..1
//!     operator 2..3 '*'
//!     sum 5..10
//!         number 5..6
//!         operator 7..8 '+'
//!         number 9..10
//! ```

use super::numeric;
use crate::{CharacterSet, Grammar, GrammarBuilder, Node, Options, ParseError, RuleId};
use once_cell::sync::Lazy;

static GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    let mut g = GrammarBuilder::new();
    let ws = whitespace(&mut g);
    let expression = expression_rule(&mut g);
    g.build([ws, expression, ws]).expect("expression grammar is well formed")
});

/// Optional, voided run of whitespace and newlines.
fn whitespace(g: &mut GrammarBuilder) -> RuleId {
    let space = g.set(CharacterSet::whitespaces_and_newlines());
    let spaces = g.one_or_more(space);
    let spaces = g.token(spaces, "whitespace");
    let spaces = g.void(spaces);
    g.optional(spaces)
}

/// Left-associative binary level: `operand (ws? op ws? operand)+` as a
/// `token` node, falling back to the bare operand.
fn binary(g: &mut GrammarBuilder, operand: RuleId, operators: &str, token: &str) -> RuleId {
    let ws = whitespace(g);
    let operator = g.set(CharacterSet::of(operators));
    let operator = g.token(operator, "operator");
    let tail = seq!(g; ws, operator, ws, operand);
    let tails = g.one_or_more(tail);
    let chain = seq!(g; operand, tails);
    let chain = g.token(chain, token);
    g.choice([chain, operand])
}

/// Add the expression rules to `g` and return the top-level expression rule.
pub fn expression_rule(g: &mut GrammarBuilder) -> RuleId {
    let ws = whitespace(g);
    let number = numeric::number_rule(g);
    let expression = g.declare("expression");

    let close = g.character(')');
    let close = g.error(close, "expected ')' to close the group");
    let group = seq!(g; '(', ws, &expression, ws, close);
    let group = g.token(group, "group");
    let group = g.transient(group);

    let atom = g.choice([number, group]);
    let product = binary(g, atom, "*/", "product");
    let sum = binary(g, product, "+-", "sum");
    g.resolve(expression, sum);
    sum
}

/// Standalone grammar: one expression, optionally surrounded by whitespace.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Value of the expression tree rooted at `node`.
///
/// Returns `None` for nodes this language does not produce.
pub fn evaluate(node: &Node, source: &str) -> Option<f64> {
    match node.token.name() {
        "number" => numeric::value(node, source),
        "sum" | "product" => {
            let mut children = node.children.iter();
            let mut acc = evaluate(children.next()?, source)?;
            while let Some(operator) = children.next() {
                let rhs = evaluate(children.next()?, source)?;
                acc = match operator.text(source) {
                    "+" => acc + rhs,
                    "-" => acc - rhs,
                    "*" => acc * rhs,
                    "/" => acc / rhs,
                    _ => return None,
                };
            }
            Some(acc)
        }
        _ => None,
    }
}

/// Parse and evaluate `text`, with the memoization cache enabled.
pub fn calculate(text: &str) -> Result<f64, Vec<ParseError>> {
    let options = Options::default().with_cache(Default::default());
    let tree = crate::parse_with(grammar(), text, &options).into_result()?;
    evaluate(&tree, text).ok_or_else(|| {
        vec![ParseError::interpretation(format!("cannot evaluate {}", tree.token), tree.range, Vec::new())]
    })
}
