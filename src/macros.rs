/// Sequence of rules on a builder.
///
/// Items may be anything implementing [`IntoRule`](crate::IntoRule):
/// rule ids, `&StubHandle`s, or chars, `&str`s and character sets, which
/// become fresh terminals.
///
/// ```
/// use stlr::{GrammarBuilder, seq};
///
/// let mut g = GrammarBuilder::new();
/// let digit = g.range('0', '9');
/// let pair = seq!(g; '(', digit, ",", digit, ')');
/// let pair = g.token(pair, "pair");
/// let grammar = g.build([pair]).unwrap();
/// assert!(grammar.parse("(1,2)").is_success());
/// ```
#[macro_export]
macro_rules! seq {
    ($g:ident; $($item:expr),+ $(,)?) => {{
        let items = [$($g.rule_from($item)),+];
        $g.sequence(items)
    }};
}

/// Ordered choice of rules on a builder; items as for [`seq!`].
///
/// ```
/// use stlr::{GrammarBuilder, choice};
///
/// let mut g = GrammarBuilder::new();
/// let bool_literal = choice!(g; "true", "false");
/// let grammar = g.build([bool_literal]).unwrap();
/// assert_eq!(grammar.parse("false").consumed, 5);
/// ```
#[macro_export]
macro_rules! choice {
    ($g:ident; $($item:expr),+ $(,)?) => {{
        let items = [$($g.rule_from($item)),+];
        $g.choice(items)
    }};
}
