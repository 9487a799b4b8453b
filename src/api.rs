use crate::engine::{self, CacheConfig, Matcher, NoopObserver, Observer, ParseMetrics, TokenStream};
use crate::{Grammar, Node, ParseError};
use std::time::Duration;

/// Options that affect how a parse runs.
#[derive(Debug, Clone)]
pub struct Options {
    /// Memoization cache limits; `None` disables the cache.
    pub cache: Option<CacheConfig>,
    /// Maximum number of nested recursive rules (stubs) before the parse
    /// aborts with [`ParseError::RecursionLimit`].
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options { cache: None, max_depth: 1024 }
    }
}

impl Options {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Result from [`parse_with`] and [`Grammar::parse`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed input text.
    pub text: String,
    /// Root of the tree, when one could be built.
    pub tree: Option<Node>,
    /// Fatal diagnostics, in the order they were found.
    pub errors: Vec<ParseError>,
    /// Soft diagnostics from branches that failed before a fallback matched.
    pub warnings: Vec<ParseError>,
    /// Byte offset up to which input was matched.
    pub consumed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.tree.is_some()
    }

    /// The tree, or every fatal diagnostic.
    pub fn into_result(self) -> Result<Node, Vec<ParseError>> {
        match self.tree {
            Some(tree) if self.errors.is_empty() => Ok(tree),
            _ => Err(self.errors),
        }
    }

    /// All errors rendered as `line:column: message` lines with their causes.
    pub fn render_errors(&self) -> String {
        self.errors.iter().map(|err| err.render(&self.text)).collect()
    }
}

/// Additional details returned by [`parse_verbose`] and [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseDetails {
    pub metrics: ParseMetrics,
}

/// Result from [`parse_verbose`] and [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub text: String,
    pub tree: Option<Node>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseError>,
    pub consumed: usize,
    pub elapsed: Duration,
    pub details: ParseDetails,
}

/// Parse `text` with default [`Options`].
///
/// Only fatal diagnostics are returned; soft warnings are dropped. Use
/// [`parse_with`] or [`Grammar::parse`] to keep them alongside the errors.
///
/// # Example
/// ```
/// use stlr::{GrammarBuilder, parse};
///
/// let mut g = GrammarBuilder::new();
/// let cat = g.literal("cat");
/// let dog = g.literal("dog");
/// let pet = g.choice([cat, dog]);
/// let pet = g.token(pet, "pet");
/// let grammar = g.build([pet]).unwrap();
///
/// assert_eq!(parse(&grammar, "dog").unwrap().token.name(), "pet");
/// assert!(parse(&grammar, "cow").is_err());
/// ```
pub fn parse(grammar: &Grammar, text: &str) -> Result<Node, Vec<ParseError>> {
    parse_with(grammar, text, &Options::default()).into_result()
}

/// Parse `text` with the provided `options`.
pub fn parse_with(grammar: &Grammar, text: &str, options: &Options) -> ParseResult {
    parse_observed(grammar, text, options, NoopObserver)
}

/// Parse `text`, reporting every rule evaluation to `observer`.
///
/// Pass `&mut observer` to inspect the observer after the parse.
pub fn parse_observed<O: Observer>(grammar: &Grammar, text: &str, options: &Options, observer: O) -> ParseResult {
    let outcome = Matcher::new(grammar, text, options, observer).run();
    ParseResult {
        text: text.to_string(),
        tree: outcome.tree,
        errors: outcome.errors,
        warnings: outcome.warnings,
        consumed: outcome.consumed,
        elapsed: outcome.metrics.total,
    }
}

pub fn parse_verbose(grammar: &Grammar, text: &str) -> ParseResultVerbose {
    parse_verbose_with(grammar, text, &Options::default())
}

/// Parse `text` with `options` and return run metrics alongside the result.
pub fn parse_verbose_with(grammar: &Grammar, text: &str, options: &Options) -> ParseResultVerbose {
    let outcome: engine::Outcome = Matcher::new(grammar, text, options, NoopObserver).run();
    ParseResultVerbose {
        text: text.to_string(),
        tree: outcome.tree,
        errors: outcome.errors,
        warnings: outcome.warnings,
        consumed: outcome.consumed,
        elapsed: outcome.metrics.total,
        details: ParseDetails { metrics: outcome.metrics },
    }
}

/// Stream the top-level nodes of `text` one at a time.
pub fn tokens<'g, 's>(grammar: &'g Grammar, text: &'s str, options: &Options) -> TokenStream<'g, 's> {
    TokenStream::new(grammar, text, options)
}

impl Grammar {
    /// Parse `source` with default [`Options`].
    pub fn parse(&self, source: &str) -> ParseResult {
        parse_with(self, source, &Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheConfig, GrammarBuilder, Range};

    fn words() -> Grammar {
        let mut g = GrammarBuilder::new();
        let letter = g.set(crate::CharacterSet::letters());
        let word = g.one_or_more(letter);
        let word = g.token(word, "word");
        let space = g.character(' ');
        let space = g.zero_or_more(space);
        g.build([word, space, word]).unwrap()
    }

    #[test]
    fn parse_with_returns_tree_and_timing() {
        let res = parse_with(&words(), "hello world", &Options::default());

        assert_eq!(res.text, "hello world");
        assert!(res.is_success());
        assert!(res.elapsed >= Duration::ZERO);
        assert_eq!(res.consumed, 11);

        let tree = res.tree.unwrap();
        assert_eq!(tree.token.name(), "root");
        assert_eq!(tree.range, Range::new(0, 11));
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn trailing_input_is_an_error() {
        let res = words().parse("hello world!");
        assert!(!res.is_success());
        assert_eq!(res.consumed, 11);
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].range(), Range::new(11, 12));
        assert!(res.render_errors().starts_with("1:12: unexpected input"));
    }

    #[test]
    fn failing_root_aborts_remaining_roots() {
        let res = parse_verbose_with(&words(), "hello 42", &Options::default());
        assert_eq!(res.errors.len(), 1);
        let roots = &res.details.metrics.roots;
        assert_eq!(roots.len(), 3);
        assert!(roots[0].matched && roots[1].matched);
        assert!(!roots[2].matched);
        assert_eq!(res.elapsed, res.details.metrics.total);
    }

    #[test]
    fn failed_parse_keeps_warnings_next_to_errors() {
        let mut g = GrammarBuilder::new();
        let name = g.literal("f");
        let call = seq!(g; name, '(', ')');
        let call = g.error(call, "malformed call");
        let ident = g.token(name, "ident");
        let expr = g.choice([call, ident]);
        let grammar = g.build([expr]).unwrap();

        let res = grammar.parse("f+");
        assert!(!res.is_success());
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.warnings.len(), 1);
        assert_eq!(res.warnings[0].to_string(), "malformed call");

        assert_eq!(parse(&grammar, "f+").unwrap_err(), res.errors);
    }

    #[test]
    fn parse_verbose_reports_cache_activity() {
        let options = Options::default().with_cache(CacheConfig::default());
        let res = parse_verbose_with(&words(), "hello world", &options);
        assert!(res.errors.is_empty());
        assert!(res.details.metrics.cache.stores > 0);
        assert!(res.details.metrics.rule_attempts > 0);
        // No recursive rules, so nothing nests.
        assert_eq!(res.details.metrics.max_depth_reached, 0);
    }

    #[test]
    fn streaming_yields_top_level_nodes() {
        let grammar = words();
        let names: Vec<String> =
            tokens(&grammar, "ab cd ef", &Options::default()).map(|n| n.unwrap().token.to_string()).collect();
        assert_eq!(names, vec!["word", "word", "word"]);

        let mut stream = tokens(&grammar, "ab 1", &Options::default());
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.range(), Range::new(3, 4));
        assert!(stream.next().is_none());
    }
}
