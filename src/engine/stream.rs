//! Streaming parse: one top-level node at a time.
//!
//! Unlike [`parse`](crate::parse), which applies every root once and builds a
//! single tree, a [`TokenStream`] cycles through the roots for as long as
//! input remains:
//!
//! ```text
//! loop {
//!     for root in roots { if apply(root) advances { yield its nodes; continue loop } }
//!     yield Err(no root matched); stop
//! }
//! ```
//!
//! A step that advances without producing nodes (a voided root, for example)
//! yields nothing and the stream moves on.

use super::matcher::Matcher;
use super::observer::NoopObserver;
use crate::{Grammar, Node, Options, ParseError};
use std::collections::VecDeque;

pub struct TokenStream<'g, 's> {
    matcher: Matcher<'g, 's, NoopObserver>,
    pending: VecDeque<Node>,
    finished: bool,
}

impl<'g, 's> TokenStream<'g, 's> {
    pub(crate) fn new(grammar: &'g Grammar, source: &'s str, options: &Options) -> Self {
        let matcher = Matcher::new(grammar, source, options, NoopObserver);
        TokenStream { matcher, pending: VecDeque::new(), finished: false }
    }

    /// Byte offset up to which input has been matched.
    pub fn position(&self) -> usize {
        self.matcher.position()
    }

    /// Soft diagnostics recorded so far.
    pub fn warnings(&self) -> &[ParseError] {
        self.matcher.warnings()
    }
}

impl Iterator for TokenStream<'_, '_> {
    type Item = Result<Node, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.pending.pop_front() {
                return Some(Ok(node));
            }
            if self.finished || self.matcher.at_end() {
                return None;
            }
            match self.matcher.step() {
                Ok(nodes) => self.pending.extend(nodes),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
