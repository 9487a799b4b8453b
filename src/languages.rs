//! Languages built with the public grammar API.
//!
//! Each language exposes:
//!
//! - a function adding its rules to a caller's [`GrammarBuilder`](crate::GrammarBuilder),
//!   so they can be embedded in a larger grammar,
//! - a lazily built standalone [`Grammar`](crate::Grammar),
//! - helpers interpreting the trees it produces.

pub mod expression;
pub mod numeric;

#[cfg(test)]
mod tests;
