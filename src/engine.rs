//! Matching engine.
//!
//! This module is the entry point of the parsing runtime. It is split into
//! focused submodules under `src/engine/` and only re-exports what callers of
//! the crate need.
//!
//! ## How the parts work together
//!
//! ```text
//! Grammar (rules + roots)
//!        │
//!        v
//! Matcher::run / Matcher::step                       (matcher.rs)
//!   for each root: apply(root)
//!     ├─ MatchCache lookup / replay / store           (cache.rs)
//!     ├─ Observer events                               (observer.rs)
//!     ├─ Cursor scans + checkpoints                    (cursor.rs)
//!     └─ AstBuilder entering / succeeded / failed      (ir.rs)
//!        │
//!        v
//! Outcome { tree, errors, warnings, ParseMetrics }    (metrics.rs)
//! ```
//!
//! `run` applies the roots once each and resolves a single tree; `step` is the
//! incremental form used by [`TokenStream`] (stream.rs).
//!
//! ## Responsibilities by module
//!
//! - `matcher.rs`: rule evaluation (lookahead, tokens, cardinality, negation,
//!   sequences, ordered choice, recursion) and the parse driver.
//! - `ir.rs`: assembles nodes from match events with void, transient and
//!   pinned semantics.
//! - `cache.rs`: bounded packrat cache keyed by `(position, rule)`.
//! - `observer.rs`: evaluation hooks; `NoopObserver` and `TracingObserver`.
//! - `metrics.rs`: timings and counters of a run.
//! - `stream.rs`: the streaming iterator.
//!
//! ## Debugging
//!
//! Pass a [`TracingObserver`] to [`parse_observed`](crate::parse_observed) and
//! enable the `trace` level for this crate to see every rule evaluation.

#[path = "engine/cache.rs"]
mod cache;
#[path = "engine/ir.rs"]
mod ir;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/observer.rs"]
mod observer;
#[path = "engine/stream.rs"]
mod stream;


pub use cache::{CacheConfig, CacheStats};
pub use matcher::MatchResult;
pub(crate) use matcher::{Matcher, Outcome};
pub use metrics::{ParseMetrics, RootMetrics};
pub use observer::{NoopObserver, Observer, TracingObserver};
pub use stream::TokenStream;
