//! Positional interval matching.
//!
//! This crate evaluates proximity constraints over the term positions of a
//! document: given the occurrences ("intervals") of individual terms, it
//! composes lazy iterators that implement an algebra over them.
//!
//! # Overview
//!
//! - [`interval::Interval`] is the `[begin, end]` position span every node
//!   works with, and [`iterator::IntervalIterator`] is the capability every
//!   node of an interval tree implements.
//! - [`leaf::TermIntervalIterator`] turns the positions of one term into
//!   point intervals, read through the [`postings`] boundary.
//! - [`iter`] holds the composite nodes: disjunction, unordered and ordered
//!   conjunction, phrase blocks, Brouwerian difference, width and range
//!   filters, and frequency filters. All of them follow minimal-interval
//!   semantics and pull from their children one step at a time.
//! - [`filter`] packages those nodes as reusable [`filter::IntervalFilter`]s.
//! - [`query`] provides document-level scorers (`TermQuery`, `BooleanQuery`)
//!   and the proximity queries built on them (`OrderedNearQuery`,
//!   `UnorderedNearQuery`, `NonOverlappingQuery`).
//! - [`search::Searcher`] drives a query over a segment and collects matched
//!   intervals for highlighting.
//!
//! [`memory::MemoryIndex`] is a small in-memory segment that implements the
//! postings boundary.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use amudai_intervals::memory::MemoryIndex;
//! use amudai_intervals::query::{OrderedNearQuery, Query, TermQuery};
//! use amudai_intervals::search::Searcher;
//! use amudai_intervals::SearchOptions;
//!
//! let mut builder = MemoryIndex::builder();
//! builder.add_document("body", "the quick brown fox");
//! builder.add_document("body", "the fox is quick");
//! let searcher = Searcher::new(Arc::new(builder.build()), SearchOptions::default()).unwrap();
//!
//! let clauses: Vec<Arc<dyn Query>> = vec![
//!     Arc::new(TermQuery::new("body", "quick")),
//!     Arc::new(TermQuery::new("body", "fox")),
//! ];
//! let query = OrderedNearQuery::new(2, clauses).unwrap();
//! let hits = searcher.search(&query).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].doc, 0);
//! ```

pub mod collector;
pub mod config;
pub mod filter;
pub mod interval;
pub mod iter;
pub mod iterator;
pub mod leaf;
pub mod memory;
pub mod postings;
pub mod query;
pub mod search;

pub use collector::{CollectedInterval, MatchCollector, MatchKind};
pub use config::SearchOptions;
pub use interval::Interval;
pub use iterator::{DocId, IntervalCollector, IntervalIterator, NO_MORE_DOCS};
