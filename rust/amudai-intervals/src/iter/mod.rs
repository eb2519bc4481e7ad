//! Composite interval iterators.
//!
//! Each node combines the interval streams of its children into a new stream
//! under minimal-interval semantics, pulling from the children lazily.

pub mod block;
pub mod brouwerian;
pub mod conjunction;
pub mod disjunction;
pub mod frequency;
pub mod ordered;
pub mod within;

pub use block::BlockIntervalIterator;
pub use brouwerian::BrouwerianIntervalIterator;
pub use conjunction::ConjunctionIntervalIterator;
pub use disjunction::DisjunctionIntervalIterator;
pub use frequency::{MinFrequencyIntervalIterator, RangeFrequencyIntervalIterator};
pub use ordered::OrderedConjunctionIntervalIterator;
pub use within::{RangeIntervalIterator, WithinIntervalIterator};
