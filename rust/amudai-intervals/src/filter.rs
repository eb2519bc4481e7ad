//! Interval filters: reusable recipes that wrap or rebuild the interval tree
//! of a scorer.
//!
//! A filter is applied to a freshly created interval tree each time a scorer
//! needs one, so filters are immutable and shared (`Arc<dyn IntervalFilter>`).
//! Parameters are validated when the filter is constructed.

use std::fmt;

use amudai_common::{Result, verify_arg};

use crate::interval::Position;
use crate::iter::{
    BlockIntervalIterator, ConjunctionIntervalIterator, MinFrequencyIntervalIterator,
    OrderedConjunctionIntervalIterator, RangeFrequencyIntervalIterator, RangeIntervalIterator,
    WithinIntervalIterator,
};
use crate::iterator::IntervalIterator;

/// Transforms an interval iterator into a filtered one.
pub trait IntervalFilter: fmt::Display + Send + Sync {
    /// Consumes `iter` and returns the filtered tree. `collect` tells newly
    /// built nodes whether to record matches for collection.
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator>;
}

/// Requires the sub-iterators to match in their declared order within a
/// window of at most `slop` positions (`end - begin <= slop`).
#[derive(Debug, Clone)]
pub struct WithinOrderedFilter {
    slop: i32,
    collect_leaves: bool,
}

impl WithinOrderedFilter {
    pub fn new(slop: i32) -> Result<WithinOrderedFilter> {
        verify_arg!(slop, slop >= 0);
        Ok(WithinOrderedFilter {
            slop,
            collect_leaves: true,
        })
    }

    /// Whether collected matches include the leaf intervals of each window,
    /// or only the window itself.
    pub fn with_collect_leaves(mut self, collect_leaves: bool) -> Self {
        self.collect_leaves = collect_leaves;
        self
    }

    pub fn slop(&self) -> i32 {
        self.slop
    }
}

impl IntervalFilter for WithinOrderedFilter {
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        let ordered = OrderedConjunctionIntervalIterator::new(
            collect,
            self.collect_leaves,
            iter.into_sub_iterators(true),
        );
        Box::new(WithinIntervalIterator::new(
            Box::new(ordered),
            self.slop as i64,
        ))
    }
}

impl fmt::Display for WithinOrderedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WithinOrdered({})", self.slop)
    }
}

/// Requires the sub-iterators to match in any order, with at most `slop`
/// positions between them.
///
/// `n` point matches span at least `n - 1` positions, so the window width
/// allowed is `slop + n - 1`.
#[derive(Debug, Clone)]
pub struct WithinUnorderedFilter {
    slop: i32,
    collect_leaves: bool,
}

impl WithinUnorderedFilter {
    pub fn new(slop: i32) -> Result<WithinUnorderedFilter> {
        verify_arg!(slop, slop >= 0);
        Ok(WithinUnorderedFilter {
            slop,
            collect_leaves: true,
        })
    }

    pub fn with_collect_leaves(mut self, collect_leaves: bool) -> Self {
        self.collect_leaves = collect_leaves;
        self
    }

    pub fn slop(&self) -> i32 {
        self.slop
    }
}

impl IntervalFilter for WithinUnorderedFilter {
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        let children = iter.into_sub_iterators(false);
        let max_width = self.slop as i64 + children.len() as i64 - 1;
        let conjunction = ConjunctionIntervalIterator::new(collect, self.collect_leaves, children);
        Box::new(WithinIntervalIterator::new(Box::new(conjunction), max_width))
    }
}

impl fmt::Display for WithinUnorderedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WithinUnordered({})", self.slop)
    }
}

/// Keeps the intervals of the iterator itself that are at most `max_width`
/// positions wide.
#[derive(Debug, Clone)]
pub struct WithinFilter {
    max_width: i32,
}

impl WithinFilter {
    pub fn new(max_width: i32) -> Result<WithinFilter> {
        verify_arg!(max_width, max_width >= 0);
        Ok(WithinFilter { max_width })
    }
}

impl IntervalFilter for WithinFilter {
    fn filter(&self, _collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        Box::new(WithinIntervalIterator::new(iter, self.max_width as i64))
    }
}

impl fmt::Display for WithinFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Within({})", self.max_width)
    }
}

/// Keeps the intervals that lie entirely within the positions
/// `[start, end]`.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    start: Position,
    end: Position,
}

impl RangeFilter {
    pub fn new(start: Position, end: Position) -> Result<RangeFilter> {
        verify_arg!(start, start >= 0);
        verify_arg!(end, end >= start);
        Ok(RangeFilter { start, end })
    }
}

impl IntervalFilter for RangeFilter {
    fn filter(&self, _collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        Box::new(RangeIntervalIterator::new(iter, self.start, self.end))
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range({}..={})", self.start, self.end)
    }
}

/// Requires the sub-iterators to match back to back in declared order, as a
/// phrase.
#[derive(Debug, Clone)]
pub struct BlockFilter {
    collect_leaves: bool,
}

impl BlockFilter {
    pub fn new() -> BlockFilter {
        BlockFilter {
            collect_leaves: true,
        }
    }

    pub fn with_collect_leaves(mut self, collect_leaves: bool) -> Self {
        self.collect_leaves = collect_leaves;
        self
    }
}

impl Default for BlockFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalFilter for BlockFilter {
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        Box::new(BlockIntervalIterator::new(
            collect,
            self.collect_leaves,
            iter.into_sub_iterators(true),
        ))
    }
}

impl fmt::Display for BlockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Block")
    }
}

/// Accepts a document only if the iterator yields at least `min_count`
/// intervals in it.
#[derive(Debug, Clone)]
pub struct MinFrequencyFilter {
    min_count: usize,
}

impl MinFrequencyFilter {
    pub fn new(min_count: usize) -> Result<MinFrequencyFilter> {
        verify_arg!(min_count, min_count >= 1);
        Ok(MinFrequencyFilter { min_count })
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }
}

impl IntervalFilter for MinFrequencyFilter {
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        Box::new(MinFrequencyIntervalIterator::new(
            iter,
            self.min_count,
            collect,
        ))
    }
}

impl fmt::Display for MinFrequencyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MinFrequency({})", self.min_count)
    }
}

/// Accepts a document only if the iterator yields between `min_count` and
/// `max_count` intervals (inclusive) in it.
#[derive(Debug, Clone)]
pub struct RangeFrequencyFilter {
    min_count: usize,
    max_count: usize,
}

impl RangeFrequencyFilter {
    pub fn new(min_count: usize, max_count: usize) -> Result<RangeFrequencyFilter> {
        verify_arg!(min_count, min_count >= 1);
        verify_arg!(max_count, max_count >= min_count);
        Ok(RangeFrequencyFilter {
            min_count,
            max_count,
        })
    }
}

impl IntervalFilter for RangeFrequencyFilter {
    fn filter(&self, collect: bool, iter: Box<dyn IntervalIterator>) -> Box<dyn IntervalIterator> {
        Box::new(RangeFrequencyIntervalIterator::new(
            iter,
            self.min_count,
            self.max_count,
            collect,
        ))
    }
}

impl fmt::Display for RangeFrequencyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeFrequency({}..={})", self.min_count, self.max_count)
    }
}
