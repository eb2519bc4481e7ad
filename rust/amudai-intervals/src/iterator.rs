//! The capability shared by every node of an interval iterator tree.

use amudai_common::Result;

use crate::interval::Interval;

/// Document identifier within a segment.
pub type DocId = i32;

/// Doc id of a cursor that has not been positioned yet.
pub const UNPOSITIONED: DocId = -1;

/// Doc id of an exhausted cursor.
pub const NO_MORE_DOCS: DocId = DocId::MAX;

/// A lazy, per-document stream of intervals.
///
/// The owning scorer drives the tree: for each candidate document it calls
/// [`advance_to_doc`](IntervalIterator::advance_to_doc) once and then
/// [`next_interval`](IntervalIterator::next_interval) until it returns `None`
/// (or until it has seen enough). Documents are visited in increasing order.
///
/// Every implementation emits the intervals of a document in non-decreasing
/// `(begin, end)` order, and composite nodes rely on their children doing the
/// same.
pub trait IntervalIterator: Send {
    /// Positions this node and its children on `doc`.
    ///
    /// Returns the document actually reached, which is `doc` when the node
    /// may have intervals there and a later document otherwise. It is never
    /// behind `doc`. Intervals of previously visited documents are discarded.
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId>;

    /// Returns the next interval of the current document.
    ///
    /// The returned reference is a view of the node's scratch interval and is
    /// only valid until the next call. Once `None` has been returned, every
    /// further call returns `None` until the next `advance_to_doc`.
    fn next_interval(&mut self) -> Result<Option<&Interval>>;

    /// The document this node was last positioned on.
    fn doc_id(&self) -> DocId;

    /// Reports the intervals that make up the current match.
    ///
    /// Nodes constructed without collection enabled report nothing.
    fn collect(&self, collector: &mut dyn IntervalCollector);

    /// Direct children of this node, in declaration order.
    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator>;

    /// Decomposes the node into the iterators a filter should rebuild a new
    /// node from. Leaves return themselves.
    fn into_sub_iterators(self: Box<Self>, in_order: bool) -> Vec<Box<dyn IntervalIterator>>;

    /// Proximity cost of the current match; smaller means tighter.
    fn match_distance(&self) -> i32;

    /// Estimated number of documents this node may visit.
    fn cost(&self) -> u64;
}

/// Receives the intervals that formed a match, for highlighting and explain.
pub trait IntervalCollector {
    /// An atomic (leaf) match. `source` names the term it came from, if known.
    fn collect_leaf(&mut self, source: Option<&str>, interval: &Interval, doc: DocId);

    /// A composite span built by a higher-level node. `source` names the node.
    fn collect_composite(&mut self, source: Option<&str>, interval: &Interval, doc: DocId);
}

/// Drains the remaining intervals of the current document into owned values.
pub fn drain_intervals(iter: &mut dyn IntervalIterator) -> Result<Vec<Interval>> {
    let mut intervals = Vec::new();
    while let Some(interval) = iter.next_interval()? {
        intervals.push(interval.clone());
    }
    Ok(intervals)
}

/// Positions `iter` on `doc` and drains its intervals there. Returns an empty
/// list when the iterator does not reach `doc`.
pub fn intervals_at(iter: &mut dyn IntervalIterator, doc: DocId) -> Result<Vec<Interval>> {
    if iter.advance_to_doc(doc)? != doc {
        return Ok(Vec::new());
    }
    drain_intervals(iter)
}

/// Sum of the children's cost estimates.
pub(crate) fn total_cost(children: &[Box<dyn IntervalIterator>]) -> u64 {
    children.iter().map(|c| c.cost()).sum()
}

/// Smallest of the children's cost estimates.
pub(crate) fn lead_cost(children: &[Box<dyn IntervalIterator>]) -> u64 {
    children.iter().map(|c| c.cost()).min().unwrap_or(0)
}

/// Positions left between the pieces of a match: the span of `composite`
/// minus the span of each `part`, never negative.
pub(crate) fn gap_distance<'a>(
    composite: &Interval,
    parts: impl Iterator<Item = &'a Interval>,
) -> i32 {
    let covered: i64 = parts.map(|p| p.width() + 1).sum();
    let gaps = composite.width() + 1 - covered;
    gaps.clamp(0, i32::MAX as i64) as i32
}
