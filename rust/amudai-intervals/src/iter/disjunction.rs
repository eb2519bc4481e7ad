//! Lazy k-way merge of the intervals of several children.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;

use amudai_common::Result;

use crate::interval::Interval;
use crate::iterator::{
    DocId, IntervalCollector, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED, total_cost,
};

/// Pending interval of one child.
struct QueueEntry {
    doc: DocId,
    child: usize,
    interval: Interval,
    /// Pulled from the child but not handed out yet.
    buffered: bool,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` is a max-heap.
        other
            .doc
            .cmp(&self.doc)
            .then_with(|| other.interval.strict_cmp(&self.interval))
            .then_with(|| other.child.cmp(&self.child))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Union of the intervals of its children, in ascending order.
///
/// At most one pulled-but-unreturned interval is held per child, and each
/// produced interval costs `O(log k)` heap work.
pub struct DisjunctionIntervalIterator {
    children: Vec<Box<dyn IntervalIterator>>,
    queue: BinaryHeap<QueueEntry>,
    current: Interval,
    current_child: Option<usize>,
    doc: DocId,
    collect: bool,
}

impl DisjunctionIntervalIterator {
    pub fn new(collect: bool, children: Vec<Box<dyn IntervalIterator>>) -> Self {
        let queue = BinaryHeap::with_capacity(children.len());
        DisjunctionIntervalIterator {
            children,
            queue,
            current: Interval::minimal(),
            current_child: None,
            doc: UNPOSITIONED,
            collect,
        }
    }
}

impl IntervalIterator for DisjunctionIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.queue.clear();
        self.current_child = None;
        self.current.reset();
        let mut reached = NO_MORE_DOCS;
        for (idx, child) in self.children.iter_mut().enumerate() {
            let child_doc = child.advance_to_doc(doc)?;
            reached = reached.min(child_doc);
            if child_doc == doc {
                if let Some(interval) = child.next_interval()? {
                    self.queue.push(QueueEntry {
                        doc,
                        child: idx,
                        interval: interval.clone(),
                        buffered: true,
                    });
                }
            }
        }
        self.doc = reached;
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        loop {
            let Some(mut top) = self.queue.peek_mut() else {
                self.current_child = None;
                return Ok(None);
            };
            if top.buffered {
                top.buffered = false;
                self.current.copy_from(&top.interval);
                self.current_child = Some(top.child);
                break;
            }
            match self.children[top.child].next_interval()? {
                Some(interval) => {
                    debug_assert!(
                        (interval.begin, interval.end) >= (top.interval.begin, top.interval.end)
                    );
                    top.interval.copy_from(interval);
                    top.buffered = true;
                }
                None => {
                    PeekMut::pop(top);
                }
            }
        }
        Ok(Some(&self.current))
    }

    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        if !self.collect {
            return;
        }
        if let Some(child) = self.current_child {
            self.children[child].collect(collector);
        }
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        self.children.iter().map(|c| c.as_ref()).collect()
    }

    fn into_sub_iterators(self: Box<Self>, _in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        self.children
    }

    fn match_distance(&self) -> i32 {
        self.current_child
            .map_or(0, |child| self.children[child].match_distance())
    }

    fn cost(&self) -> u64 {
        total_cost(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::test_support::{VecIntervals, boxed, spans};
    use crate::iterator::{drain_intervals, intervals_at};

    fn disjunction(children: Vec<VecIntervals>) -> DisjunctionIntervalIterator {
        DisjunctionIntervalIterator::new(false, boxed(children))
    }

    #[test]
    fn test_merges_in_order() {
        let mut iter = disjunction(vec![
            VecIntervals::points(&[(0, &[1, 5, 9])]),
            VecIntervals::points(&[(0, &[2, 5, 7])]),
            VecIntervals::points(&[(0, &[0])]),
        ]);
        let out = intervals_at(&mut iter, 0).unwrap();
        assert_eq!(out, spans(&[(0, 0), (1, 1), (2, 2), (5, 5), (5, 5), (7, 7), (9, 9)]));
        assert!(iter.next_interval().unwrap().is_none());
        assert!(iter.next_interval().unwrap().is_none());
    }

    #[test]
    fn test_children_on_different_docs() {
        let mut iter = disjunction(vec![
            VecIntervals::points(&[(1, &[3]), (4, &[1])]),
            VecIntervals::points(&[(2, &[0]), (4, &[2])]),
        ]);
        assert_eq!(iter.advance_to_doc(0).unwrap(), 1);
        assert_eq!(iter.advance_to_doc(1).unwrap(), 1);
        assert_eq!(drain_intervals(&mut iter).unwrap(), spans(&[(3, 3)]));
        assert_eq!(iter.advance_to_doc(3).unwrap(), 4);
        assert_eq!(iter.advance_to_doc(4).unwrap(), 4);
        assert_eq!(drain_intervals(&mut iter).unwrap(), spans(&[(1, 1), (2, 2)]));
        assert_eq!(iter.advance_to_doc(5).unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn test_merges_wide_intervals() {
        let mut iter = disjunction(vec![
            VecIntervals::new(&[(0, &[(1, 4), (3, 6)])]),
            VecIntervals::new(&[(0, &[(1, 2), (3, 3)])]),
        ]);
        let out = intervals_at(&mut iter, 0).unwrap();
        assert_eq!(out, spans(&[(1, 2), (1, 4), (3, 3), (3, 6)]));
    }
}
