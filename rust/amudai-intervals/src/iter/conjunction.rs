//! Unordered conjunction: minimal windows covering one interval of every child.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;

use amudai_common::Result;

use crate::collector::SnapshotCollector;
use crate::interval::{Interval, Position};
use crate::iterator::{
    DocId, IntervalCollector, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED, gap_distance,
    lead_cost,
};

/// Queue entry for the current head of one child.
#[derive(Clone, Copy, PartialEq, Eq)]
struct HeadEntry {
    begin: Position,
    end: Position,
    child: usize,
}

impl Ord for HeadEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.begin, other.end, other.child).cmp(&(self.begin, self.end, self.child))
    }
}

impl PartialOrd for HeadEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Emits the minimal intervals that contain one interval from each child, in
/// any order.
///
/// The heads of all children sit in a min-queue keyed by `(begin, end)`. The
/// candidate window spans from the smallest head to the head with the largest
/// end. After forming a candidate the child owning the smallest head moves
/// forward, and the resulting next candidate decides whether the current one
/// was minimal: a window is dropped when the next window ends at the same
/// position (it is contained in, or equal to, the current one) or when an
/// earlier window with the same begin ended sooner.
pub struct ConjunctionIntervalIterator {
    children: Vec<Box<dyn IntervalIterator>>,
    heads: Vec<Interval>,
    queue: BinaryHeap<HeadEntry>,
    candidate: Interval,
    /// First candidate seen with the current begin, as `(begin, end)`.
    first_at_begin: Option<(Position, Position)>,
    exhausted: bool,
    doc: DocId,
    distance: i32,
    snapshot: SnapshotCollector,
    collect: bool,
    collect_leaves: bool,
}

impl ConjunctionIntervalIterator {
    pub fn new(
        collect: bool,
        collect_leaves: bool,
        children: Vec<Box<dyn IntervalIterator>>,
    ) -> Self {
        debug_assert!(!children.is_empty());
        let heads = vec![Interval::minimal(); children.len()];
        let queue = BinaryHeap::with_capacity(children.len());
        ConjunctionIntervalIterator {
            children,
            heads,
            queue,
            candidate: Interval::minimal(),
            first_at_begin: None,
            exhausted: true,
            doc: UNPOSITIONED,
            distance: 0,
            snapshot: SnapshotCollector::default(),
            collect,
            collect_leaves,
        }
    }

    fn max_end_head(&self) -> usize {
        self.heads
            .iter()
            .enumerate()
            .max_by_key(|(_, head)| head.end)
            .map_or(0, |(idx, _)| idx)
    }

    /// Moves the child owning the smallest head forward. Returns the
    /// `(begin, end)` of the next candidate window, or `None` when that child
    /// ran out.
    fn advance_top(&mut self) -> Result<Option<(Position, Position)>> {
        let Some(mut top) = self.queue.peek_mut() else {
            self.exhausted = true;
            return Ok(None);
        };
        let child = top.child;
        match self.children[child].next_interval()? {
            Some(interval) => {
                self.heads[child].copy_from(interval);
                top.begin = interval.begin;
                top.end = interval.end;
            }
            None => {
                PeekMut::pop(top);
                self.exhausted = true;
                return Ok(None);
            }
        }
        drop(top);
        let begin = self.queue.peek().map_or(Position::MAX, |top| top.begin);
        let end = self.heads[self.max_end_head()].end;
        Ok(Some((begin, end)))
    }
}

impl IntervalIterator for ConjunctionIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.queue.clear();
        self.candidate.reset();
        self.first_at_begin = None;
        self.exhausted = true;
        self.distance = 0;

        let mut reached = if self.children.is_empty() {
            NO_MORE_DOCS
        } else {
            doc
        };
        for child in self.children.iter_mut() {
            reached = reached.max(child.advance_to_doc(doc)?);
        }
        self.doc = reached;
        if reached != doc {
            return Ok(reached);
        }

        for (idx, child) in self.children.iter_mut().enumerate() {
            let Some(interval) = child.next_interval()? else {
                self.queue.clear();
                return Ok(reached);
            };
            self.heads[idx].copy_from(interval);
            self.queue.push(HeadEntry {
                begin: interval.begin,
                end: interval.end,
                child: idx,
            });
        }
        self.exhausted = false;
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }
            let Some(top) = self.queue.peek().map(|top| top.child) else {
                self.exhausted = true;
                return Ok(None);
            };
            let last = self.max_end_head();
            self.candidate.update(&self.heads[top], &self.heads[last]);
            self.distance = gap_distance(&self.candidate, self.heads.iter());
            if self.collect && self.collect_leaves {
                self.snapshot.clear();
                for child in &self.children {
                    child.collect(&mut self.snapshot);
                }
            }

            let (begin, end) = (self.candidate.begin, self.candidate.end);
            let first_end = match self.first_at_begin {
                Some((first_begin, first_end)) if first_begin == begin => first_end,
                _ => {
                    self.first_at_begin = Some((begin, end));
                    end
                }
            };

            let next = self.advance_top()?;
            let covers_next = next.is_some_and(|(_, next_end)| next_end == end);
            let covers_earlier = first_end < end;
            if !covers_next && !covers_earlier {
                break;
            }
        }
        Ok(Some(&self.candidate))
    }

    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        if !self.collect || self.candidate.is_minimal() {
            return;
        }
        collector.collect_composite(Some("conjunction"), &self.candidate, self.doc);
        if self.collect_leaves {
            self.snapshot.replay(collector);
        }
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        self.children.iter().map(|c| c.as_ref()).collect()
    }

    fn into_sub_iterators(self: Box<Self>, _in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        self.children
    }

    fn match_distance(&self) -> i32 {
        self.distance
    }

    fn cost(&self) -> u64 {
        lead_cost(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MatchCollector;
    use crate::iter::test_support::{VecIntervals, boxed, spans};
    use crate::iterator::intervals_at;

    fn conjunction(children: Vec<VecIntervals>) -> ConjunctionIntervalIterator {
        ConjunctionIntervalIterator::new(true, true, boxed(children))
    }

    #[test]
    fn test_minimal_windows() {
        let mut iter = conjunction(vec![
            VecIntervals::points(&[(0, &[1, 8])]),
            VecIntervals::points(&[(0, &[3, 4, 10])]),
        ]);
        let out = intervals_at(&mut iter, 0).unwrap();
        assert_eq!(out, spans(&[(1, 3), (4, 8), (8, 10)]));
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut iter = conjunction(vec![
            VecIntervals::points(&[(0, &[5])]),
            VecIntervals::points(&[(0, &[2])]),
            VecIntervals::points(&[(0, &[3])]),
        ]);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(2, 5)]));
        assert_eq!(iter.match_distance(), 1);
    }

    #[test]
    fn test_drops_windows_containing_smaller_ones() {
        let mut iter = conjunction(vec![
            VecIntervals::new(&[(0, &[(1, 1), (1, 5)])]),
            VecIntervals::new(&[(0, &[(2, 2)])]),
        ]);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(1, 2)]));
    }

    #[test]
    fn test_duplicate_heads_emit_once() {
        let mut iter = conjunction(vec![
            VecIntervals::points(&[(0, &[1, 1])]),
            VecIntervals::points(&[(0, &[1])]),
        ]);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(1, 1)]));
    }

    #[test]
    fn test_missing_child_rejects_document() {
        let mut iter = conjunction(vec![
            VecIntervals::points(&[(0, &[1]), (3, &[2])]),
            VecIntervals::points(&[(1, &[0]), (3, &[7])]),
        ]);
        assert_eq!(iter.advance_to_doc(0).unwrap(), 1);
        assert!(iter.next_interval().unwrap().is_none());
        assert!(intervals_at(&mut iter, 1).unwrap().is_empty());
        assert_eq!(intervals_at(&mut iter, 3).unwrap(), spans(&[(2, 7)]));
        assert_eq!(iter.advance_to_doc(4).unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn test_collects_snapshot_of_children() {
        let mut iter = conjunction(vec![
            VecIntervals::points(&[(0, &[1, 8])]).named("quick"),
            VecIntervals::points(&[(0, &[3])]).named("fox"),
        ]);
        iter.advance_to_doc(0).unwrap();
        assert_eq!(iter.next_interval().unwrap(), Some(&Interval::span(1, 3)));

        let mut collector = MatchCollector::new();
        iter.collect(&mut collector);
        assert_eq!(collector.composites().count(), 1);
        let leaves = collector
            .leaves()
            .map(|m| (m.source.clone().unwrap(), m.interval.begin))
            .collect::<Vec<_>>();
        assert_eq!(leaves, vec![("quick".to_string(), 1), ("fox".to_string(), 3)]);
    }
}
