//! Brouwerian difference of two interval streams.

use amudai_common::Result;

use crate::interval::Interval;
use crate::iterator::{DocId, IntervalCollector, IntervalIterator};

/// Keeps the minuend intervals that no subtrahend interval overlaps (in the
/// mutual-containment sense of [`Interval::overlaps`]).
///
/// Both streams are walked once per document. The subtrahend stream need not
/// be an antichain (a disjunction of composites may emit `[1, 6]` before
/// `[2, 2]`), so every subtrahend interval that begins before the current
/// minuend interval ends is kept in `pending` until it ends before a later
/// minuend interval begins.
pub struct BrouwerianIntervalIterator {
    minuend: Box<dyn IntervalIterator>,
    subtrahend: Box<dyn IntervalIterator>,
    pending: Vec<Interval>,
    sub_exhausted: bool,
    current: Interval,
}

impl BrouwerianIntervalIterator {
    pub fn new(
        minuend: Box<dyn IntervalIterator>,
        subtrahend: Box<dyn IntervalIterator>,
    ) -> BrouwerianIntervalIterator {
        BrouwerianIntervalIterator {
            minuend,
            subtrahend,
            pending: Vec::new(),
            sub_exhausted: true,
            current: Interval::minimal(),
        }
    }
}

impl IntervalIterator for BrouwerianIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        let reached = self.minuend.advance_to_doc(doc)?;
        // A subtrahend already past `doc` has nothing there.
        if self.subtrahend.doc_id() <= doc {
            self.subtrahend.advance_to_doc(doc)?;
        }
        self.sub_exhausted = self.subtrahend.doc_id() != doc;
        self.pending.clear();
        self.current.reset();
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        loop {
            let Some(minuend) = self.minuend.next_interval()? else {
                return Ok(None);
            };
            let (begin, end) = (minuend.begin, minuend.end);
            // Minuend begins never decrease.
            self.pending.retain(|s| s.end >= begin);
            while !self.sub_exhausted && self.pending.last().is_none_or(|s| s.begin <= end) {
                match self.subtrahend.next_interval()? {
                    Some(interval) if interval.end >= begin => self.pending.push(interval.clone()),
                    Some(_) => {}
                    None => self.sub_exhausted = true,
                }
            }
            if !self.pending.iter().any(|s| s.overlaps(minuend)) {
                self.current.copy_from(minuend);
                break;
            }
        }
        Ok(Some(&self.current))
    }

    fn doc_id(&self) -> DocId {
        self.minuend.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        self.minuend.collect(collector);
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        vec![self.minuend.as_ref(), self.subtrahend.as_ref()]
    }

    fn into_sub_iterators(self: Box<Self>, _in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        vec![self]
    }

    fn match_distance(&self) -> i32 {
        self.minuend.match_distance()
    }

    fn cost(&self) -> u64 {
        self.minuend.cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::test_support::{VecIntervals, spans};
    use crate::iterator::intervals_at;

    fn subtract(minuend: VecIntervals, subtrahend: VecIntervals) -> BrouwerianIntervalIterator {
        BrouwerianIntervalIterator::new(Box::new(minuend), Box::new(subtrahend))
    }

    #[test]
    fn test_removes_overlapped_intervals() {
        let mut iter = subtract(
            VecIntervals::new(&[(0, &[(1, 3), (4, 6), (8, 9)])]),
            VecIntervals::points(&[(0, &[2, 9])]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(4, 6)]));
    }

    #[test]
    fn test_contained_subtrahend_after_wider_one() {
        let mut iter = subtract(
            VecIntervals::new(&[(0, &[(0, 5), (7, 9)])]),
            VecIntervals::new(&[(0, &[(1, 6), (2, 2), (8, 12)])]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(7, 9)]));

        // A wide subtrahend interval stays pending across minuend intervals.
        let mut iter = subtract(
            VecIntervals::new(&[(0, &[(0, 1), (4, 4), (6, 7)])]),
            VecIntervals::new(&[(0, &[(3, 10), (5, 5)])]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(0, 1)]));
    }

    #[test]
    fn test_partial_intersection_is_kept() {
        let mut iter = subtract(
            VecIntervals::new(&[(0, &[(1, 3)])]),
            VecIntervals::new(&[(0, &[(2, 5)])]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(1, 3)]));
    }

    #[test]
    fn test_subtrahend_on_other_documents() {
        let mut iter = subtract(
            VecIntervals::points(&[(1, &[2]), (2, &[5]), (4, &[0])]),
            VecIntervals::points(&[(2, &[5]), (3, &[0])]),
        );
        assert_eq!(intervals_at(&mut iter, 1).unwrap(), spans(&[(2, 2)]));
        assert!(intervals_at(&mut iter, 2).unwrap().is_empty());
        assert_eq!(intervals_at(&mut iter, 4).unwrap(), spans(&[(0, 0)]));
    }

    #[test]
    fn test_subtrahend_ahead_is_not_moved() {
        let mut iter = subtract(
            VecIntervals::points(&[(0, &[1]), (3, &[1])]),
            VecIntervals::points(&[(3, &[1])]),
        );
        assert_eq!(iter.advance_to_doc(3).unwrap(), 3);
        assert!(iter.next_interval().unwrap().is_none());
        // A fresh subtrahend positioned past the minuend's document.
        let mut subtrahend = VecIntervals::points(&[(3, &[1])]);
        subtrahend.advance_to_doc(3).unwrap();
        let mut iter = BrouwerianIntervalIterator::new(
            Box::new(VecIntervals::points(&[(0, &[1])])),
            Box::new(subtrahend),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(1, 1)]));
    }
}
