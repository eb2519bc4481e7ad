//! Filters that keep a child's intervals based on their own extent.

use amudai_common::Result;

use crate::interval::{Interval, Position};
use crate::iterator::{DocId, IntervalCollector, IntervalIterator};

/// Keeps the intervals whose width (`end - begin`) does not exceed
/// `max_width`.
pub struct WithinIntervalIterator {
    inner: Box<dyn IntervalIterator>,
    max_width: i64,
    current: Interval,
}

impl WithinIntervalIterator {
    pub fn new(inner: Box<dyn IntervalIterator>, max_width: i64) -> WithinIntervalIterator {
        WithinIntervalIterator {
            inner,
            max_width,
            current: Interval::minimal(),
        }
    }

    pub fn max_width(&self) -> i64 {
        self.max_width
    }
}

impl IntervalIterator for WithinIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.current.reset();
        self.inner.advance_to_doc(doc)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        loop {
            let Some(interval) = self.inner.next_interval()? else {
                return Ok(None);
            };
            if interval.width() <= self.max_width {
                self.current.copy_from(interval);
                break;
            }
        }
        Ok(Some(&self.current))
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        self.inner.collect(collector);
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        vec![self.inner.as_ref()]
    }

    fn into_sub_iterators(self: Box<Self>, in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        self.inner.into_sub_iterators(in_order)
    }

    fn match_distance(&self) -> i32 {
        self.inner.match_distance()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}

/// Keeps the intervals that lie entirely within `[start, end]`.
pub struct RangeIntervalIterator {
    inner: Box<dyn IntervalIterator>,
    start: Position,
    end: Position,
    current: Interval,
    done: bool,
}

impl RangeIntervalIterator {
    pub fn new(
        inner: Box<dyn IntervalIterator>,
        start: Position,
        end: Position,
    ) -> RangeIntervalIterator {
        RangeIntervalIterator {
            inner,
            start,
            end,
            current: Interval::minimal(),
            done: false,
        }
    }
}

impl IntervalIterator for RangeIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.current.reset();
        self.done = false;
        self.inner.advance_to_doc(doc)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let Some(interval) = self.inner.next_interval()? else {
                self.done = true;
                return Ok(None);
            };
            if interval.begin > self.end {
                // Begins only grow from here on.
                self.done = true;
                return Ok(None);
            }
            if interval.begin >= self.start && interval.end <= self.end {
                self.current.copy_from(interval);
                break;
            }
        }
        Ok(Some(&self.current))
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        self.inner.collect(collector);
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        vec![self.inner.as_ref()]
    }

    fn into_sub_iterators(self: Box<Self>, in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        self.inner.into_sub_iterators(in_order)
    }

    fn match_distance(&self) -> i32 {
        self.inner.match_distance()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::test_support::{VecIntervals, spans};
    use crate::iterator::intervals_at;

    #[test]
    fn test_within_width() {
        let inner = VecIntervals::new(&[(0, &[(0, 1), (2, 6), (5, 7)])]);
        let mut iter = WithinIntervalIterator::new(Box::new(inner), 2);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(0, 1), (5, 7)]));
    }

    #[test]
    fn test_range() {
        let inner = VecIntervals::new(&[(0, &[(0, 1), (2, 3), (3, 6), (4, 4), (9, 9)])]);
        let mut iter = RangeIntervalIterator::new(Box::new(inner), 1, 5);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(2, 3), (4, 4)]));
        assert!(iter.next_interval().unwrap().is_none());
    }
}
