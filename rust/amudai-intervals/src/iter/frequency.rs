//! Filters on the number of intervals a child produces in a document.
//!
//! Both nodes read ahead into a reusable buffer on the first pull of every
//! document, decide, and then replay the buffered intervals. When collecting,
//! the child's collected state is frozen per buffered interval so that a
//! replayed interval reports the same leaves it was formed from.

use amudai_common::Result;

use crate::collector::SnapshotCollector;
use crate::interval::Interval;
use crate::iterator::{DocId, IntervalCollector, IntervalIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    /// Nothing was read for the current document yet.
    Unloaded,
    /// The document failed the frequency check.
    Rejected,
    /// Handing out buffered slot `n` next.
    Replaying(usize),
    /// Buffer drained, reading straight from the child.
    Forwarding,
}

/// Growable buffer of intervals (and optionally their collected state),
/// reused across documents.
struct IntervalBuffer {
    intervals: Vec<Interval>,
    snapshots: Vec<SnapshotCollector>,
    len: usize,
    collect: bool,
}

impl IntervalBuffer {
    fn new(collect: bool) -> IntervalBuffer {
        IntervalBuffer {
            intervals: Vec::new(),
            snapshots: Vec::new(),
            len: 0,
            collect,
        }
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    /// Pulls the next interval of `inner` into the buffer. Returns `false`
    /// when `inner` is exhausted.
    fn pull(&mut self, inner: &mut dyn IntervalIterator) -> Result<bool> {
        let Some(interval) = inner.next_interval()? else {
            return Ok(false);
        };
        if self.len == self.intervals.len() {
            self.intervals.push(interval.clone());
        } else {
            self.intervals[self.len].copy_from(interval);
        }
        if self.collect {
            if self.len == self.snapshots.len() {
                self.snapshots.push(SnapshotCollector::default());
            }
            let snapshot = &mut self.snapshots[self.len];
            snapshot.clear();
            inner.collect(snapshot);
        }
        self.len += 1;
        Ok(true)
    }

    fn replay(&self, slot: usize, collector: &mut dyn IntervalCollector) {
        if let Some(snapshot) = self.snapshots.get(slot) {
            snapshot.replay(collector);
        }
    }
}

/// Passes a document through only when the child produces at least
/// `min_count` intervals in it.
///
/// The first `min_count` intervals are buffered to decide; after replaying
/// them the node forwards the rest of the child's intervals unchanged.
pub struct MinFrequencyIntervalIterator {
    inner: Box<dyn IntervalIterator>,
    min_count: usize,
    buffer: IntervalBuffer,
    state: BufferState,
    /// Buffer slot of the interval handed out last, if any.
    slot: Option<usize>,
}

impl MinFrequencyIntervalIterator {
    pub fn new(
        inner: Box<dyn IntervalIterator>,
        min_count: usize,
        collect: bool,
    ) -> MinFrequencyIntervalIterator {
        debug_assert!(min_count >= 1);
        MinFrequencyIntervalIterator {
            inner,
            min_count,
            buffer: IntervalBuffer::new(collect),
            state: BufferState::Unloaded,
            slot: None,
        }
    }

    fn load(&mut self) -> Result<()> {
        self.buffer.clear();
        while self.buffer.len < self.min_count {
            if !self.buffer.pull(self.inner.as_mut())? {
                self.state = BufferState::Rejected;
                return Ok(());
            }
        }
        self.state = BufferState::Replaying(0);
        Ok(())
    }
}

impl IntervalIterator for MinFrequencyIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.state = BufferState::Unloaded;
        self.slot = None;
        self.buffer.clear();
        self.inner.advance_to_doc(doc)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        if self.state == BufferState::Unloaded {
            self.load()?;
        }
        match self.state {
            BufferState::Unloaded | BufferState::Rejected => Ok(None),
            BufferState::Replaying(slot) if slot < self.buffer.len => {
                self.state = BufferState::Replaying(slot + 1);
                self.slot = Some(slot);
                Ok(Some(&self.buffer.intervals[slot]))
            }
            BufferState::Replaying(_) | BufferState::Forwarding => {
                self.state = BufferState::Forwarding;
                self.slot = None;
                self.inner.next_interval()
            }
        }
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        match self.slot {
            Some(slot) => self.buffer.replay(slot, collector),
            None => self.inner.collect(collector),
        }
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

/// Passes a document through only when the child produces between
/// `min_count` and `max_count` intervals (inclusive) in it.
///
/// Up to `max_count + 1` intervals are buffered; the accepted set is then
/// replayed in full.
pub struct RangeFrequencyIntervalIterator {
    inner: Box<dyn IntervalIterator>,
    min_count: usize,
    max_count: usize,
    buffer: IntervalBuffer,
    state: BufferState,
    slot: Option<usize>,
}

impl RangeFrequencyIntervalIterator {
    pub fn new(
        inner: Box<dyn IntervalIterator>,
        min_count: usize,
        max_count: usize,
        collect: bool,
    ) -> RangeFrequencyIntervalIterator {
        debug_assert!(min_count >= 1 && min_count <= max_count);
        RangeFrequencyIntervalIterator {
            inner,
            min_count,
            max_count,
            buffer: IntervalBuffer::new(collect),
            state: BufferState::Unloaded,
            slot: None,
        }
    }

    fn load(&mut self) -> Result<()> {
        self.buffer.clear();
        let limit = self.max_count.saturating_add(1);
        while self.buffer.len < limit {
            if !self.buffer.pull(self.inner.as_mut())? {
                break;
            }
        }
        let count = self.buffer.len;
        self.state = if count > self.max_count || count < self.min_count {
            BufferState::Rejected
        } else {
            BufferState::Replaying(0)
        };
        Ok(())
    }
}

impl IntervalIterator for RangeFrequencyIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.state = BufferState::Unloaded;
        self.slot = None;
        self.buffer.clear();
        self.inner.advance_to_doc(doc)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        if self.state == BufferState::Unloaded {
            self.load()?;
        }
        match self.state {
            BufferState::Replaying(slot) if slot < self.buffer.len => {
                self.state = BufferState::Replaying(slot + 1);
                self.slot = Some(slot);
                Ok(Some(&self.buffer.intervals[slot]))
            }
            _ => {
                self.slot = None;
                Ok(None)
            }
        }
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        if let Some(slot) = self.slot {
            self.buffer.replay(slot, collector);
        }
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
    use crate::collector::MatchCollector;
    use crate::iter::test_support::{VecIntervals, spans};
    use crate::iterator::intervals_at;

    fn points(positions: &[i32]) -> Box<dyn IntervalIterator> {
        Box::new(VecIntervals::points(&[(0, positions)]).named("t"))
    }

    #[test]
    fn test_min_frequency() {
        let mut iter = MinFrequencyIntervalIterator::new(points(&[1, 4, 7]), 2, false);
        assert_eq!(
            intervals_at(&mut iter, 0).unwrap(),
            spans(&[(1, 1), (4, 4), (7, 7)])
        );

        let mut iter = MinFrequencyIntervalIterator::new(points(&[1, 4, 7]), 3, false);
        assert_eq!(intervals_at(&mut iter, 0).unwrap().len(), 3);

        let mut iter = MinFrequencyIntervalIterator::new(points(&[1, 4, 7]), 4, false);
        assert!(intervals_at(&mut iter, 0).unwrap().is_empty());
        assert!(iter.next_interval().unwrap().is_none());
    }

    #[test]
    fn test_min_frequency_collects_replayed_state() {
        let mut iter = MinFrequencyIntervalIterator::new(points(&[1, 4, 7]), 2, true);
        iter.advance_to_doc(0).unwrap();
        let mut positions = Vec::new();
        while let Some(interval) = iter.next_interval().unwrap() {
            let begin = interval.begin;
            let mut collector = MatchCollector::new();
            iter.collect(&mut collector);
            assert_eq!(collector.len(), 1);
            assert_eq!(collector.matches()[0].interval.begin, begin);
            positions.push(begin);
        }
        assert_eq!(positions, vec![1, 4, 7]);
    }

    #[test]
    fn test_range_frequency() {
        let mut iter = RangeFrequencyIntervalIterator::new(points(&[1, 4, 7]), 2, 3, false);
        assert_eq!(
            intervals_at(&mut iter, 0).unwrap(),
            spans(&[(1, 1), (4, 4), (7, 7)])
        );

        let mut iter = RangeFrequencyIntervalIterator::new(points(&[1, 4, 7]), 1, 2, false);
        assert!(intervals_at(&mut iter, 0).unwrap().is_empty());

        let mut iter = RangeFrequencyIntervalIterator::new(points(&[1]), 2, 5, false);
        assert!(intervals_at(&mut iter, 0).unwrap().is_empty());

        let mut iter = RangeFrequencyIntervalIterator::new(points(&[3]), 1, 1, false);
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(3, 3)]));
    }
}
