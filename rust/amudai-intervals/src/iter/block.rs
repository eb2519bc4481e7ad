//! Phrase matching: children that occur back to back, in declared order.

use amudai_common::Result;

use crate::collector::SnapshotCollector;
use crate::interval::Interval;
use crate::iter::ordered::{load_heads, stretch};
use crate::iterator::{DocId, IntervalCollector, IntervalIterator, UNPOSITIONED, lead_cost};

/// Emits `[first.begin, last.end]` for every chain in which each child's
/// interval begins right after the previous child's interval ends.
pub struct BlockIntervalIterator {
    children: Vec<Box<dyn IntervalIterator>>,
    heads: Vec<Interval>,
    candidate: Interval,
    /// The first child's head was already used by a previous attempt.
    advance_first: bool,
    exhausted: bool,
    doc: DocId,
    snapshot: SnapshotCollector,
    collect: bool,
    collect_leaves: bool,
}

impl BlockIntervalIterator {
    pub fn new(
        collect: bool,
        collect_leaves: bool,
        children: Vec<Box<dyn IntervalIterator>>,
    ) -> Self {
        debug_assert!(!children.is_empty());
        let heads = vec![Interval::minimal(); children.len()];
        BlockIntervalIterator {
            children,
            heads,
            candidate: Interval::minimal(),
            advance_first: false,
            exhausted: true,
            doc: UNPOSITIONED,
            snapshot: SnapshotCollector::default(),
            collect,
            collect_leaves,
        }
    }

    fn is_adjacent(&self) -> bool {
        self.heads
            .windows(2)
            .all(|pair| pair[1].begin as i64 == pair[0].end as i64 + 1)
    }
}

impl IntervalIterator for BlockIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.candidate.reset();
        let (reached, loaded) = load_heads(&mut self.children, &mut self.heads, doc)?;
        self.doc = reached;
        self.exhausted = !loaded;
        self.advance_first = false;
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }
            if self.advance_first {
                match self.children[0].next_interval()? {
                    Some(interval) => self.heads[0].copy_from(interval),
                    None => {
                        self.exhausted = true;
                        return Ok(None);
                    }
                }
            }
            self.advance_first = true;
            if !stretch(&mut self.children, &mut self.heads)? {
                self.exhausted = true;
                return Ok(None);
            }
            if self.is_adjacent() {
                break;
            }
        }
        let last = self.heads.len() - 1;
        self.candidate.update(&self.heads[0], &self.heads[last]);
        if self.collect && self.collect_leaves {
            self.snapshot.clear();
            for child in &self.children {
                child.collect(&mut self.snapshot);
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
        collector.collect_composite(Some("block"), &self.candidate, self.doc);
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
        0
    }

    fn cost(&self) -> u64 {
        lead_cost(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::test_support::{VecIntervals, boxed, spans};
    use crate::iterator::intervals_at;

    #[test]
    fn test_adjacent_only() {
        // quick@1 brown@2 fox@3 ... quick@7 fox@9
        let mut iter = BlockIntervalIterator::new(
            false,
            false,
            boxed(vec![
                VecIntervals::points(&[(0, &[1, 7])]),
                VecIntervals::points(&[(0, &[3, 9])]),
            ]),
        );
        assert!(intervals_at(&mut iter, 0).unwrap().is_empty());

        let mut iter = BlockIntervalIterator::new(
            false,
            false,
            boxed(vec![
                VecIntervals::points(&[(0, &[1, 5, 8])]),
                VecIntervals::points(&[(0, &[2, 7, 9])]),
                VecIntervals::points(&[(0, &[3, 10])]),
            ]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(1, 3), (8, 10)]));
    }

    #[test]
    fn test_repeated_phrase_term() {
        let mut iter = BlockIntervalIterator::new(
            false,
            false,
            boxed(vec![
                VecIntervals::points(&[(0, &[4, 5, 6])]),
                VecIntervals::points(&[(0, &[4, 5, 6])]),
            ]),
        );
        assert_eq!(intervals_at(&mut iter, 0).unwrap(), spans(&[(4, 5), (5, 6)]));
    }
}
