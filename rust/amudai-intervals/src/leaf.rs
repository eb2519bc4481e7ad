//! Leaf interval source: the occurrences of one term as point intervals.

use std::sync::Arc;

use amudai_common::{Result, error::Error};

use crate::interval::Interval;
use crate::iterator::{DocId, IntervalCollector, IntervalIterator, UNPOSITIONED};
use crate::postings::PostingsCursor;

/// Yields one `[p, p]` interval per occurrence of a term in the current
/// document, read from an independent postings cursor.
pub struct TermIntervalIterator {
    term: Arc<str>,
    cursor: Box<dyn PostingsCursor>,
    interval: Interval,
    /// Document whose positions are being read, or `UNPOSITIONED`.
    positioned_doc: DocId,
    remaining: u32,
    collect: bool,
}

impl TermIntervalIterator {
    pub fn new(
        field: Arc<str>,
        term: Arc<str>,
        cursor: Box<dyn PostingsCursor>,
        collect: bool,
    ) -> TermIntervalIterator {
        let mut interval = Interval::minimal();
        interval.field = Some(field);
        TermIntervalIterator {
            term,
            cursor,
            interval,
            positioned_doc: UNPOSITIONED,
            remaining: 0,
            collect,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl IntervalIterator for TermIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        if doc == self.positioned_doc {
            return Ok(doc);
        }
        if self.cursor.doc_id() < doc {
            self.cursor.advance(doc)?;
        }
        let reached = self.cursor.doc_id();
        self.interval.reset();
        if reached == doc {
            self.positioned_doc = doc;
            self.remaining = self.cursor.freq();
        } else {
            self.positioned_doc = UNPOSITIONED;
            self.remaining = 0;
        }
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let pos = self.cursor.next_position()?;
        if pos.position < 0 || (!self.interval.is_minimal() && pos.position < self.interval.begin)
        {
            return Err(Error::corrupt_postings(
                self.term.as_ref(),
                format!(
                    "position {} after {} in doc {}",
                    pos.position, self.interval.begin, self.positioned_doc
                ),
            ));
        }
        self.interval.begin = pos.position;
        self.interval.end = pos.position;
        self.interval.offset_begin = pos.offset_begin;
        self.interval.offset_end = pos.offset_end;
        Ok(Some(&self.interval))
    }

    fn doc_id(&self) -> DocId {
        self.cursor.doc_id()
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        if self.collect && !self.interval.is_minimal() {
            collector.collect_leaf(Some(&self.term), &self.interval, self.positioned_doc);
        }
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        Vec::new()
    }

    fn into_sub_iterators(self: Box<Self>, _in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        vec![self]
    }

    fn match_distance(&self) -> i32 {
        0
    }

    fn cost(&self) -> u64 {
        self.cursor.cost()
    }
}
