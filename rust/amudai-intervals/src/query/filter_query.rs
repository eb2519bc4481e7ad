use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::Result;
use log::trace;

use crate::filter::IntervalFilter;
use crate::iterator::{DocId, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED};
use crate::postings::SegmentReader;

use super::{Query, Scorer};

/// Keeps the documents of `query` in which the filtered interval tree yields
/// at least one interval.
///
/// The score of a kept document is the inner score scaled by
/// `1 / (1 + match_distance)` of the first qualifying interval.
#[derive(Clone)]
pub struct IntervalFilterQuery {
    query: Arc<dyn Query>,
    filter: Arc<dyn IntervalFilter>,
}

impl IntervalFilterQuery {
    pub fn new(query: Arc<dyn Query>, filter: Arc<dyn IntervalFilter>) -> IntervalFilterQuery {
        IntervalFilterQuery { query, filter }
    }

    pub fn query(&self) -> &Arc<dyn Query> {
        &self.query
    }

    pub fn filter(&self) -> &Arc<dyn IntervalFilter> {
        &self.filter
    }
}

impl Query for IntervalFilterQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(inner) = self.query.scorer(reader)? else {
            return Ok(None);
        };
        let intervals = self.filter.filter(false, inner.intervals(false)?);
        Ok(Some(Box::new(IntervalFilterScorer {
            inner,
            filter: self.filter.clone(),
            intervals,
            distance: 0,
            doc: UNPOSITIONED,
        })))
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        self.query.extract_fields(fields);
    }
}

impl fmt::Display for IntervalFilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.filter, self.query)
    }
}

struct IntervalFilterScorer {
    inner: Box<dyn Scorer>,
    filter: Arc<dyn IntervalFilter>,
    /// Filtered tree used to accept or reject documents.
    intervals: Box<dyn IntervalIterator>,
    distance: i32,
    doc: DocId,
}

impl IntervalFilterScorer {
    fn accepts(&mut self, doc: DocId) -> Result<bool> {
        if self.intervals.advance_to_doc(doc)? != doc {
            trace!("{}: doc {doc} rejected, intervals not positioned", self.filter);
            return Ok(false);
        }
        if self.intervals.next_interval()?.is_none() {
            trace!("{}: doc {doc} rejected", self.filter);
            return Ok(false);
        }
        self.distance = self.intervals.match_distance();
        trace!(
            "{}: doc {doc} accepted, distance {}",
            self.filter, self.distance
        );
        Ok(true)
    }

    /// Moves forward from the inner scorer's current document to the first
    /// accepted one.
    fn settle(&mut self, mut doc: DocId) -> Result<DocId> {
        while doc != NO_MORE_DOCS && !self.accepts(doc)? {
            doc = self.inner.next_doc()?;
        }
        self.doc = doc;
        Ok(doc)
    }
}

impl Scorer for IntervalFilterScorer {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let doc = self.inner.next_doc()?;
        self.settle(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let doc = self.inner.advance(target)?;
        self.settle(doc)
    }

    fn score(&mut self) -> Result<f32> {
        let score = self.inner.score()?;
        Ok(score / (1.0 + self.distance as f32))
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }

    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>> {
        Ok(self.filter.filter(collect, self.inner.intervals(collect)?))
    }
}
