use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::Result;
use log::{debug, trace};

use crate::iter::BrouwerianIntervalIterator;
use crate::iterator::{DocId, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED};
use crate::postings::SegmentReader;

use super::{Query, Scorer, single_field};

/// Matches the documents of `minuend` that keep at least one interval after
/// removing every interval overlapped by `subtrahend`.
///
/// Documents where the subtrahend does not occur at all are kept as they are.
/// Both operands must read the same single field.
#[derive(Clone)]
pub struct NonOverlappingQuery {
    minuend: Arc<dyn Query>,
    subtrahend: Arc<dyn Query>,
    field: String,
}

impl NonOverlappingQuery {
    pub fn new(
        minuend: Arc<dyn Query>,
        subtrahend: Arc<dyn Query>,
    ) -> Result<NonOverlappingQuery> {
        let field = single_field(
            "NonOverlappingQuery",
            &[minuend.as_ref(), subtrahend.as_ref()],
        )?;
        Ok(NonOverlappingQuery {
            minuend,
            subtrahend,
            field,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Query for NonOverlappingQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(minuend) = self.minuend.scorer(reader)? else {
            return Ok(None);
        };
        let Some(subtrahend) = self.subtrahend.scorer(reader)? else {
            debug!("{}: subtrahend has no matches, keeping minuend", self);
            return Ok(Some(minuend));
        };
        let intervals = Box::new(BrouwerianIntervalIterator::new(
            minuend.intervals(false)?,
            subtrahend.intervals(false)?,
        ));
        Ok(Some(Box::new(NonOverlappingScorer {
            minuend,
            subtrahend,
            intervals,
            doc: UNPOSITIONED,
        })))
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        fields.insert(self.field.clone());
    }
}

impl fmt::Display for NonOverlappingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NonOverlapping({}, {})", self.minuend, self.subtrahend)
    }
}

struct NonOverlappingScorer {
    minuend: Box<dyn Scorer>,
    subtrahend: Box<dyn Scorer>,
    intervals: Box<BrouwerianIntervalIterator>,
    doc: DocId,
}

impl NonOverlappingScorer {
    fn accepts(&mut self, doc: DocId) -> Result<bool> {
        let mut sub_doc = self.subtrahend.doc_id();
        if sub_doc < doc {
            sub_doc = self.subtrahend.advance(doc)?;
        }
        if sub_doc != doc {
            return Ok(true);
        }
        if self.intervals.advance_to_doc(doc)? != doc {
            return Ok(false);
        }
        let accepted = self.intervals.next_interval()?.is_some();
        if !accepted {
            trace!("doc {doc}: every minuend interval is overlapped");
        }
        Ok(accepted)
    }

    fn settle(&mut self, mut doc: DocId) -> Result<DocId> {
        while doc != NO_MORE_DOCS && !self.accepts(doc)? {
            doc = self.minuend.next_doc()?;
        }
        self.doc = doc;
        Ok(doc)
    }
}

impl Scorer for NonOverlappingScorer {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let doc = self.minuend.next_doc()?;
        self.settle(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let doc = self.minuend.advance(target)?;
        self.settle(doc)
    }

    fn score(&mut self) -> Result<f32> {
        self.minuend.score()
    }

    fn cost(&self) -> u64 {
        self.minuend.cost()
    }

    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>> {
        Ok(Box::new(BrouwerianIntervalIterator::new(
            self.minuend.intervals(collect)?,
            self.subtrahend.intervals(false)?,
        )))
    }
}

#[cfg(test)]
mod tests {
    use amudai_common::error::ErrorKind;

    use super::*;
    use crate::query::TermQuery;

    #[test]
    fn test_operands_must_share_one_field() {
        let err = NonOverlappingQuery::new(
            Arc::new(TermQuery::new("title", "a")),
            Arc::new(TermQuery::new("body", "b")),
        )
        .err()
        .unwrap();
        match err.kind() {
            ErrorKind::FieldMismatch { fields, .. } => {
                assert_eq!(fields, &["body".to_string(), "title".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let query = NonOverlappingQuery::new(
            Arc::new(TermQuery::new("body", "a")),
            Arc::new(TermQuery::new("body", "b")),
        )
        .unwrap();
        assert_eq!(query.field(), "body");
        assert_eq!(query.to_string(), "NonOverlapping(body:a, body:b)");
    }
}
