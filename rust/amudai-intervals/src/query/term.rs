use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::Result;
use log::debug;

use crate::iterator::{DocId, IntervalIterator};
use crate::leaf::TermIntervalIterator;
use crate::postings::{PostingsCursor, SegmentReader, TermPostings};

use super::{Query, Scorer};

/// Matches the documents containing `term` in `field`.
#[derive(Debug, Clone)]
pub struct TermQuery {
    field: String,
    term: String,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> TermQuery {
        TermQuery {
            field: field.into(),
            term: term.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl Query for TermQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(postings) = reader.postings(&self.field, &self.term)? else {
            debug!("term {} not found in segment", self);
            return Ok(None);
        };
        let cursor = postings.cursor()?;
        Ok(Some(Box::new(TermScorer {
            field: reader.field_name(&self.field),
            term: Arc::from(self.term.as_str()),
            postings,
            cursor,
        })))
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        fields.insert(self.field.clone());
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.term)
    }
}

/// Walks the postings of one term. The score is the square root of the
/// term's frequency in the document.
struct TermScorer {
    field: Arc<str>,
    term: Arc<str>,
    postings: Arc<dyn TermPostings>,
    cursor: Box<dyn PostingsCursor>,
}

impl Scorer for TermScorer {
    fn doc_id(&self) -> DocId {
        self.cursor.doc_id()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.cursor.next_doc()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.cursor.advance(target)
    }

    fn score(&mut self) -> Result<f32> {
        Ok((self.cursor.freq() as f32).sqrt())
    }

    fn cost(&self) -> u64 {
        self.cursor.cost()
    }

    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>> {
        Ok(Box::new(TermIntervalIterator::new(
            self.field.clone(),
            self.term.clone(),
            self.postings.cursor()?,
            collect,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::iterator::{NO_MORE_DOCS, intervals_at};
    use crate::memory::MemoryIndex;

    #[test]
    fn test_term_scorer_and_intervals() {
        let mut builder = MemoryIndex::builder();
        builder.add_document("body", "red fish blue fish");
        builder.add_document("body", "one fish");
        builder.add_document("body", "no match here");
        let index = builder.build();

        let query = TermQuery::new("body", "fish");
        let mut scorer = query.scorer(&index).unwrap().unwrap();
        assert_eq!(scorer.next_doc().unwrap(), 0);
        assert_eq!(scorer.score().unwrap(), 2f32.sqrt());

        let mut intervals = scorer.intervals(false).unwrap();
        let found = intervals_at(intervals.as_mut(), 0).unwrap();
        assert_eq!(
            found.iter().map(|i| (i.begin, i.end)).collect::<Vec<_>>(),
            vec![(1, 1), (3, 3)]
        );
        assert_eq!(found[0].field_name(), Some("body"));
        assert_eq!((found[1].offset_begin, found[1].offset_end), (14, 18));

        assert_eq!(scorer.next_doc().unwrap(), 1);
        assert_eq!(
            intervals_at(intervals.as_mut(), 1).unwrap(),
            vec![Interval::new(1, 1, 4, 8, Some(Arc::from("body")))]
        );
        assert_eq!(scorer.next_doc().unwrap(), NO_MORE_DOCS);

        assert!(TermQuery::new("body", "cat").scorer(&index).unwrap().is_none());
        assert_eq!(query.to_string(), "body:fish");
    }

    #[test]
    fn test_leaf_interval_iterator_is_idempotent_on_same_doc() {
        let mut builder = MemoryIndex::builder();
        builder.add_document("body", "a b a");
        let index = builder.build();
        let scorer = TermQuery::new("body", "a").scorer(&index).unwrap().unwrap();
        let mut intervals = scorer.intervals(false).unwrap();
        assert_eq!(intervals.advance_to_doc(0).unwrap(), 0);
        assert_eq!(intervals.next_interval().unwrap().map(|i| i.begin), Some(0));
        // A repeated advance to the same document does not rewind.
        assert_eq!(intervals.advance_to_doc(0).unwrap(), 0);
        assert_eq!(intervals.next_interval().unwrap().map(|i| i.begin), Some(2));
        assert!(intervals.next_interval().unwrap().is_none());
        assert_eq!(intervals.advance_to_doc(1).unwrap(), NO_MORE_DOCS);
        assert!(intervals.next_interval().unwrap().is_none());
    }
}
