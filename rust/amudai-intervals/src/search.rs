//! Minimal search driver over one segment.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use amudai_common::Result;
use log::debug;

use crate::collector::MatchCollector;
use crate::config::SearchOptions;
use crate::iterator::{DocId, NO_MORE_DOCS};
use crate::postings::SegmentReader;
use crate::query::Query;

/// A matching document and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc: DocId,
    pub score: f32,
}

/// Heap entry ordered so that the worst hit sits on top.
struct WorstFirst(ScoredDoc);

impl PartialEq for WorstFirst {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WorstFirst {}

impl PartialOrd for WorstFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorstFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower score is "greater"; on equal scores the later doc is.
        other
            .0
            .score
            .total_cmp(&self.0.score)
            .then_with(|| self.0.doc.cmp(&other.0.doc))
    }
}

/// Runs queries against a single segment.
pub struct Searcher {
    reader: Arc<dyn SegmentReader>,
    options: SearchOptions,
}

impl Searcher {
    pub fn new(reader: Arc<dyn SegmentReader>, options: SearchOptions) -> Result<Searcher> {
        options.validate()?;
        Ok(Searcher { reader, options })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Every matching document with its score, in doc id order.
    pub fn search(&self, query: &dyn Query) -> Result<Vec<ScoredDoc>> {
        let Some(mut scorer) = query.scorer(self.reader.as_ref())? else {
            return Ok(Vec::new());
        };
        let mut hits = Vec::new();
        loop {
            let doc = scorer.next_doc()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            hits.push(ScoredDoc {
                doc,
                score: scorer.score()?,
            });
        }
        debug!("{}: {} matching documents", query, hits.len());
        Ok(hits)
    }

    /// The best `limit` documents by score, best first. Ties go to the
    /// smaller doc id.
    pub fn top_docs(&self, query: &dyn Query) -> Result<Vec<ScoredDoc>> {
        let limit = self.options.limit;
        let hits = self.search(query)?;
        let mut heap = BinaryHeap::with_capacity(limit.saturating_add(1).min(hits.len()));
        for hit in hits {
            heap.push(WorstFirst(hit));
            if heap.len() > limit {
                heap.pop();
            }
        }
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|WorstFirst(hit)| hit)
            .collect())
    }

    /// Collects the intervals with which `query` matches `doc`, for
    /// highlighting or explaining the match. Returns an empty collector when
    /// `doc` does not match.
    pub fn collect_matches(&self, query: &dyn Query, doc: DocId) -> Result<MatchCollector> {
        let mut collector = MatchCollector::with_limit(self.options.max_collected_intervals);
        let Some(mut scorer) = query.scorer(self.reader.as_ref())? else {
            return Ok(collector);
        };
        if scorer.advance(doc)? != doc {
            return Ok(collector);
        }
        let mut intervals = scorer.intervals(true)?;
        if intervals.advance_to_doc(doc)? != doc {
            return Ok(collector);
        }
        while intervals.next_interval()?.is_some() {
            intervals.collect(&mut collector);
            if collector.is_truncated() {
                debug!("{}: collected intervals of doc {} truncated", query, doc);
                break;
            }
        }
        Ok(collector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIndex;
    use crate::query::TermQuery;

    #[test]
    fn test_top_docs_orders_by_score() {
        let mut builder = MemoryIndex::builder();
        builder.add_document("body", "a");
        builder.add_document("body", "a a a a");
        builder.add_document("body", "b");
        builder.add_document("body", "a a a a");
        builder.add_document("body", "a a");
        let searcher = Searcher::new(
            Arc::new(builder.build()),
            SearchOptions::default().with_limit(3),
        )
        .unwrap();

        let query = TermQuery::new("body", "a");
        let all = searcher.search(&query).unwrap();
        assert_eq!(all.iter().map(|h| h.doc).collect::<Vec<_>>(), vec![0, 1, 3, 4]);

        let top = searcher.top_docs(&query).unwrap();
        assert_eq!(top.iter().map(|h| h.doc).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(top[0].score, 2.0);
    }

    #[test]
    fn test_top_docs_without_effective_limit() {
        let mut builder = MemoryIndex::builder();
        builder.add_document("body", "a");
        builder.add_document("body", "a a a");
        builder.add_document("body", "a a");
        let searcher = Searcher::new(
            Arc::new(builder.build()),
            SearchOptions::default().with_limit(usize::MAX),
        )
        .unwrap();

        let top = searcher.top_docs(&TermQuery::new("body", "a")).unwrap();
        assert_eq!(top.iter().map(|h| h.doc).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert!(searcher.top_docs(&TermQuery::new("body", "b")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_options() {
        let index = Arc::new(MemoryIndex::builder().build());
        assert!(Searcher::new(index, SearchOptions::default().with_limit(0)).is_err());
    }
}
