use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::{Result, verify_arg};
use log::debug;

use crate::iter::{ConjunctionIntervalIterator, DisjunctionIntervalIterator};
use crate::iterator::{DocId, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED};
use crate::postings::SegmentReader;

use super::{Query, Scorer};

/// How a clause takes part in a [`BooleanQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match. Without any `Must` clause at least one `Should`
    /// clause has to match.
    Should,
}

#[derive(Clone)]
pub struct BooleanClause {
    pub query: Arc<dyn Query>,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Arc<dyn Query>, occur: Occur) -> BooleanClause {
        BooleanClause { query, occur }
    }

    pub fn must(query: Arc<dyn Query>) -> BooleanClause {
        BooleanClause::new(query, Occur::Must)
    }

    pub fn should(query: Arc<dyn Query>) -> BooleanClause {
        BooleanClause::new(query, Occur::Should)
    }
}

/// Combination of `Must` and `Should` clauses.
///
/// With at least one `Must` clause the query matches the documents every
/// `Must` clause matches, and `Should` clauses only add to the score. The
/// interval tree is then the conjunction of the `Must` clauses. Without
/// `Must` clauses the query is the disjunction of its `Should` clauses.
#[derive(Clone)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    pub fn new(clauses: Vec<BooleanClause>) -> Result<BooleanQuery> {
        verify_arg!(clauses, !clauses.is_empty());
        Ok(BooleanQuery { clauses })
    }

    /// All `queries` must match.
    pub fn conjunction(queries: Vec<Arc<dyn Query>>) -> Result<BooleanQuery> {
        BooleanQuery::new(queries.into_iter().map(BooleanClause::must).collect())
    }

    /// Any of `queries` may match.
    pub fn disjunction(queries: Vec<Arc<dyn Query>>) -> Result<BooleanQuery> {
        BooleanQuery::new(queries.into_iter().map(BooleanClause::should).collect())
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn is_conjunction(&self) -> bool {
        self.clauses.iter().any(|c| c.occur == Occur::Must)
    }
}

impl Query for BooleanQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let mut musts = Vec::new();
        let mut shoulds = Vec::new();
        for clause in &self.clauses {
            let scorer = clause.query.scorer(reader)?;
            match (clause.occur, scorer) {
                (Occur::Must, Some(scorer)) => musts.push(scorer),
                (Occur::Must, None) => {
                    debug!("{}: required clause {} has no matches", self, clause.query);
                    return Ok(None);
                }
                (Occur::Should, Some(scorer)) => shoulds.push(scorer),
                (Occur::Should, None) => {}
            }
        }

        // Single clauses are still wrapped: filters split the interval tree
        // of this query into its clauses, and a bare clause tree would be
        // split into the clause's own children.
        if !musts.is_empty() {
            let lead = musts
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.cost())
                .map_or(0, |(idx, _)| idx);
            return Ok(Some(Box::new(ConjunctionScorer {
                musts,
                lead,
                shoulds,
                doc: UNPOSITIONED,
            })));
        }
        if shoulds.is_empty() {
            debug!("{}: no clause has matches", self);
            return Ok(None);
        }
        Ok(Some(Box::new(DisjunctionScorer {
            scorers: shoulds,
            doc: UNPOSITIONED,
        })))
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        for clause in &self.clauses {
            clause.query.extract_fields(fields);
        }
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match clause.occur {
                Occur::Must => write!(f, "+{}", clause.query)?,
                Occur::Should => write!(f, "{}", clause.query)?,
            }
        }
        f.write_str(")")
    }
}

/// Leapfrog intersection of the `Must` scorers, led by the cheapest one.
///
/// `musts` stays in declaration order so that the interval tree built from
/// it does too.
struct ConjunctionScorer {
    musts: Vec<Box<dyn Scorer>>,
    lead: usize,
    shoulds: Vec<Box<dyn Scorer>>,
    doc: DocId,
}

impl ConjunctionScorer {
    /// Moves every `Must` scorer to the first document `>= target` they all
    /// share.
    fn align(&mut self, mut target: DocId) -> Result<DocId> {
        'outer: while target != NO_MORE_DOCS {
            for scorer in self.musts.iter_mut() {
                let mut doc = scorer.doc_id();
                if doc < target {
                    doc = scorer.advance(target)?;
                }
                if doc > target {
                    target = doc;
                    continue 'outer;
                }
            }
            break;
        }
        self.doc = target;
        Ok(target)
    }
}

impl Scorer for ConjunctionScorer {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let target = self.musts[self.lead].next_doc()?;
        self.align(target)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let lead = &mut self.musts[self.lead];
        let target = if lead.doc_id() < target {
            lead.advance(target)?
        } else {
            lead.doc_id()
        };
        self.align(target)
    }

    fn score(&mut self) -> Result<f32> {
        let doc = self.doc;
        let mut score = 0.0;
        for scorer in self.musts.iter_mut() {
            score += scorer.score()?;
        }
        for scorer in self.shoulds.iter_mut() {
            if scorer.doc_id() < doc {
                scorer.advance(doc)?;
            }
            if scorer.doc_id() == doc {
                score += scorer.score()?;
            }
        }
        Ok(score)
    }

    fn cost(&self) -> u64 {
        self.musts[self.lead].cost()
    }

    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>> {
        let children = self
            .musts
            .iter()
            .map(|s| s.intervals(collect))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(ConjunctionIntervalIterator::new(
            collect, true, children,
        )))
    }
}

/// Union of the `Should` scorers.
struct DisjunctionScorer {
    scorers: Vec<Box<dyn Scorer>>,
    doc: DocId,
}

impl DisjunctionScorer {
    fn update_doc(&mut self) -> DocId {
        self.doc = self
            .scorers
            .iter()
            .map(|s| s.doc_id())
            .min()
            .unwrap_or(NO_MORE_DOCS);
        self.doc
    }
}

impl Scorer for DisjunctionScorer {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let current = self.doc;
        if current == NO_MORE_DOCS {
            return Ok(current);
        }
        for scorer in self.scorers.iter_mut() {
            if scorer.doc_id() == current {
                scorer.next_doc()?;
            }
        }
        Ok(self.update_doc())
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        for scorer in self.scorers.iter_mut() {
            if scorer.doc_id() < target {
                scorer.advance(target)?;
            }
        }
        Ok(self.update_doc())
    }

    fn score(&mut self) -> Result<f32> {
        let doc = self.doc;
        let mut score = 0.0;
        for scorer in self.scorers.iter_mut() {
            if scorer.doc_id() == doc {
                score += scorer.score()?;
            }
        }
        Ok(score)
    }

    fn cost(&self) -> u64 {
        self.scorers.iter().map(|s| s.cost()).sum()
    }

    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>> {
        let children = self
            .scorers
            .iter()
            .map(|s| s.intervals(collect))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(DisjunctionIntervalIterator::new(collect, children)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIndex;
    use crate::query::TermQuery;

    fn term(t: &str) -> Arc<dyn Query> {
        Arc::new(TermQuery::new("body", t))
    }

    fn docs(query: &dyn Query, index: &MemoryIndex) -> Vec<DocId> {
        let Some(mut scorer) = query.scorer(index).unwrap() else {
            return Vec::new();
        };
        let mut docs = Vec::new();
        loop {
            let doc = scorer.next_doc().unwrap();
            if doc == NO_MORE_DOCS {
                return docs;
            }
            docs.push(doc);
        }
    }

    fn index() -> MemoryIndex {
        let mut builder = MemoryIndex::builder();
        builder.add_document("body", "apple banana");
        builder.add_document("body", "banana cherry");
        builder.add_document("body", "apple cherry banana");
        builder.add_document("body", "cherry");
        builder.build()
    }

    #[test]
    fn test_conjunction_and_disjunction_docs() {
        let index = index();
        let and = BooleanQuery::conjunction(vec![term("apple"), term("banana")]).unwrap();
        assert_eq!(docs(&and, &index), vec![0, 2]);

        let or = BooleanQuery::disjunction(vec![term("apple"), term("cherry")]).unwrap();
        assert_eq!(docs(&or, &index), vec![0, 1, 2, 3]);

        let missing = BooleanQuery::conjunction(vec![term("apple"), term("durian")]).unwrap();
        assert!(missing.scorer(&index).unwrap().is_none());
        assert!(BooleanQuery::new(Vec::new()).is_err());
    }

    #[test]
    fn test_should_clauses_add_to_score() {
        let index = index();
        let query = BooleanQuery::new(vec![
            BooleanClause::must(term("banana")),
            BooleanClause::should(term("cherry")),
        ])
        .unwrap();
        assert_eq!(docs(&query, &index), vec![0, 1, 2]);

        let mut scorer = query.scorer(&index).unwrap().unwrap();
        assert_eq!(scorer.next_doc().unwrap(), 0);
        assert_eq!(scorer.score().unwrap(), 1.0);
        assert_eq!(scorer.next_doc().unwrap(), 1);
        assert_eq!(scorer.score().unwrap(), 2.0);
        assert_eq!(scorer.advance(3).unwrap(), NO_MORE_DOCS);
        assert_eq!(query.to_string(), "(+body:banana body:cherry)");
    }

    #[test]
    fn test_single_clause_keeps_clause_intervals_whole() {
        let index = index();
        let pair = BooleanQuery::conjunction(vec![term("cherry"), term("banana")]).unwrap();
        let single = BooleanQuery::conjunction(vec![Arc::new(pair)]).unwrap();
        assert_eq!(docs(&single, &index), vec![1, 2]);

        let mut scorer = single.scorer(&index).unwrap().unwrap();
        assert_eq!(scorer.next_doc().unwrap(), 1);
        assert_eq!(scorer.score().unwrap(), 2.0);
        let children = scorer.intervals(false).unwrap().into_sub_iterators(true);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].sub_iterators().len(), 2);

        let single = BooleanQuery::disjunction(vec![term("apple")]).unwrap();
        let scorer = single.scorer(&index).unwrap().unwrap();
        let children = scorer.intervals(false).unwrap().into_sub_iterators(false);
        assert_eq!(children.len(), 1);
        assert!(children[0].sub_iterators().is_empty());
    }

    #[test]
    fn test_disjunction_advance() {
        let index = index();
        let or = BooleanQuery::disjunction(vec![term("apple"), term("banana")]).unwrap();
        let mut scorer = or.scorer(&index).unwrap().unwrap();
        assert_eq!(scorer.advance(1).unwrap(), 1);
        assert_eq!(scorer.score().unwrap(), 1.0);
        assert_eq!(scorer.next_doc().unwrap(), 2);
        assert_eq!(scorer.score().unwrap(), 2.0);
        assert_eq!(scorer.next_doc().unwrap(), NO_MORE_DOCS);
    }
}
