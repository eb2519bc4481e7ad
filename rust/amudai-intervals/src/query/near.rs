use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::{Result, verify_arg};

use crate::filter::{WithinOrderedFilter, WithinUnorderedFilter};
use crate::postings::SegmentReader;

use super::{FieldedConjunctionQuery, IntervalFilterQuery, Query, Scorer, fmt_list};

/// Matches when all clauses occur in the given order within a window of at
/// most `slop` positions (`end - begin <= slop`).
#[derive(Clone)]
pub struct OrderedNearQuery {
    slop: i32,
    clauses: Vec<Arc<dyn Query>>,
    inner: IntervalFilterQuery,
}

impl OrderedNearQuery {
    pub fn new(slop: i32, clauses: Vec<Arc<dyn Query>>) -> Result<OrderedNearQuery> {
        verify_arg!(clauses, !clauses.is_empty());
        let filter = WithinOrderedFilter::new(slop)?;
        let conjunction = FieldedConjunctionQuery::new(clauses.clone())?;
        Ok(OrderedNearQuery {
            slop,
            clauses,
            inner: IntervalFilterQuery::new(Arc::new(conjunction), Arc::new(filter)),
        })
    }

    pub fn slop(&self) -> i32 {
        self.slop
    }
}

impl Query for OrderedNearQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        self.inner.scorer(reader)
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        self.inner.extract_fields(fields);
    }
}

impl fmt::Display for OrderedNearQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderedNear({}, [", self.slop)?;
        fmt_list(f, &self.clauses)?;
        f.write_str("])")
    }
}

/// Matches when all clauses occur, in any order, with at most `slop`
/// positions between them.
#[derive(Clone)]
pub struct UnorderedNearQuery {
    slop: i32,
    clauses: Vec<Arc<dyn Query>>,
    inner: IntervalFilterQuery,
}

impl UnorderedNearQuery {
    pub fn new(slop: i32, clauses: Vec<Arc<dyn Query>>) -> Result<UnorderedNearQuery> {
        verify_arg!(clauses, !clauses.is_empty());
        let filter = WithinUnorderedFilter::new(slop)?;
        let conjunction = FieldedConjunctionQuery::new(clauses.clone())?;
        Ok(UnorderedNearQuery {
            slop,
            clauses,
            inner: IntervalFilterQuery::new(Arc::new(conjunction), Arc::new(filter)),
        })
    }

    pub fn slop(&self) -> i32 {
        self.slop
    }
}

impl Query for UnorderedNearQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        self.inner.scorer(reader)
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        self.inner.extract_fields(fields);
    }
}

impl fmt::Display for UnorderedNearQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnorderedNear({}, [", self.slop)?;
        fmt_list(f, &self.clauses)?;
        f.write_str("])")
    }
}
