//! Query surface: document-level scorers that own interval trees.
//!
//! A [`Query`] is an immutable, shareable description. For each segment it
//! produces a [`Scorer`] that walks the matching documents in increasing
//! order and can hand out a fresh [`IntervalIterator`] tree mirroring its own
//! structure. Proximity queries are built by applying an
//! [`IntervalFilter`](crate::filter::IntervalFilter) to that tree.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::{Result, error::Error};

use crate::iterator::{DocId, IntervalIterator};
use crate::postings::SegmentReader;

mod boolean;
mod fielded;
mod filter_query;
mod near;
mod non_overlapping;
mod term;

pub use boolean::{BooleanClause, BooleanQuery, Occur};
pub use fielded::{FieldedBooleanQuery, FieldedConjunctionQuery, FieldedDisjunctionQuery};
pub use filter_query::IntervalFilterQuery;
pub use near::{OrderedNearQuery, UnorderedNearQuery};
pub use non_overlapping::NonOverlappingQuery;
pub use term::TermQuery;

/// Immutable query description.
pub trait Query: fmt::Display + Send + Sync {
    /// Creates the scorer of this query over `reader`, or `None` when no
    /// document of the segment can match.
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>>;

    /// Adds the names of the fields this query reads to `fields`.
    fn extract_fields(&self, fields: &mut BTreeSet<String>);
}

/// Walks the matching documents of a query in increasing doc id order.
pub trait Scorer: Send {
    fn doc_id(&self) -> DocId;

    fn next_doc(&mut self) -> Result<DocId>;

    /// Moves to the first matching document `>= target`. `target` must be
    /// greater than the current document.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Score of the current document.
    fn score(&mut self) -> Result<f32>;

    /// Estimated number of documents this scorer visits.
    fn cost(&self) -> u64;

    /// Creates a new, unpositioned interval tree for the documents of this
    /// scorer. The tree is independent of the scorer's own cursors.
    fn intervals(&self, collect: bool) -> Result<Box<dyn IntervalIterator>>;
}

/// The single field read by `queries`, or a `FieldMismatch` error naming
/// every field found.
pub(crate) fn single_field(context: &str, queries: &[&dyn Query]) -> Result<String> {
    let mut fields = BTreeSet::new();
    for query in queries {
        query.extract_fields(&mut fields);
    }
    if fields.len() != 1 {
        return Err(Error::field_mismatch(context, fields));
    }
    fields
        .pop_first()
        .ok_or_else(|| Error::field_mismatch(context, Vec::<String>::new()))
}

/// Formats `queries` as a comma separated list.
pub(crate) fn fmt_list(f: &mut fmt::Formatter<'_>, queries: &[Arc<dyn Query>]) -> fmt::Result {
    for (i, query) in queries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{query}")?;
    }
    Ok(())
}
