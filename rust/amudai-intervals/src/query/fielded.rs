use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use amudai_common::Result;
use log::debug;

use crate::postings::SegmentReader;

use super::{BooleanQuery, Query, Scorer, single_field};

/// A [`BooleanQuery`] whose clauses all read one and the same field.
///
/// Interval composition only makes sense within a single field, so this is
/// the building block of every proximity query. Construction fails with a
/// `FieldMismatch` error naming the fields found when the clauses resolve to
/// zero or several fields.
#[derive(Clone)]
pub struct FieldedBooleanQuery {
    inner: BooleanQuery,
    field: String,
}

impl FieldedBooleanQuery {
    pub fn new(inner: BooleanQuery) -> Result<FieldedBooleanQuery> {
        Self::with_context("FieldedBooleanQuery", inner)
    }

    fn with_context(context: &str, inner: BooleanQuery) -> Result<FieldedBooleanQuery> {
        let clauses = inner
            .clauses()
            .iter()
            .map(|c| c.query.as_ref())
            .collect::<Vec<_>>();
        let field = single_field(context, &clauses)?;
        debug!("{context} {inner} resolved to field '{field}'");
        Ok(FieldedBooleanQuery { inner, field })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn inner(&self) -> &BooleanQuery {
        &self.inner
    }
}

impl Query for FieldedBooleanQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        self.inner.scorer(reader)
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        fields.insert(self.field.clone());
    }
}

impl fmt::Display for FieldedBooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.inner)
    }
}

/// Single-field conjunction: every clause must match.
#[derive(Clone)]
pub struct FieldedConjunctionQuery(FieldedBooleanQuery);

impl FieldedConjunctionQuery {
    pub fn new(clauses: Vec<Arc<dyn Query>>) -> Result<FieldedConjunctionQuery> {
        let inner = BooleanQuery::conjunction(clauses)?;
        FieldedBooleanQuery::with_context("FieldedConjunctionQuery", inner).map(Self)
    }

    pub fn field(&self) -> &str {
        self.0.field()
    }
}

impl Query for FieldedConjunctionQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        self.0.scorer(reader)
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        self.0.extract_fields(fields);
    }
}

impl fmt::Display for FieldedConjunctionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Single-field disjunction: any clause may match.
#[derive(Clone)]
pub struct FieldedDisjunctionQuery(FieldedBooleanQuery);

impl FieldedDisjunctionQuery {
    pub fn new(clauses: Vec<Arc<dyn Query>>) -> Result<FieldedDisjunctionQuery> {
        let inner = BooleanQuery::disjunction(clauses)?;
        FieldedBooleanQuery::with_context("FieldedDisjunctionQuery", inner).map(Self)
    }

    pub fn field(&self) -> &str {
        self.0.field()
    }
}

impl Query for FieldedDisjunctionQuery {
    fn scorer(&self, reader: &dyn SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        self.0.scorer(reader)
    }

    fn extract_fields(&self, fields: &mut BTreeSet<String>) {
        self.0.extract_fields(fields);
    }
}

impl fmt::Display for FieldedDisjunctionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
