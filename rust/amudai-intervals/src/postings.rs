//! Boundary to the postings layer that supplies term positions.
//!
//! The engine does not decode postings itself. A segment implementation (an
//! on-disk codec, or the in-memory [`MemoryIndex`](crate::memory::MemoryIndex))
//! exposes per-term postings through these traits; leaf interval iterators and
//! term scorers are built on top of them.

use std::sync::Arc;

use amudai_common::Result;

use crate::iterator::DocId;

/// One occurrence of a term within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermPosition {
    pub position: i32,
    pub offset_begin: i32,
    pub offset_end: i32,
}

impl TermPosition {
    pub fn new(position: i32, offset_begin: i32, offset_end: i32) -> TermPosition {
        TermPosition {
            position,
            offset_begin,
            offset_end,
        }
    }

    /// Occurrence without offset information.
    pub fn at(position: i32) -> TermPosition {
        TermPosition::new(position, -1, -1)
    }
}

/// Forward-only cursor over the documents and positions of one term.
pub trait PostingsCursor: Send {
    /// Current document, [`UNPOSITIONED`](crate::iterator::UNPOSITIONED)
    /// before the first move and [`NO_MORE_DOCS`](crate::iterator::NO_MORE_DOCS)
    /// once exhausted.
    fn doc_id(&self) -> DocId;

    fn next_doc(&mut self) -> Result<DocId>;

    /// Moves to the first document `>= target`. `target` must be greater than
    /// the current document.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Number of occurrences in the current document.
    fn freq(&self) -> u32;

    /// Next occurrence in the current document, in ascending position order.
    /// Must be called at most [`freq`](PostingsCursor::freq) times per
    /// document.
    fn next_position(&mut self) -> Result<TermPosition>;

    /// Number of documents this cursor can visit.
    fn cost(&self) -> u64;
}

/// The postings of a single term in a single field of a segment.
pub trait TermPostings: Send + Sync {
    fn doc_freq(&self) -> u32;

    /// Opens a fresh, independent cursor.
    fn cursor(&self) -> Result<Box<dyn PostingsCursor>>;
}

/// Read access to the indexed terms of one segment.
pub trait SegmentReader: Send + Sync {
    /// One past the largest doc id of the segment.
    fn max_doc(&self) -> DocId;

    /// Postings of `term` in `field`, or `None` when the term does not occur.
    fn postings(&self, field: &str, term: &str) -> Result<Option<Arc<dyn TermPostings>>>;

    /// Interned name of `field`, shared by all intervals of that field.
    fn field_name(&self, field: &str) -> Arc<str> {
        Arc::from(field)
    }
}
