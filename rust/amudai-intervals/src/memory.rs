//! In-memory positional segment.
//!
//! [`MemoryIndex`] is a complete, if simple, implementation of the postings
//! boundary: every field of every document is tokenized into Unicode words,
//! and the position and byte offsets of each occurrence are kept per term.
//! It backs tests and small embedded use cases; large segments come from an
//! on-disk codec instead.

use std::collections::HashMap;
use std::sync::Arc;

use amudai_common::{Result, error::Error, verify_arg};
use unicode_segmentation::UnicodeSegmentation;

use crate::iterator::{DocId, NO_MORE_DOCS, UNPOSITIONED};
use crate::postings::{PostingsCursor, SegmentReader, TermPosition, TermPostings};

/// Default maximum length of a single term in bytes before truncation.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

/// Builds a [`MemoryIndex`] one document at a time. Doc ids are assigned
/// sequentially from zero.
pub struct MemoryIndexBuilder {
    fields: HashMap<String, HashMap<String, PostingsBuilder>>,
    next_doc: DocId,
    max_term_length: usize,
    lowercase: bool,
}

#[derive(Default)]
struct PostingsBuilder {
    docs: Vec<DocId>,
    positions: Vec<Vec<TermPosition>>,
}

impl PostingsBuilder {
    fn add(&mut self, doc: DocId, position: TermPosition) {
        if self.docs.last() != Some(&doc) {
            self.docs.push(doc);
            self.positions.push(Vec::new());
        }
        if let Some(positions) = self.positions.last_mut() {
            positions.push(position);
        }
    }
}

impl MemoryIndexBuilder {
    pub fn new() -> MemoryIndexBuilder {
        MemoryIndexBuilder {
            fields: HashMap::new(),
            next_doc: 0,
            max_term_length: DEFAULT_MAX_TERM_LENGTH,
            lowercase: true,
        }
    }

    /// Terms longer than `max_term_length` bytes are truncated at a character
    /// boundary.
    pub fn with_max_term_length(mut self, max_term_length: usize) -> Result<Self> {
        verify_arg!(max_term_length, max_term_length > 0);
        self.max_term_length = max_term_length;
        Ok(self)
    }

    /// Whether terms are lowercased when indexed (default `true`).
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Adds a document with a single text field.
    pub fn add_document(&mut self, field: &str, text: &str) -> DocId {
        self.add_fields(&[(field, text)])
    }

    /// Adds a document with several text fields. Each field is tokenized into
    /// Unicode words; positions restart at zero in every field.
    pub fn add_fields(&mut self, fields: &[(&str, &str)]) -> DocId {
        let doc = self.allocate_doc();
        for &(field, text) in fields {
            let words = text
                .unicode_word_indices()
                .map(|(offset, word)| {
                    let word = truncate_str(word, self.max_term_length);
                    (offset, word)
                })
                .collect::<Vec<_>>();
            for (position, (offset, word)) in words.into_iter().enumerate() {
                let term = if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                };
                let position = TermPosition::new(
                    position as i32,
                    offset as i32,
                    (offset + word.len()) as i32,
                );
                self.postings_mut(field, term).add(doc, position);
            }
        }
        doc
    }

    /// Adds a document from explicit `(term, position)` pairs of one field.
    /// Terms are taken verbatim; offsets are not recorded.
    pub fn add_positions(&mut self, field: &str, tokens: &[(&str, i32)]) -> DocId {
        let doc = self.allocate_doc();
        let mut sorted = tokens.to_vec();
        sorted.sort_by_key(|&(_, position)| position);
        for (term, position) in sorted {
            self.postings_mut(field, term.to_string())
                .add(doc, TermPosition::at(position));
        }
        doc
    }

    /// Adds a document without any indexed content.
    pub fn add_empty(&mut self) -> DocId {
        self.allocate_doc()
    }

    pub fn build(self) -> MemoryIndex {
        let fields = self
            .fields
            .into_iter()
            .map(|(field, terms)| {
                let name: Arc<str> = Arc::from(field.as_str());
                let terms = terms
                    .into_iter()
                    .map(|(term, postings)| {
                        let postings = Arc::new(MemoryTermPostings {
                            docs: postings.docs.into(),
                            positions: postings.positions.into(),
                        });
                        (term, postings)
                    })
                    .collect();
                (field, MemoryField { name, terms })
            })
            .collect();
        MemoryIndex {
            fields,
            max_doc: self.next_doc,
        }
    }

    fn allocate_doc(&mut self) -> DocId {
        let doc = self.next_doc;
        self.next_doc += 1;
        doc
    }

    fn postings_mut(&mut self, field: &str, term: String) -> &mut PostingsBuilder {
        self.fields
            .entry(field.to_string())
            .or_default()
            .entry(term)
            .or_default()
    }
}

impl Default for MemoryIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_str(input: &str, max_term_length: usize) -> &str {
    if input.len() <= max_term_length {
        return input;
    }
    let mut boundary = max_term_length;
    while boundary > 0 && !input.is_char_boundary(boundary) {
        boundary -= 1;
    }
    &input[..boundary]
}

struct MemoryField {
    name: Arc<str>,
    terms: HashMap<String, Arc<MemoryTermPostings>>,
}

/// Immutable in-memory segment produced by [`MemoryIndexBuilder`].
pub struct MemoryIndex {
    fields: HashMap<String, MemoryField>,
    max_doc: DocId,
}

impl MemoryIndex {
    pub fn builder() -> MemoryIndexBuilder {
        MemoryIndexBuilder::new()
    }

    /// Number of distinct terms indexed in `field`.
    pub fn term_count(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, |f| f.terms.len())
    }
}

impl SegmentReader for MemoryIndex {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn postings(&self, field: &str, term: &str) -> Result<Option<Arc<dyn TermPostings>>> {
        Ok(self
            .fields
            .get(field)
            .and_then(|f| f.terms.get(term))
            .map(|p| p.clone() as Arc<dyn TermPostings>))
    }

    fn field_name(&self, field: &str) -> Arc<str> {
        self.fields
            .get(field)
            .map_or_else(|| Arc::from(field), |f| f.name.clone())
    }
}

/// Postings of one term: ascending doc ids with the positions in each.
pub struct MemoryTermPostings {
    docs: Arc<[DocId]>,
    positions: Arc<[Vec<TermPosition>]>,
}

impl TermPostings for MemoryTermPostings {
    fn doc_freq(&self) -> u32 {
        self.docs.len() as u32
    }

    fn cursor(&self) -> Result<Box<dyn PostingsCursor>> {
        Ok(Box::new(MemoryPostingsCursor {
            docs: self.docs.clone(),
            positions: self.positions.clone(),
            index: None,
            doc: UNPOSITIONED,
            next_position: 0,
        }))
    }
}

/// Cursor over [`MemoryTermPostings`].
pub struct MemoryPostingsCursor {
    docs: Arc<[DocId]>,
    positions: Arc<[Vec<TermPosition>]>,
    index: Option<usize>,
    doc: DocId,
    next_position: usize,
}

impl MemoryPostingsCursor {
    fn position_at(&mut self, index: usize) -> DocId {
        self.index = Some(index);
        self.next_position = 0;
        self.doc = self.docs.get(index).copied().unwrap_or(NO_MORE_DOCS);
        self.doc
    }
}

impl PostingsCursor for MemoryPostingsCursor {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let index = self.index.map_or(0, |i| i + 1);
        Ok(self.position_at(index))
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let start = self.index.map_or(0, |i| i + 1).min(self.docs.len());
        let offset = self.docs[start..].partition_point(|&doc| doc < target);
        Ok(self.position_at(start + offset))
    }

    fn freq(&self) -> u32 {
        self.index
            .and_then(|i| self.positions.get(i))
            .map_or(0, |p| p.len() as u32)
    }

    fn next_position(&mut self) -> Result<TermPosition> {
        let position = self
            .index
            .and_then(|i| self.positions.get(i))
            .and_then(|p| p.get(self.next_position))
            .copied()
            .ok_or_else(|| Error::invalid_operation("next_position past freq"))?;
        self.next_position += 1;
        Ok(position)
    }

    fn cost(&self) -> u64 {
        self.docs.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizes_positions_and_offsets() {
        let mut builder = MemoryIndexBuilder::new();
        let doc = builder.add_document("body", "The quick brown fox");
        let index = builder.build();
        assert_eq!(doc, 0);
        assert_eq!(index.max_doc(), 1);
        assert_eq!(index.term_count("body"), 4);

        let postings = index.postings("body", "brown").unwrap().unwrap();
        assert_eq!(postings.doc_freq(), 1);
        let mut cursor = postings.cursor().unwrap();
        assert_eq!(cursor.doc_id(), UNPOSITIONED);
        assert_eq!(cursor.next_doc().unwrap(), 0);
        assert_eq!(cursor.freq(), 1);
        assert_eq!(cursor.next_position().unwrap(), TermPosition::new(2, 10, 15));
        assert!(cursor.next_position().is_err());
        assert_eq!(cursor.next_doc().unwrap(), NO_MORE_DOCS);

        assert!(index.postings("body", "The").unwrap().is_none());
        assert!(index.postings("title", "the").unwrap().is_none());
    }

    #[test]
    fn test_cursor_advance() {
        let mut builder = MemoryIndexBuilder::new();
        builder.add_document("body", "a b");
        builder.add_document("body", "c");
        builder.add_document("body", "a a");
        builder.add_empty();
        builder.add_document("body", "b a");
        let index = builder.build();
        assert_eq!(index.max_doc(), 5);

        let mut cursor = index.postings("body", "a").unwrap().unwrap().cursor().unwrap();
        assert_eq!(cursor.advance(1).unwrap(), 2);
        assert_eq!(cursor.freq(), 2);
        assert_eq!(cursor.advance(3).unwrap(), 4);
        assert_eq!(cursor.next_position().unwrap().position, 1);
        assert_eq!(cursor.advance(5).unwrap(), NO_MORE_DOCS);
        assert_eq!(cursor.freq(), 0);
    }

    #[test]
    fn test_explicit_positions_are_sorted() {
        let mut builder = MemoryIndexBuilder::new();
        builder.add_positions("f", &[("t2", 6), ("t1", 0), ("t1", 3)]);
        let index = builder.build();
        let mut cursor = index.postings("f", "t1").unwrap().unwrap().cursor().unwrap();
        cursor.next_doc().unwrap();
        assert_eq!(cursor.freq(), 2);
        assert_eq!(cursor.next_position().unwrap(), TermPosition::at(0));
        assert_eq!(cursor.next_position().unwrap(), TermPosition::at(3));
    }

    #[test]
    fn test_term_truncation() {
        let mut builder = MemoryIndexBuilder::new()
            .with_max_term_length(3)
            .unwrap()
            .with_lowercase(false);
        builder.add_document("body", "Quickly");
        let index = builder.build();
        assert!(index.postings("body", "Qui").unwrap().is_some());
        assert!(MemoryIndexBuilder::new().with_max_term_length(0).is_err());
    }
}
