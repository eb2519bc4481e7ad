//! Collectors for matched intervals.
//!
//! [`MatchCollector`] keeps everything it is given and is what highlighting
//! and explain consumers use. [`SnapshotCollector`] is the internal buffer
//! composite nodes use to freeze the state of their children at the moment a
//! candidate match is formed, since the children move on before the match is
//! handed out.

use crate::interval::Interval;
use crate::iterator::{DocId, IntervalCollector};

/// Whether a collected interval came from a leaf or a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Leaf,
    Composite,
}

/// One interval reported to a [`MatchCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedInterval {
    pub kind: MatchKind,
    pub source: Option<String>,
    pub interval: Interval,
    pub doc: DocId,
}

/// Records every collected interval, up to an optional limit.
#[derive(Debug, Default)]
pub struct MatchCollector {
    matches: Vec<CollectedInterval>,
    limit: Option<usize>,
    truncated: bool,
}

impl MatchCollector {
    pub fn new() -> MatchCollector {
        MatchCollector::default()
    }

    /// Collector that stops recording after `limit` intervals.
    pub fn with_limit(limit: usize) -> MatchCollector {
        MatchCollector {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn matches(&self) -> &[CollectedInterval] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<CollectedInterval> {
        self.matches
    }

    /// Leaf intervals only, in collection order.
    pub fn leaves(&self) -> impl Iterator<Item = &CollectedInterval> {
        self.matches.iter().filter(|m| m.kind == MatchKind::Leaf)
    }

    /// Composite intervals only, in collection order.
    pub fn composites(&self) -> impl Iterator<Item = &CollectedInterval> {
        self.matches.iter().filter(|m| m.kind == MatchKind::Composite)
    }

    /// `true` when the limit was hit and some intervals were dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.truncated = false;
    }

    fn push(&mut self, kind: MatchKind, source: Option<&str>, interval: &Interval, doc: DocId) {
        if self.limit.is_some_and(|limit| self.matches.len() >= limit) {
            self.truncated = true;
            return;
        }
        self.matches.push(CollectedInterval {
            kind,
            source: source.map(str::to_string),
            interval: interval.clone(),
            doc,
        });
    }
}

impl IntervalCollector for MatchCollector {
    fn collect_leaf(&mut self, source: Option<&str>, interval: &Interval, doc: DocId) {
        self.push(MatchKind::Leaf, source, interval, doc);
    }

    fn collect_composite(&mut self, source: Option<&str>, interval: &Interval, doc: DocId) {
        self.push(MatchKind::Composite, source, interval, doc);
    }
}

struct SnapshotEntry {
    kind: MatchKind,
    source: Option<String>,
    interval: Interval,
    doc: DocId,
}

/// Reusable recording of collector calls that can be replayed later.
///
/// Entries are recycled between snapshots so that steady-state collection
/// does not allocate.
#[derive(Default)]
pub(crate) struct SnapshotCollector {
    entries: Vec<SnapshotEntry>,
    len: usize,
}

impl SnapshotCollector {
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn replay(&self, collector: &mut dyn IntervalCollector) {
        for entry in &self.entries[..self.len] {
            match entry.kind {
                MatchKind::Leaf => {
                    collector.collect_leaf(entry.source.as_deref(), &entry.interval, entry.doc)
                }
                MatchKind::Composite => collector.collect_composite(
                    entry.source.as_deref(),
                    &entry.interval,
                    entry.doc,
                ),
            }
        }
    }

    fn record(&mut self, kind: MatchKind, source: Option<&str>, interval: &Interval, doc: DocId) {
        if self.len == self.entries.len() {
            self.entries.push(SnapshotEntry {
                kind,
                source: None,
                interval: Interval::minimal(),
                doc,
            });
        }
        let entry = &mut self.entries[self.len];
        entry.kind = kind;
        entry.doc = doc;
        entry.interval.copy_from(interval);
        match source {
            Some(src) => {
                if let Some(dst) = entry.source.as_mut() {
                    dst.clear();
                    dst.push_str(src);
                } else {
                    entry.source = Some(src.to_string());
                }
            }
            None => entry.source = None,
        }
        self.len += 1;
    }
}

impl IntervalCollector for SnapshotCollector {
    fn collect_leaf(&mut self, source: Option<&str>, interval: &Interval, doc: DocId) {
        self.record(MatchKind::Leaf, source, interval, doc);
    }

    fn collect_composite(&mut self, source: Option<&str>, interval: &Interval, doc: DocId) {
        self.record(MatchKind::Composite, source, interval, doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_collector_limit() {
        let mut collector = MatchCollector::with_limit(2);
        collector.collect_leaf(Some("quick"), &Interval::span(1, 1), 0);
        collector.collect_composite(None, &Interval::span(1, 3), 0);
        collector.collect_leaf(Some("fox"), &Interval::span(3, 3), 0);
        assert_eq!(collector.len(), 2);
        assert!(collector.is_truncated());
        assert_eq!(collector.leaves().count(), 1);
        assert_eq!(collector.composites().count(), 1);
    }

    #[test]
    fn test_snapshot_replay_reuses_entries() {
        let mut snapshot = SnapshotCollector::default();
        snapshot.collect_leaf(Some("brown"), &Interval::span(2, 2), 7);
        snapshot.collect_composite(Some("conjunction"), &Interval::span(1, 3), 7);

        snapshot.clear();
        snapshot.collect_leaf(Some("fox"), &Interval::span(3, 3), 8);

        let mut collector = MatchCollector::new();
        snapshot.replay(&mut collector);
        assert_eq!(collector.len(), 1);
        let only = &collector.matches()[0];
        assert_eq!(only.source.as_deref(), Some("fox"));
        assert_eq!(only.interval, Interval::span(3, 3));
        assert_eq!(only.doc, 8);
        assert_eq!(only.kind, MatchKind::Leaf);
    }
}
