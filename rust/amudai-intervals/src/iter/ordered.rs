//! Ordered conjunction: minimal windows in which the children occur in their
//! declared order.

use amudai_common::Result;

use crate::collector::SnapshotCollector;
use crate::interval::{Interval, Position};
use crate::iterator::{
    DocId, IntervalCollector, IntervalIterator, NO_MORE_DOCS, UNPOSITIONED, gap_distance,
    lead_cost,
};

/// Positions every child in turn on the first head that begins after the
/// previous child's head ends. Returns `false` when some child runs out.
pub(crate) fn stretch(
    children: &mut [Box<dyn IntervalIterator>],
    heads: &mut [Interval],
) -> Result<bool> {
    for i in 1..children.len() {
        while heads[i].begin <= heads[i - 1].end {
            match children[i].next_interval()? {
                Some(interval) => heads[i].copy_from(interval),
                None => return Ok(false),
            }
        }
    }
    Ok(true)
}

/// Positions each child on `doc` and loads its first interval into `heads`.
///
/// Returns the reached document and whether every child had an interval
/// there.
pub(crate) fn load_heads(
    children: &mut [Box<dyn IntervalIterator>],
    heads: &mut [Interval],
    doc: DocId,
) -> Result<(DocId, bool)> {
    let mut reached = if children.is_empty() { NO_MORE_DOCS } else { doc };
    for child in children.iter_mut() {
        reached = reached.max(child.advance_to_doc(doc)?);
    }
    if reached != doc {
        return Ok((reached, false));
    }
    for (child, head) in children.iter_mut().zip(heads.iter_mut()) {
        match child.next_interval()? {
            Some(interval) => head.copy_from(interval),
            None => return Ok((reached, false)),
        }
    }
    Ok((reached, true))
}

/// Emits the minimal intervals that contain one interval of every child, with
/// each child's interval beginning after the previous child's ends.
///
/// Candidates are built greedily: the first child's head anchors the window
/// and every later child takes its first head past the previous one. The
/// first child then moves on and the chain is stretched again, which yields
/// the next candidate. Minimality is decided against that next candidate the
/// same way as in the unordered conjunction.
///
/// Minimality of the output assumes each child emits minimal intervals
/// itself, as leaves and conjunctions do.
pub struct OrderedConjunctionIntervalIterator {
    children: Vec<Box<dyn IntervalIterator>>,
    heads: Vec<Interval>,
    candidate: Interval,
    first_at_begin: Option<(Position, Position)>,
    /// Heads were loaded but not yet chained.
    needs_stretch: bool,
    exhausted: bool,
    doc: DocId,
    distance: i32,
    snapshot: SnapshotCollector,
    collect: bool,
    collect_leaves: bool,
}

impl OrderedConjunctionIntervalIterator {
    pub fn new(
        collect: bool,
        collect_leaves: bool,
        children: Vec<Box<dyn IntervalIterator>>,
    ) -> Self {
        debug_assert!(!children.is_empty());
        let heads = vec![Interval::minimal(); children.len()];
        OrderedConjunctionIntervalIterator {
            children,
            heads,
            candidate: Interval::minimal(),
            first_at_begin: None,
            needs_stretch: false,
            exhausted: true,
            doc: UNPOSITIONED,
            distance: 0,
            snapshot: SnapshotCollector::default(),
            collect,
            collect_leaves,
        }
    }

    /// Moves the first child on and re-chains the rest. Returns the next
    /// candidate window as `(begin, end)`.
    fn advance_first(&mut self) -> Result<Option<(Position, Position)>> {
        match self.children[0].next_interval()? {
            Some(interval) => self.heads[0].copy_from(interval),
            None => {
                self.exhausted = true;
                return Ok(None);
            }
        }
        if !stretch(&mut self.children, &mut self.heads)? {
            self.exhausted = true;
            return Ok(None);
        }
        let last = self.heads.len() - 1;
        Ok(Some((self.heads[0].begin, self.heads[last].end)))
    }
}

impl IntervalIterator for OrderedConjunctionIntervalIterator {
    fn advance_to_doc(&mut self, doc: DocId) -> Result<DocId> {
        self.candidate.reset();
        self.first_at_begin = None;
        self.distance = 0;
        let (reached, loaded) = load_heads(&mut self.children, &mut self.heads, doc)?;
        self.doc = reached;
        self.exhausted = !loaded;
        self.needs_stretch = loaded;
        Ok(reached)
    }

    fn next_interval(&mut self) -> Result<Option<&Interval>> {
        if self.needs_stretch {
            self.needs_stretch = false;
            if !stretch(&mut self.children, &mut self.heads)? {
                self.exhausted = true;
            }
        }
        loop {
            if self.exhausted {
                return Ok(None);
            }
            let last = self.heads.len() - 1;
            self.candidate.update(&self.heads[0], &self.heads[last]);
            self.distance = gap_distance(&self.candidate, self.heads.iter());
            if self.collect && self.collect_leaves {
                self.snapshot.clear();
                for child in &self.children {
                    child.collect(&mut self.snapshot);
                }
            }

            let (begin, end) = (self.candidate.begin, self.candidate.end);
            let first_end = match self.first_at_begin {
                Some((first_begin, first_end)) if first_begin == begin => first_end,
                _ => {
                    self.first_at_begin = Some((begin, end));
                    end
                }
            };

            let next = self.advance_first()?;
            let covers_next = next.is_some_and(|(_, next_end)| next_end == end);
            if !covers_next && first_end >= end {
                break;
            }
        }
        Ok(Some(&self.candidate))
    }

    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn collect(&self, collector: &mut dyn IntervalCollector) {
        if !self.collect || self.candidate.is_minimal() {
            return;
        }
        collector.collect_composite(Some("ordered"), &self.candidate, self.doc);
        if self.collect_leaves {
            self.snapshot.replay(collector);
        }
    }

    fn sub_iterators(&self) -> Vec<&dyn IntervalIterator> {
        self.children.iter().map(|c| c.as_ref()).collect()
    }

    fn into_sub_iterators(self: Box<Self>, _in_order: bool) -> Vec<Box<dyn IntervalIterator>> {
        self.children
    }

    fn match_distance(&self) -> i32 {
        self.distance
    }

    fn cost(&self) -> u64 {
        lead_cost(&self.children)
    }
}
