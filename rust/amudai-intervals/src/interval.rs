//! The interval value type shared by every node of an interval iterator tree.
//!
//! An [`Interval`] marks one occurrence of a term, or one composite match,
//! within a single field of a single document: a `[begin, end]` span of token
//! positions plus the corresponding byte offsets.
//!
//! Intervals are reusable scratch values. A node owns one (or a few) and
//! overwrites it on every call, lending it out by reference; a consumer that
//! needs the value past the next call clones it.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Position of a token within a field.
pub type Position = i32;

/// Begin and end value of the sentinel interval.
pub const MINIMAL_POSITION: Position = Position::MIN;

/// A `[begin, end]` position span with byte offsets and a field tag.
///
/// A well-formed interval has `begin <= end`. Offsets are informational and
/// never take part in ordering or equality of positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub begin: Position,
    pub end: Position,
    pub offset_begin: i32,
    pub offset_end: i32,
    pub field: Option<Arc<str>>,
}

impl Interval {
    pub fn new(
        begin: Position,
        end: Position,
        offset_begin: i32,
        offset_end: i32,
        field: Option<Arc<str>>,
    ) -> Interval {
        debug_assert!(begin <= end, "malformed interval [{begin},{end}]");
        Interval {
            begin,
            end,
            offset_begin,
            offset_end,
            field,
        }
    }

    /// Interval covering `[begin, end]` without offsets or field.
    pub fn span(begin: Position, end: Position) -> Interval {
        Interval::new(begin, end, -1, -1, None)
    }

    /// The sentinel interval. It compares less than every real interval.
    pub const fn minimal() -> Interval {
        Interval {
            begin: MINIMAL_POSITION,
            end: MINIMAL_POSITION,
            offset_begin: -1,
            offset_end: -1,
            field: None,
        }
    }

    pub fn is_minimal(&self) -> bool {
        self.begin == MINIMAL_POSITION && self.end == MINIMAL_POSITION
    }

    /// Turns this interval back into the sentinel, keeping the field tag.
    pub fn reset(&mut self) {
        self.begin = MINIMAL_POSITION;
        self.end = MINIMAL_POSITION;
        self.offset_begin = -1;
        self.offset_end = -1;
    }

    /// Overwrites this interval with `other`. The field name is only cloned
    /// when it actually differs.
    #[inline]
    pub fn copy_from(&mut self, other: &Interval) {
        self.begin = other.begin;
        self.end = other.end;
        self.offset_begin = other.offset_begin;
        self.offset_end = other.offset_end;
        self.set_field(other.field.as_ref());
    }

    /// Spans this interval from the start of `start` to the end of `end`.
    #[inline]
    pub fn update(&mut self, start: &Interval, end: &Interval) {
        debug_assert!(start.begin <= end.end);
        self.begin = start.begin;
        self.offset_begin = start.offset_begin;
        self.end = end.end;
        self.offset_end = end.offset_end;
        self.set_field(start.field.as_ref());
    }

    #[inline]
    fn set_field(&mut self, field: Option<&Arc<str>>) {
        let same = match (&self.field, field) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.field = field.cloned();
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Number of positions between `begin` and `end`.
    #[inline]
    pub fn width(&self) -> i64 {
        self.end as i64 - self.begin as i64
    }

    /// `true` iff this interval is entirely before or at `other`
    /// (`begin <= other.begin && end <= other.end`).
    #[inline]
    pub fn less_than(&self, other: &Interval) -> bool {
        self.begin <= other.begin && self.end <= other.end
    }

    /// Strict variant of [`Interval::less_than`].
    #[inline]
    pub fn less_than_exclusive(&self, other: &Interval) -> bool {
        self.begin < other.begin && self.end < other.end
    }

    #[inline]
    pub fn greater_than(&self, other: &Interval) -> bool {
        self.begin >= other.begin && self.end >= other.end
    }

    #[inline]
    pub fn greater_than_exclusive(&self, other: &Interval) -> bool {
        self.begin > other.begin && self.end > other.end
    }

    #[inline]
    pub fn contains(&self, other: &Interval) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Mutual containment: one of the two intervals contains the other.
    ///
    /// This is not a general range-overlap test. Two intervals that merely
    /// intersect (`[1,3]` and `[2,5]`) do not overlap under this definition,
    /// and the Brouwerian subtraction relies on exactly this behavior.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Total order used by priority queues: field name, then begin, then end.
    pub fn strict_cmp(&self, other: &Interval) -> Ordering {
        self.field_name()
            .cmp(&other.field_name())
            .then(self.begin.cmp(&other.begin))
            .then(self.end.cmp(&other.end))
    }

    #[inline]
    pub fn strictly_less_than(&self, other: &Interval) -> bool {
        self.strict_cmp(other) == Ordering::Less
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::minimal()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_minimal() {
            return f.write_str("[-inf]");
        }
        write!(
            f,
            "[{},{}]({}-{})",
            self.begin, self.end, self.offset_begin, self.offset_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_is_less_than_everything() {
        let minimal = Interval::minimal();
        assert!(minimal.is_minimal());
        assert!(minimal.less_than_exclusive(&Interval::span(0, 0)));
        assert!(minimal.less_than_exclusive(&Interval::span(-5, 10)));
        assert!(!Interval::span(0, 0).less_than_exclusive(&minimal));
    }

    #[test]
    fn test_less_than() {
        let a = Interval::span(1, 3);
        assert!(a.less_than(&Interval::span(1, 3)));
        assert!(a.less_than(&Interval::span(2, 3)));
        assert!(!a.less_than_exclusive(&Interval::span(2, 3)));
        assert!(a.less_than_exclusive(&Interval::span(2, 4)));
        assert!(!a.less_than(&Interval::span(0, 5)));
        assert!(Interval::span(2, 4).greater_than_exclusive(&a));
        assert!(Interval::span(1, 4).greater_than(&a));
    }

    #[test]
    fn test_overlaps_is_mutual_containment() {
        let outer = Interval::span(1, 3);
        assert!(outer.overlaps(&Interval::span(2, 2)));
        assert!(Interval::span(2, 2).overlaps(&outer));
        assert!(outer.overlaps(&Interval::span(1, 3)));
        // Partial intersection is not an overlap.
        assert!(!outer.overlaps(&Interval::span(2, 5)));
        assert!(!Interval::span(1, 2).overlaps(&Interval::span(4, 4)));
    }

    #[test]
    fn test_strict_cmp() {
        let body: Arc<str> = Arc::from("body");
        let title: Arc<str> = Arc::from("title");
        let a = Interval::new(5, 5, 0, 0, Some(body.clone()));
        let b = Interval::new(1, 1, 0, 0, Some(title));
        let c = Interval::new(5, 6, 0, 0, Some(body));
        assert!(a.strictly_less_than(&b));
        assert!(a.strictly_less_than(&c));
        assert!(!c.strictly_less_than(&a));
        assert_eq!(a.strict_cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_update_and_reset() {
        let field: Arc<str> = Arc::from("body");
        let start = Interval::new(2, 2, 10, 15, Some(field.clone()));
        let end = Interval::new(7, 8, 40, 52, Some(field.clone()));
        let mut composite = Interval::minimal();
        composite.update(&start, &end);
        assert_eq!(composite.begin, 2);
        assert_eq!(composite.end, 8);
        assert_eq!(composite.offset_begin, 10);
        assert_eq!(composite.offset_end, 52);
        assert!(Arc::ptr_eq(composite.field.as_ref().unwrap(), &field));
        assert_eq!(composite.width(), 6);

        composite.reset();
        assert!(composite.is_minimal());
        assert_eq!(composite.field_name(), Some("body"));
    }
}
