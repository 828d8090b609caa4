use std::ops::Range;

use super::labels::LabelStore;

// ---------------------------------------------------------------------------
// SuppressionMask – row ranges excluded from interval derivation
// ---------------------------------------------------------------------------

/// Half-open row ranges considered suppressed.
///
/// Built from the ordered marks of all segment labels: the first mark turns
/// suppression on, the next turns it off, and so on. An unpaired final mark
/// suppresses through the end of the table. Always derived from the
/// [`LabelStore`]; recompute it after every label mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuppressionMask {
    ranges: Vec<Range<usize>>,
}

impl SuppressionMask {
    /// A mask that suppresses nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the mask from the segment labels in `store`.
    pub fn from_store(store: &LabelStore) -> Self {
        Self::from_marks(store.segment_marks(), store.row_count())
    }

    /// Build the mask from ascending toggle rows over a table of `rows` rows.
    pub fn from_marks(marks: impl IntoIterator<Item = usize>, rows: usize) -> Self {
        let mut ranges = Vec::new();
        let mut open: Option<usize> = None;
        for mark in marks {
            match open.take() {
                None => open = Some(mark),
                Some(start) if mark > start => ranges.push(start..mark),
                // A zero-width range suppresses nothing.
                Some(_) => {}
            }
        }
        if let Some(start) = open {
            if start < rows {
                ranges.push(start..rows);
            }
        }
        Self { ranges }
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether a row lies inside a suppressed range.
    pub fn contains(&self, row: usize) -> bool {
        // Ranges are ascending and disjoint.
        let idx = self.ranges.partition_point(|r| r.end <= row);
        self.ranges.get(idx).is_some_and(|r| r.contains(&row))
    }

    /// Whether any suppressed row lies in `first..=last`.
    pub fn intersects(&self, first: usize, last: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= first);
        self.ranges.get(idx).is_some_and(|r| r.start <= last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_of_marks() {
        let mask = SuppressionMask::from_marks([4, 7], 20);
        assert_eq!(mask.ranges(), &[4..7]);
        assert!(!mask.contains(3));
        assert!(mask.contains(4));
        assert!(mask.contains(6));
        assert!(!mask.contains(7));
    }

    #[test]
    fn test_unpaired_mark_runs_to_end() {
        let mask = SuppressionMask::from_marks([6], 10);
        assert_eq!(mask.ranges(), &[6..10]);
        assert!(mask.contains(9));
        assert!(!mask.contains(5));
    }

    #[test]
    fn test_multiple_ranges() {
        let mask = SuppressionMask::from_marks([1, 3, 5, 8, 9], 12);
        assert_eq!(mask.ranges(), &[1..3, 5..8, 9..12]);
        let suppressed: Vec<usize> = (0..12).filter(|&r| mask.contains(r)).collect();
        assert_eq!(suppressed, vec![1, 2, 5, 6, 7, 9, 10, 11]);
    }

    #[test]
    fn test_intersects_spans_without_endpoints_inside() {
        let mask = SuppressionMask::from_marks([4, 7, 10], 12);
        assert!(mask.intersects(2, 9));
        assert!(mask.intersects(6, 6));
        assert!(mask.intersects(3, 4));
        assert!(mask.intersects(11, 11));
        assert!(!mask.intersects(0, 3));
        // Ranges are half-open: a span starting on a closing mark is clear.
        assert!(!mask.intersects(7, 9));
        assert!(!SuppressionMask::empty().intersects(0, 100));
    }

    #[test]
    fn test_empty_mask() {
        let mask = SuppressionMask::from_marks(Vec::new(), 10);
        assert!(mask.is_empty());
        assert!(!mask.contains(0));
        assert_eq!(mask, SuppressionMask::empty());
    }

    #[test]
    fn test_from_store_uses_every_segment_label() {
        let mut store = LabelStore::new(20, ["~".to_string(), "Noise".to_string()].into());
        store.mark("~", 2).unwrap();
        store.mark("Noise", 5).unwrap();
        store.mark("N", 3).unwrap();
        let mask = SuppressionMask::from_store(&store);
        assert_eq!(mask.ranges(), &[2..5]);
    }
}
