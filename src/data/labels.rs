use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};

use super::error::LabelError;

// ---------------------------------------------------------------------------
// Label kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Marks individual rows (beats, artifacts).
    Point,
    /// Each mark toggles suppression of all following rows.
    Segment,
}

/// Outcome of [`LabelStore::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Track {
    kind: LabelKind,
    marks: BTreeSet<usize>,
}

// ---------------------------------------------------------------------------
// LabelStore
// ---------------------------------------------------------------------------

/// Label name → ascending set of marked rows.
///
/// Rows are validated against the table length before any mutation, so a
/// rejected call leaves the store untouched. Several labels may mark the
/// same row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStore {
    rows: usize,
    segment_markers: BTreeSet<String>,
    tracks: BTreeMap<String, Track>,
}

impl LabelStore {
    /// Empty store for a table of `rows` rows. Labels named in
    /// `segment_markers` are created as [`LabelKind::Segment`].
    pub fn new(rows: usize, segment_markers: BTreeSet<String>) -> Self {
        Self {
            rows,
            segment_markers,
            tracks: BTreeMap::new(),
        }
    }

    /// Number of rows of the underlying table.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    fn kind_for(&self, label: &str) -> LabelKind {
        if self.segment_markers.contains(label) {
            LabelKind::Segment
        } else {
            LabelKind::Point
        }
    }

    fn check_index(&self, index: usize) -> Result<(), LabelError> {
        if index < self.rows {
            Ok(())
        } else {
            Err(LabelError::IndexOutOfRange {
                index,
                len: self.rows,
            })
        }
    }

    fn track_mut(&mut self, label: &str) -> Result<&mut Track, LabelError> {
        if label.is_empty() {
            return Err(LabelError::EmptyName);
        }
        let kind = self.kind_for(label);
        Ok(self
            .tracks
            .entry(label.to_string())
            .or_insert_with(|| Track {
                kind,
                marks: BTreeSet::new(),
            }))
    }

    // -- Label management --

    /// Create an empty label.
    pub fn declare(&mut self, label: &str) -> Result<(), LabelError> {
        if self.tracks.contains_key(label) {
            return Err(LabelError::AlreadyDeclared(label.to_string()));
        }
        self.track_mut(label).map(|_| ())
    }

    /// Drop a label and all its marks.
    pub fn remove_label(&mut self, label: &str) -> Result<(), LabelError> {
        self.tracks
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| LabelError::Unknown(label.to_string()))
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.tracks.contains_key(label)
    }

    /// Declared label names, ascending.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    pub fn kind(&self, label: &str) -> Option<LabelKind> {
        self.tracks.get(label).map(|t| t.kind)
    }

    // -- Mutation --

    /// Mark a row. Declares the label on first use. Returns `true` if the
    /// row was newly added.
    pub fn mark(&mut self, label: &str, index: usize) -> Result<bool, LabelError> {
        self.check_index(index)?;
        Ok(self.track_mut(label)?.marks.insert(index))
    }

    /// Unmark a row. Returns `true` if the row was marked.
    pub fn unmark(&mut self, label: &str, index: usize) -> Result<bool, LabelError> {
        self.check_index(index)?;
        Ok(self
            .tracks
            .get_mut(label)
            .is_some_and(|t| t.marks.remove(&index)))
    }

    /// Flip membership of a row.
    pub fn toggle(&mut self, label: &str, index: usize) -> Result<Toggle, LabelError> {
        self.check_index(index)?;
        let track = self.track_mut(label)?;
        if track.marks.remove(&index) {
            Ok(Toggle::Removed)
        } else {
            track.marks.insert(index);
            Ok(Toggle::Added)
        }
    }

    // -- Lookup --

    /// Marked rows of a label in ascending order; empty for unknown labels.
    pub fn indices_of(&self, label: &str) -> Vec<usize> {
        self.marks(label)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn marks(&self, label: &str) -> Option<&BTreeSet<usize>> {
        self.tracks.get(label).map(|t| &t.marks)
    }

    pub fn contains(&self, label: &str, index: usize) -> bool {
        self.marks(label).is_some_and(|m| m.contains(&index))
    }

    pub fn count(&self, label: &str) -> usize {
        self.marks(label).map_or(0, BTreeSet::len)
    }

    /// Highest marked row of a label.
    pub fn last(&self, label: &str) -> Option<usize> {
        self.marks(label)?.last().copied()
    }

    /// Labels marking a given row.
    pub fn labels_at(&self, index: usize) -> Vec<&str> {
        self.tracks
            .iter()
            .filter(|(_, t)| t.marks.contains(&index))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Marked row closest to `index`; ties go to the lower row.
    pub fn nearest(&self, label: &str, index: usize) -> Option<usize> {
        let marks = self.marks(label)?;
        let below = marks.range(..=index).next_back().copied();
        let above = marks.range((Excluded(index), Unbounded)).next().copied();
        match (below, above) {
            (Some(b), Some(a)) => {
                if index - b <= a - index {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }

    /// First marked row strictly after `index`. Does not wrap.
    pub fn next_after(&self, label: &str, index: usize) -> Option<usize> {
        self.marks(label)?
            .range((Excluded(index), Unbounded))
            .next()
            .copied()
    }

    /// Last marked row strictly before `index`. Does not wrap.
    pub fn previous_before(&self, label: &str, index: usize) -> Option<usize> {
        self.marks(label)?.range(..index).next_back().copied()
    }

    /// Union of the marks of every segment label, ascending.
    pub fn segment_marks(&self) -> BTreeSet<usize> {
        self.tracks
            .values()
            .filter(|t| t.kind == LabelKind::Segment)
            .flat_map(|t| t.marks.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(rows: usize) -> LabelStore {
        LabelStore::new(rows, ["~".to_string()].into())
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut s = store(10);
        assert!(s.mark("N", 3).unwrap());
        assert!(!s.mark("N", 3).unwrap());
        assert_eq!(s.indices_of("N"), vec![3]);
    }

    #[test]
    fn test_unmark_absent_is_noop() {
        let mut s = store(10);
        assert!(!s.unmark("N", 3).unwrap());
        s.mark("N", 3).unwrap();
        assert!(s.unmark("N", 3).unwrap());
        assert!(s.indices_of("N").is_empty());
        assert!(s.contains_label("N"));
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut s = store(10);
        assert_eq!(s.toggle("N", 4).unwrap(), Toggle::Added);
        assert!(s.contains("N", 4));
        assert_eq!(s.toggle("N", 4).unwrap(), Toggle::Removed);
        assert!(!s.contains("N", 4));
    }

    #[test]
    fn test_out_of_range_leaves_store_unchanged() {
        let mut s = store(5);
        s.mark("N", 1).unwrap();
        let before = s.clone();
        assert_eq!(
            s.toggle("N", 5).unwrap_err(),
            LabelError::IndexOutOfRange { index: 5, len: 5 }
        );
        assert!(s.mark("V", 7).is_err());
        assert_eq!(s, before);
        assert!(!s.contains_label("V"));
    }

    #[test]
    fn test_declare_and_remove() {
        let mut s = store(5);
        s.declare("N").unwrap();
        assert_eq!(s.declare("N").unwrap_err(), LabelError::AlreadyDeclared("N".into()));
        assert_eq!(s.declare("").unwrap_err(), LabelError::EmptyName);
        assert_eq!(s.kind("N"), Some(LabelKind::Point));
        s.declare("~").unwrap();
        assert_eq!(s.kind("~"), Some(LabelKind::Segment));
        s.remove_label("N").unwrap();
        assert_eq!(s.remove_label("N").unwrap_err(), LabelError::Unknown("N".into()));
        assert_eq!(s.labels().collect::<Vec<_>>(), vec!["~"]);
    }

    #[test]
    fn test_labels_may_share_a_row() {
        let mut s = store(5);
        s.mark("N", 2).unwrap();
        s.mark("Artifact", 2).unwrap();
        assert_eq!(s.labels_at(2), vec!["Artifact", "N"]);
    }

    #[test]
    fn test_nearest_ties_go_low() {
        let mut s = store(20);
        for i in [2, 6, 12] {
            s.mark("N", i).unwrap();
        }
        assert_eq!(s.nearest("N", 4), Some(2));
        assert_eq!(s.nearest("N", 5), Some(6));
        assert_eq!(s.nearest("N", 9), Some(6));
        assert_eq!(s.nearest("N", 6), Some(6));
        assert_eq!(s.nearest("N", 0), Some(2));
        assert_eq!(s.nearest("N", 19), Some(12));
        assert_eq!(s.nearest("V", 4), None);
    }

    #[test]
    fn test_browse_stops_at_ends() {
        let mut s = store(20);
        for i in [2, 6, 12] {
            s.mark("N", i).unwrap();
        }
        assert_eq!(s.next_after("N", 2), Some(6));
        assert_eq!(s.next_after("N", 12), None);
        assert_eq!(s.previous_before("N", 6), Some(2));
        assert_eq!(s.previous_before("N", 2), None);
        assert_eq!(s.last("N"), Some(12));
        assert_eq!(s.count("N"), 3);
    }

    #[test]
    fn test_segment_marks_union() {
        let mut s = LabelStore::new(20, ["~".to_string(), "Noise".to_string()].into());
        s.mark("~", 4).unwrap();
        s.mark("Noise", 9).unwrap();
        s.mark("Noise", 4).unwrap();
        s.mark("N", 5).unwrap();
        assert_eq!(s.segment_marks().into_iter().collect::<Vec<_>>(), vec![4, 9]);
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_is_identity(
            initial in proptest::collection::btree_set(0usize..200, 0..30),
            index in 0usize..200,
        ) {
            let mut s = store(200);
            for &i in &initial {
                s.mark("N", i).unwrap();
            }
            let before = s.indices_of("N");
            s.toggle("N", index).unwrap();
            s.toggle("N", index).unwrap();
            prop_assert_eq!(s.indices_of("N"), before);
        }

        #[test]
        fn prop_mark_never_duplicates(
            marks in proptest::collection::vec(0usize..50, 0..100),
        ) {
            let mut s = store(50);
            for &i in &marks {
                s.mark("N", i).unwrap();
            }
            let indices = s.indices_of("N");
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            let unique: BTreeSet<usize> = marks.iter().copied().collect();
            prop_assert_eq!(indices.len(), unique.len());
        }

        #[test]
        fn prop_nearest_minimises_distance(
            marks in proptest::collection::btree_set(0usize..500, 1..40),
            index in 0usize..500,
        ) {
            let mut s = store(500);
            for &i in &marks {
                s.mark("N", i).unwrap();
            }
            let expected = marks
                .iter()
                .copied()
                .min_by_key(|&m| (m.abs_diff(index), m));
            prop_assert_eq!(s.nearest("N", index), expected);
        }
    }
}
