use std::collections::BTreeSet;

use super::error::LabelError;
use super::labels::{LabelStore, Toggle};

// ---------------------------------------------------------------------------
// Selection options
// ---------------------------------------------------------------------------

/// How a user-indicated row is turned into the row that gets annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub snap_enabled: bool,
    /// Half-width of the snapping neighbourhood, in rows.
    pub window: usize,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            snap_enabled: false,
            window: crate::config::DEFAULT_SNAP_WINDOW,
        }
    }
}

/// A completed annotation: the row that was toggled and what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub row: usize,
    pub toggle: Toggle,
}

// ---------------------------------------------------------------------------
// Point selection
// ---------------------------------------------------------------------------

/// Map a fractional row hint onto the signal and optionally snap it to the
/// local maximum within `window` rows on either side.
///
/// Returns `None` only for an empty signal.
pub fn select_point(signal: &[f64], raw_index_hint: f64, options: SelectOptions) -> Option<usize> {
    let hint = hint_to_row(signal.len(), raw_index_hint)?;
    if options.snap_enabled {
        Some(snap(signal, hint, options.window))
    } else {
        Some(hint)
    }
}

fn hint_to_row(len: usize, hint: f64) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if hint.is_nan() {
        return Some(0);
    }
    Some(hint.round().clamp(0.0, (len - 1) as f64) as usize)
}

fn is_strict_local_max(signal: &[f64], i: usize) -> bool {
    let v = signal[i];
    if !v.is_finite() {
        return false;
    }
    let left_ok = i == 0 || signal[i - 1] < v;
    let right_ok = i + 1 >= signal.len() || signal[i + 1] < v;
    left_ok && right_ok
}

/// Snap `hint` to the highest strict local maximum in `[hint - window, hint + window]`.
///
/// Ties between equal peaks go to the one closest to the hint, then the
/// lower row. Without any strict local maximum the hint is returned as-is.
pub fn snap(signal: &[f64], hint: usize, window: usize) -> usize {
    if signal.is_empty() || hint >= signal.len() {
        return hint;
    }
    let lo = hint.saturating_sub(window);
    let hi = hint.saturating_add(window).min(signal.len() - 1);

    let mut best: Option<usize> = None;
    for i in (lo..=hi).filter(|&i| is_strict_local_max(signal, i)) {
        best = match best {
            None => Some(i),
            Some(b) => {
                let better = signal[i] > signal[b]
                    || (signal[i] == signal[b] && i.abs_diff(hint) < b.abs_diff(hint));
                Some(if better { i } else { b })
            }
        };
    }

    match best {
        Some(row) => {
            log::debug!("Snapped row {hint} to local maximum at {row}");
            row
        }
        None => {
            log::debug!("No local maximum within {window} rows of {hint}; keeping hint");
            hint
        }
    }
}

/// Snap every seed row and return the distinct results in ascending order.
/// Seeds past the end of the signal are dropped.
pub fn snap_all(seeds: &[usize], signal: &[f64], window: usize) -> Vec<usize> {
    seeds
        .iter()
        .filter(|&&seed| seed < signal.len())
        .map(|&seed| snap(signal, seed, window))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Select a row from a hint and toggle `label` there.
///
/// Selection never mutates the store; the toggle is the only write.
pub fn annotate(
    store: &mut LabelStore,
    label: &str,
    signal: &[f64],
    raw_index_hint: f64,
    options: SelectOptions,
) -> Result<Option<Annotation>, LabelError> {
    let Some(row) = select_point(signal, raw_index_hint, options) else {
        return Ok(None);
    };
    let toggle = store.toggle(label, row)?;
    log::info!("{toggle:?} '{label}' at row {row}");
    Ok(Some(Annotation { row, toggle }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapping(window: usize) -> SelectOptions {
        SelectOptions {
            snap_enabled: true,
            window,
        }
    }

    #[test]
    fn test_select_point_snaps_to_peak() {
        let signal = [0.0, 1.0, 5.0, 2.0, 0.0];
        assert_eq!(select_point(&signal, 2.0, snapping(2)), Some(2));
        assert_eq!(select_point(&signal, 1.0, snapping(2)), Some(2));
        assert_eq!(select_point(&signal, 4.0, snapping(2)), Some(2));
    }

    #[test]
    fn test_select_point_without_snap_returns_hint() {
        let signal = [0.0, 1.0, 5.0, 2.0, 0.0];
        let options = SelectOptions {
            snap_enabled: false,
            window: 2,
        };
        assert_eq!(select_point(&signal, 2.0, options), Some(2));
        assert_eq!(select_point(&signal, 3.4, options), Some(3));
        assert_eq!(select_point(&signal, -7.0, options), Some(0));
        assert_eq!(select_point(&signal, 100.0, options), Some(4));
    }

    #[test]
    fn test_select_point_empty_signal() {
        assert_eq!(select_point(&[], 1.0, snapping(2)), None);
    }

    #[test]
    fn test_snap_without_local_max_keeps_hint() {
        let flat = [1.0; 10];
        assert_eq!(snap(&flat, 5, 3), 5);
    }

    #[test]
    fn test_snap_picks_highest_peak_in_window() {
        let signal = [0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0];
        assert_eq!(snap(&signal, 3, 3), 6);
        // The higher peak is out of reach with a narrower window.
        assert_eq!(snap(&signal, 3, 2), 1);
    }

    #[test]
    fn test_snap_equal_peaks_prefers_closest() {
        let signal = [0.0, 4.0, 0.0, 0.0, 0.0, 4.0, 0.0];
        assert_eq!(snap(&signal, 4, 3), 5);
        assert_eq!(snap(&signal, 3, 2), 1);
    }

    #[test]
    fn test_snap_ignores_nan() {
        let signal = [0.0, f64::NAN, 0.0, 2.0, 0.0];
        assert_eq!(snap(&signal, 1, 2), 3);
    }

    #[test]
    fn test_snap_all_dedups() {
        let signal = [0.0, 1.0, 5.0, 2.0, 0.0, 0.0, 3.0, 0.0];
        assert_eq!(snap_all(&[1, 3, 7, 40], &signal, 1), vec![2, 6]);
    }

    #[test]
    fn test_annotate_toggles_snapped_row() {
        let signal = [0.0, 1.0, 5.0, 2.0, 0.0];
        let mut store = LabelStore::new(signal.len(), BTreeSet::new());
        let first = annotate(&mut store, "N", &signal, 1.2, snapping(2)).unwrap();
        assert_eq!(
            first,
            Some(Annotation {
                row: 2,
                toggle: Toggle::Added
            })
        );
        assert_eq!(store.indices_of("N"), vec![2]);

        let second = annotate(&mut store, "N", &signal, 3.0, snapping(2)).unwrap();
        assert_eq!(second.map(|a| a.toggle), Some(Toggle::Removed));
        assert!(store.indices_of("N").is_empty());
    }
}
