use std::collections::BTreeSet;

use super::labels::LabelStore;
use super::suppression::SuppressionMask;
use super::time::TimeDomain;

/// Successive differences averaged by [`IntervalReport::variability`] by default.
pub const DEFAULT_VARIABILITY_WINDOW: usize = 4;

/// Normalised detrended drop that opens a premature-beat pattern.
pub const DEFAULT_DROP_THRESHOLD: f64 = -0.15;
/// Normalised rise that must follow the drop.
pub const DEFAULT_RISE_THRESHOLD: f64 = 0.25;

const BASELINE_LEN: usize = 7;
const BASELINE_TAU: f64 = 4.0;

// ---------------------------------------------------------------------------
// IntervalRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalQuality {
    Valid,
    /// Interval ≤ 0 or undefined, typically from a non-monotonic time axis.
    /// No rate is reported.
    NonPositive,
}

/// Interval between a beat and the beat before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalRecord {
    /// Row of the beat closing the interval.
    pub index: usize,
    /// Row of the preceding beat.
    pub previous_index: usize,
    /// Time of the beat at `index`, in the x domain of the recording.
    pub timestamp: f64,
    pub interval: f64,
    /// Beats per minute, `None` unless the interval is positive.
    pub rate: Option<f64>,
    pub quality: IntervalQuality,
}

impl IntervalRecord {
    pub fn is_valid(&self) -> bool {
        self.quality == IntervalQuality::Valid
    }
}

/// Output of [`derive`]: surviving beat pairs plus the heartbeat classes
/// that had no label in the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalReport {
    pub records: Vec<IntervalRecord>,
    pub unresolved_labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// derive
// ---------------------------------------------------------------------------

/// Compute beat intervals and instantaneous rate.
///
/// Marks of all resolvable `heartbeat_labels` are merged (a row marked by two
/// classes counts once) and walked pairwise. A pair is dropped when any row
/// from one beat to the next is suppressed, so intervals never bridge a
/// suppressed stretch even when no beat was marked inside it.
/// Fewer than two surviving beats yield no records.
pub fn derive<'a>(
    store: &LabelStore,
    heartbeat_labels: impl IntoIterator<Item = &'a str>,
    suppression: &SuppressionMask,
    time: &TimeDomain,
) -> IntervalReport {
    let mut beats = BTreeSet::new();
    let mut unresolved = Vec::new();

    for label in heartbeat_labels {
        match store.marks(label) {
            Some(marks) => beats.extend(marks.iter().copied()),
            None => {
                log::warn!("Heartbeat class '{label}' has no label in this recording");
                unresolved.push(label.to_string());
            }
        }
    }

    let beats: Vec<usize> = beats.into_iter().collect();
    let mut records = Vec::with_capacity(beats.len().saturating_sub(1));

    for pair in beats.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if suppression.intersects(prev, curr) {
            continue;
        }
        let (Some(t_prev), Some(t_curr)) = (time.x_at(prev), time.x_at(curr)) else {
            continue;
        };

        let interval = t_curr - t_prev;
        let record = if interval > 0.0 {
            IntervalRecord {
                index: curr,
                previous_index: prev,
                timestamp: t_curr,
                interval,
                rate: Some(60.0 / interval),
                quality: IntervalQuality::Valid,
            }
        } else {
            log::warn!("Non-positive interval {interval} between rows {prev} and {curr}");
            IntervalRecord {
                index: curr,
                previous_index: prev,
                timestamp: t_curr,
                interval,
                rate: None,
                quality: IntervalQuality::NonPositive,
            }
        };
        records.push(record);
    }

    IntervalReport {
        records,
        unresolved_labels: unresolved,
    }
}

// ---------------------------------------------------------------------------
// Report summaries
// ---------------------------------------------------------------------------

impl IntervalReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn valid(&self) -> impl Iterator<Item = &IntervalRecord> {
        self.records.iter().filter(|r| r.is_valid())
    }

    /// `[timestamp, rate]` points of the valid records.
    pub fn rate_points(&self) -> Vec<[f64; 2]> {
        self.valid()
            .filter_map(|r| r.rate.map(|rate| [r.timestamp, rate]))
            .collect()
    }

    /// `[timestamp, interval in ms]` points of the valid records.
    pub fn interval_points(&self) -> Vec<[f64; 2]> {
        self.valid()
            .map(|r| [r.timestamp, r.interval * 1000.0])
            .collect()
    }

    /// Mean instantaneous rate over valid records.
    pub fn mean_rate(&self) -> Option<f64> {
        let rates: Vec<f64> = self.valid().filter_map(|r| r.rate).collect();
        if rates.is_empty() {
            None
        } else {
            Some(rates.iter().sum::<f64>() / rates.len() as f64)
        }
    }

    /// Rolling RMSSD in milliseconds, aligned with `records`.
    ///
    /// For each record, the root mean square of the last `window` successive
    /// interval differences ending at that record. Differences are only taken
    /// between valid records that share a beat, so a dropped or flagged pair
    /// restarts the run. `None` where no difference is available yet.
    pub fn variability(&self, window: usize) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.records.len());
        let mut diffs: Vec<f64> = Vec::new();
        let mut prev: Option<&IntervalRecord> = None;

        for record in &self.records {
            let chained = prev.is_some_and(|p| {
                p.is_valid() && record.is_valid() && p.index == record.previous_index
            });
            if chained {
                if let Some(p) = prev {
                    diffs.push((record.interval - p.interval) * 1000.0);
                }
            } else {
                diffs.clear();
            }

            let tail = &diffs[diffs.len().saturating_sub(window)..];
            out.push(if tail.is_empty() || window == 0 {
                None
            } else {
                let mean_sq = tail.iter().map(|d| d * d).sum::<f64>() / tail.len() as f64;
                Some(mean_sq.sqrt())
            });
            prev = Some(record);
        }
        out
    }

    /// Beat rows where the interval series shows a premature-beat pattern: a
    /// short interval immediately followed by a long one.
    ///
    /// Valid intervals are detrended against a symmetric exponential moving
    /// average, differenced, and scaled so the largest absolute difference is
    /// 1. Record `i` is flagged when its scaled difference is at most
    /// `drop_threshold` and the next one is at least `rise_threshold`. This is
    /// a screening aid for review, not a rhythm classifier.
    pub fn anomalies(&self, drop_threshold: f64, rise_threshold: f64) -> Vec<usize> {
        let valid: Vec<&IntervalRecord> = self.valid().collect();
        let intervals: Vec<f64> = valid.iter().map(|r| r.interval).collect();
        let baseline = symmetric_ema(&intervals, BASELINE_LEN, BASELINE_TAU);

        let detrended: Vec<f64> = intervals
            .iter()
            .zip(&baseline)
            .map(|(x, b)| x - b)
            .collect();
        let mut diffs = vec![0.0; detrended.len()];
        for i in 1..detrended.len() {
            diffs[i] = detrended[i] - detrended[i - 1];
        }

        let scale = diffs.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        if scale < 1e-12 {
            return Vec::new();
        }
        diffs
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] / scale <= drop_threshold && w[1] / scale >= rise_threshold)
            .map(|(i, _)| valid[i].index)
            .collect()
    }
}

/// Centred moving average with weights `exp(-|k| / tau)`. Near the ends the
/// weights are renormalised over the samples that exist.
fn symmetric_ema(values: &[f64], len: usize, tau: f64) -> Vec<f64> {
    let half = (len / 2) as isize;
    (0..values.len() as isize)
        .map(|i| {
            let (sum, weight) = (-half..=half)
                .filter_map(|k| {
                    let j = usize::try_from(i + k).ok()?;
                    let x = values.get(j)?;
                    let w = (-(k.abs() as f64) / tau).exp();
                    Some((w * x, w))
                })
                .fold((0.0, 0.0), |(s, t), (wx, w)| (s + wx, t + w));
            sum / weight
        })
        .collect()
}
