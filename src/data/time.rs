use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TimeUnit – unit of an absolute time column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "ns")]
    Nanoseconds,
    #[serde(alias = "us")]
    Microseconds,
    #[serde(alias = "ms")]
    Milliseconds,
    #[serde(alias = "s")]
    Seconds,
}

impl TimeUnit {
    /// Multiplier converting one unit into seconds.
    pub fn factor(self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1e-9,
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Seconds => 1.0,
        }
    }

    /// Detect the unit from a bracketed header suffix such as `"timestamp [ms]"`.
    /// Headers without a recognised unit are taken to be in seconds.
    pub fn detect(header: &str) -> Self {
        let header = header.to_lowercase();
        if header.contains("[ns]") {
            TimeUnit::Nanoseconds
        } else if header.contains("[us]") || header.contains("[µs]") {
            TimeUnit::Microseconds
        } else if header.contains("[ms]") {
            TimeUnit::Milliseconds
        } else {
            TimeUnit::Seconds
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSeries – seconds from the first sample
// ---------------------------------------------------------------------------

/// Normalised time axis, aligned 1:1 with table rows.
///
/// Not validated for monotonicity: the recording is taken as-is and a
/// backwards step shows up later as a flagged interval.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    seconds: Vec<f64>,
}

impl TimeSeries {
    pub fn values(&self) -> &[f64] {
        &self.seconds
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}

/// Subtract the first value and scale by `unit_factor` (source unit → seconds).
pub fn normalize(values: &[f64], unit_factor: f64) -> TimeSeries {
    let Some(&start) = values.first() else {
        return TimeSeries::default();
    };
    TimeSeries {
        seconds: values.iter().map(|&v| (v - start) * unit_factor).collect(),
    }
}

// ---------------------------------------------------------------------------
// TimeDomain – what callers use as the x coordinate
// ---------------------------------------------------------------------------

/// The x domain of a recording: normalised seconds when the table has a time
/// axis, otherwise the row index itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeDomain {
    Seconds(TimeSeries),
    RowIndex(usize),
}

impl TimeDomain {
    pub fn len(&self) -> usize {
        match self {
            TimeDomain::Seconds(series) => series.len(),
            TimeDomain::RowIndex(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_row_index(&self) -> bool {
        matches!(self, TimeDomain::RowIndex(_))
    }

    /// X coordinate of a row, `None` past the end.
    pub fn x_at(&self, row: usize) -> Option<f64> {
        match self {
            TimeDomain::Seconds(series) => series.values().get(row).copied(),
            TimeDomain::RowIndex(len) => (row < *len).then_some(row as f64),
        }
    }

    /// Materialised x values for plotting.
    pub fn values(&self) -> Vec<f64> {
        match self {
            TimeDomain::Seconds(series) => series.values().to_vec(),
            TimeDomain::RowIndex(len) => (0..*len).map(|i| i as f64).collect(),
        }
    }

    /// Row whose x coordinate is closest to `x`; ties go to the lower row.
    ///
    /// Uses a binary search, which assumes the time axis is non-decreasing.
    /// On a non-monotonic axis the result is a nearby row, not necessarily
    /// the global nearest.
    pub fn row_near(&self, x: f64) -> Option<usize> {
        match self {
            TimeDomain::RowIndex(0) => None,
            TimeDomain::RowIndex(len) => {
                let clamped = x.round().clamp(0.0, (*len - 1) as f64);
                Some(clamped as usize)
            }
            TimeDomain::Seconds(series) => {
                let values = series.values();
                if values.is_empty() {
                    return None;
                }
                let upper = values.partition_point(|&v| v < x);
                if upper == 0 {
                    return Some(0);
                }
                if upper == values.len() {
                    return Some(values.len() - 1);
                }
                let lower = upper - 1;
                if (x - values[lower]).abs() <= (values[upper] - x).abs() {
                    Some(lower)
                } else {
                    Some(upper)
                }
            }
        }
    }
}
