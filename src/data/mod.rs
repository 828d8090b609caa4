/// Data layer: raw table, classification, annotation and derived intervals.
///
/// Architecture:
/// ```text
///  .csv / .txt / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌──────┐
///   │ classify  │ ──▶ │ time │  time axis → seconds from start
///   └──────────┘     └──────┘
///        │
///        ▼
///   ┌────────────────┐   annotate (select → toggle)
///   │ TabularDataStore│ ◀──────────────────────────
///   │   + LabelStore  │
///   └────────────────┘
///        │
///        ▼
///   ┌─────────────┐   ┌───────────┐
///   │ suppression  │ ─▶│ intervals │  beat pairs → interval / rate
///   └─────────────┘   └───────────┘
/// ```

pub mod annotate;
pub mod classify;
pub mod error;
pub mod intervals;
pub mod labels;
pub mod loader;
pub mod store;
pub mod suppression;
pub mod table;
pub mod time;
pub mod writer;
