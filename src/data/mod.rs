/// Data layer: core types, loading, resampling and aggregation.
///
/// Architecture:
/// ```text
///  *_<label>_*.tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Recording (ids + raw traces)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resample  │  trailing-zero trimming, linear interpolation → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  per-cell curves, mean + variability band
///   └───────────┘
/// ```

pub mod aggregate;
pub mod loader;
pub mod model;
pub mod resample;
