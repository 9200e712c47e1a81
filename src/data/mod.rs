/// Data layer: table model, loading, type inference, encoding, filtering.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  infer    │  numeric / categorical per column → ColumnCatalog
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  encode   │  selected columns → FeatureMatrix, LabelVector
///   └──────────┘
///
///   ┌──────────┐
///   │  filter   │  legend selections → per-row emphasis
///   └──────────┘
/// ```

pub mod encode;
pub mod filter;
pub mod infer;
pub mod loader;
pub mod model;
