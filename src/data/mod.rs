/// Data layer: core types, loading, reshaping, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (wide)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ reshape   │  melt year columns → ObservationTable (long)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date / country / indicator / temperature → indices
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐  ┌──────────┐  ┌──────────┐
///   │ aggregate │  │  stats    │  │  views    │
///   └──────────┘  └──────────┘  └──────────┘
///        ▲
///        │ region lookup
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod region;
pub mod reshape;
pub mod stats;
pub mod views;
