/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + validate rows → Dataset   (cache: one Arc per file)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  origin / destination / date window → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  routes, price trend, weekday demand → DashboardReport
///   └───────────┘
///        │
///        ▼
///     export       filtered rows → .csv, report → .json
/// ```

pub mod aggregate;
pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
