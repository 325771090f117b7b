/// aqmon_service: air quality monitoring report service.
///
/// # Module structure
///
/// ```text
/// aqmon_service
/// ├── model       — shared data types (Measurement, Severity, ReportError, …)
/// ├── logging     — leveled console/file logger
/// ├── db          — Postgres connectivity and read-access validation
/// ├── store       — measurement / station metadata queries (read-only)
/// ├── thresholds  — severity threshold profiles with key normalization
/// ├── reports
/// │   ├── window         — lenient report time-window resolution
/// │   ├── summary        — per-variable statistics, hotspots, heatmap
/// │   ├── trends         — hourly bucket means for one variable
/// │   ├── alerts         — threshold / statistical alert evaluation
/// │   ├── projection     — linear least-squares projection
/// │   └── infrastructure — station infrastructure snapshot
/// └── endpoint    — JSON HTTP API over the report operations
/// ```

/// Public modules
pub mod db;
pub mod endpoint;
pub mod logging;
pub mod model;
pub mod reports;
pub mod store;
pub mod thresholds;
