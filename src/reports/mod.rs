/// Report computation for the air quality service.
///
/// Each submodule computes one report from a slice of measurements already
/// fetched by the store layer. The computations are pure — no I/O, no
/// shared state — so every report request is independent and the modules
/// are directly testable on synthetic data.
///
/// Submodules:
/// - `window`         — lenient report time-window resolution.
/// - `summary`        — per-variable statistics, station averages, heatmap.
/// - `trends`         — hourly bucket means for one variable.
/// - `alerts`         — threshold / statistical severity classification.
/// - `projection`     — linear least-squares projection of recent values.
/// - `infrastructure` — station infrastructure snapshot.

pub mod alerts;
pub mod infrastructure;
pub mod projection;
pub mod summary;
pub mod trends;
pub mod window;
