/// Linear projection of a variable's recent trend.
///
/// Fits an ordinary-least-squares line over (elapsed seconds, value)
/// pairs from the trailing window, then extrapolates evenly spaced
/// future points across the requested horizon. Closed-form normal
/// equations — no iterative solver needed at this scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Measurement, ReportError};

/// Minimum sample count for a meaningful fit.
pub const MIN_SAMPLES: usize = 3;

/// One extrapolated future sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Projection report payload: the fitted line and the future samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub slope: f64,
    pub intercept: f64,
    pub projection: Vec<ProjectedPoint>,
}

/// Fitted line parameters over (x, y) pairs.
///
/// A degenerate fit — all x identical, denominator exactly zero — yields
/// slope 0 and intercept mean(y) instead of an error.
fn fit_line(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    let slope = if denom == 0.0 {
        0.0
    } else {
        (n * sum_xy - sum_x * sum_y) / denom
    };
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Projects `points` future samples across the next `hours` hours from
/// the trailing-window measurements.
///
/// Fails with `InsufficientData` below `MIN_SAMPLES` measurements. Future
/// samples start one step after the last observation; the step is the
/// horizon divided by the point count.
pub fn build_projection(
    measurements: &[Measurement],
    hours: i64,
    points: i64,
) -> Result<ProjectionReport, ReportError> {
    let mut ordered: Vec<&Measurement> = measurements.iter().collect();
    ordered.sort_by_key(|m| m.measured_at);

    if ordered.len() < MIN_SAMPLES {
        return Err(ReportError::InsufficientData { available: ordered.len() });
    }

    let t0 = ordered[0].measured_at;
    let xs: Vec<f64> = ordered
        .iter()
        .map(|m| elapsed_seconds(t0, m.measured_at))
        .collect();
    let ys: Vec<f64> = ordered.iter().map(|m| m.value).collect();

    let (slope, intercept) = fit_line(&xs, &ys);

    let points = points.max(1);
    let last = ordered[ordered.len() - 1].measured_at;
    let step_secs = (hours as f64 * 3600.0) / points as f64;

    let mut projection = Vec::with_capacity(points as usize);
    for i in 1..=points {
        let offset_secs = i as f64 * step_secs;
        let time = last + chrono::Duration::milliseconds((offset_secs * 1000.0) as i64);
        let x = elapsed_seconds(t0, time);
        projection.push(ProjectedPoint { time, value: intercept + slope * x });
    }

    Ok(ProjectionReport { slope, intercept, projection })
}

/// Seconds from `t0` to `ts`, with sub-second precision.
fn elapsed_seconds(t0: DateTime<Utc>, ts: DateTime<Utc>) -> f64 {
    (ts - t0).num_milliseconds() as f64 / 1000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
