/// Alert evaluation over a window of measurements.
///
/// Two modes, chosen by threshold profile resolution:
///
/// - **threshold mode** — a profile exists for the variable key; every
///   measurement is classified against the {info, warning, critical}
///   cutoffs (highest tier first, first match wins) and sub-info values
///   produce no alert.
/// - **statistical mode** — no profile; the anomaly bound is
///   mean + 2·stdev over all matched values, using the population
///   standard deviation (divide by n). Values strictly above the bound
///   are flagged with severity `statistical`.
///
/// The report always carries the mode and the numeric thresholds applied
/// so alert lists can be audited after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Measurement, Severity};
use crate::thresholds::{ThresholdProfile, ThresholdRegistry};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    Thresholds,
    Statistical,
}

/// One flagged measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub datetime: DateTime<Utc>,
    pub value: f64,
    pub station: String,
    pub severity: Severity,
}

/// Alert report payload: which mode ran, which bounds applied, and the
/// flagged measurements in ascending time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertReport {
    pub mode: AlertMode,
    /// Cutoffs applied in threshold mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdProfile>,
    /// Anomaly bound applied in statistical mode. `None` when the window
    /// held no values (no statistics were computed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub alerts: Vec<AlertEvent>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluates alerts for a window of measurements already filtered to one
/// variable. `variable_key` is the raw selector string used for threshold
/// profile resolution; with no key (or no matching profile) evaluation
/// falls back to the statistical mode.
pub fn evaluate(
    measurements: &[Measurement],
    variable_key: Option<&str>,
    registry: &ThresholdRegistry,
) -> AlertReport {
    let mut ordered: Vec<&Measurement> = measurements.iter().collect();
    ordered.sort_by_key(|m| m.measured_at);

    if let Some(profile) = variable_key.and_then(|key| registry.resolve(key)) {
        return threshold_mode(&ordered, profile);
    }
    statistical_mode(&ordered)
}

fn threshold_mode(ordered: &[&Measurement], profile: &ThresholdProfile) -> AlertReport {
    let alerts = ordered
        .iter()
        .filter_map(|m| {
            profile.classify(m.value).map(|severity| AlertEvent {
                datetime: m.measured_at,
                value: m.value,
                station: m.station_name.clone(),
                severity,
            })
        })
        .collect();

    AlertReport {
        mode: AlertMode::Thresholds,
        thresholds: Some(*profile),
        threshold: None,
        alerts,
    }
}

fn statistical_mode(ordered: &[&Measurement]) -> AlertReport {
    // Zero matched values: no statistics, empty list.
    if ordered.is_empty() {
        return AlertReport {
            mode: AlertMode::Statistical,
            thresholds: None,
            threshold: None,
            alerts: Vec::new(),
        };
    }

    let values: Vec<f64> = ordered.iter().map(|m| m.value).collect();
    let (mean, stdev) = population_stats(&values);
    let bound = mean + 2.0 * stdev;

    let alerts = ordered
        .iter()
        .filter(|m| m.value > bound)
        .map(|m| AlertEvent {
            datetime: m.measured_at,
            value: m.value,
            station: m.station_name.clone(),
            severity: Severity::Statistical,
        })
        .collect();

    AlertReport {
        mode: AlertMode::Statistical,
        thresholds: None,
        threshold: Some(bound),
        alerts,
    }
}

/// Population mean and standard deviation (divide by n, not n−1). A single
/// value has zero deviation by definition.
fn population_stats(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
