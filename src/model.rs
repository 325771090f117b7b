/// Core data types for the air quality reporting service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O — only types and the small amount of logic that belongs
/// with them (severity ordering, error display).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A single timestamped reading from a sensor, enriched with the variable
/// and station metadata joined in by the store layer.
///
/// Corresponds to one row of `measurement` joined against `sensor`,
/// `station`, and `variable`. The reporting core treats these as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub measured_at: DateTime<Utc>,
    pub value: f64,
    pub sensor_id: i64,
    pub variable_id: i64,
    pub variable_name: String,
    pub variable_unit: String,
    pub station_id: i64,
    pub station_name: String,
    /// Station coordinates as stored: free-form strings that may fail to
    /// parse as numbers. Heatmap binning skips unparsable coordinates;
    /// everything else keeps the station.
    pub station_lat: Option<String>,
    pub station_lon: Option<String>,
}

impl Measurement {
    /// Parses the station latitude, returning `None` for missing,
    /// non-numeric, or non-finite values.
    pub fn parsed_lat(&self) -> Option<f64> {
        parse_coordinate(self.station_lat.as_deref())
    }

    /// Parses the station longitude; same leniency as `parsed_lat`.
    pub fn parsed_lon(&self) -> Option<f64> {
        parse_coordinate(self.station_lon.as_deref())
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    let v: f64 = raw?.trim().parse().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Alert severity levels, in ascending order of severity.
///
/// `Statistical` is reserved for alerts produced by the statistical
/// fallback when no threshold profile is defined for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Statistical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
            Severity::Statistical => write!(f, "statistical"),
        }
    }
}

// ---------------------------------------------------------------------------
// Variable selection
// ---------------------------------------------------------------------------

/// How a report request identifies a variable: by numeric id, or by a
/// case-insensitive substring of the variable name.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSelector {
    Id(i64),
    NameContains(String),
}

impl VariableSelector {
    /// Numeric input selects by id; anything else becomes a substring match.
    pub fn parse(input: &str) -> VariableSelector {
        match input.trim().parse::<i64>() {
            Ok(id) => VariableSelector::Id(id),
            Err(_) => VariableSelector::NameContains(input.trim().to_lowercase()),
        }
    }

    /// Whether a measurement belongs to the selected variable.
    pub fn matches(&self, m: &Measurement) -> bool {
        match self {
            VariableSelector::Id(id) => m.variable_id == *id,
            VariableSelector::NameContains(needle) => {
                m.variable_name.to_lowercase().contains(needle)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while computing a report.
#[derive(Debug, PartialEq)]
pub enum ReportError {
    /// Malformed request input (bad variable selector, missing filter).
    InvalidInput(String),
    /// Not enough measurements for the requested computation. An expected
    /// outcome, not a system fault; carries the count that was available.
    InsufficientData { available: usize },
    /// The measurement store failed. Not retried here; the caller owns
    /// any retry policy.
    Store(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ReportError::InsufficientData { available } => {
                write!(f, "Not enough data to project (available: {})", available)
            }
            ReportError::Store(msg) => write!(f, "Measurement store error: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
