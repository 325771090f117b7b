/// Threshold profiles for alert severity classification.
///
/// A threshold profile is a set of {info, warning, critical} cutoffs for one
/// variable, keyed by variable name. The built-in table covers the common
/// air quality variables; an optional `thresholds.toml` in the working
/// directory merges over it, so cutoffs can be tuned without recompiling
/// the service.
///
/// Lookups try an explicit ordered list of key normalization strategies
/// (exact, strip-spaces-uppercase, uppercase). The order is part of the
/// contract: "pm 2.5" resolves through the strip-spaces strategy before a
/// plain uppercase of the raw key is ever attempted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::model::Severity;

// ---------------------------------------------------------------------------
// Profile type
// ---------------------------------------------------------------------------

/// Severity cutoffs for one variable. Units follow the variable's unit.
///
/// Expected ordering: info <= warning <= critical. Classification assumes
/// this ordering; `ThresholdRegistry::validate` reports violations rather
/// than reordering them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub info: f64,
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdProfile {
    /// Classifies a value against this profile, checking critical, then
    /// warning, then info — first cutoff met or exceeded wins. Values below
    /// the info cutoff produce no severity.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value >= self.critical {
            Some(Severity::Critical)
        } else if value >= self.warning {
            Some(Severity::Warning)
        } else if value >= self.info {
            Some(Severity::Info)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Built-in threshold table. Keys match `variable.v_name` values; the PM2.5
/// entry is duplicated under its no-dot spelling because both appear in
/// station metadata.
const BUILTIN_PROFILES: &[(&str, ThresholdProfile)] = &[
    ("PM2.5", ThresholdProfile { info: 12.0, warning: 35.0, critical: 55.0 }),
    ("PM25", ThresholdProfile { info: 12.0, warning: 35.0, critical: 55.0 }),
    ("PM10", ThresholdProfile { info: 20.0, warning: 50.0, critical: 150.0 }),
    ("O3", ThresholdProfile { info: 70.0, warning: 120.0, critical: 180.0 }),
    ("NO2", ThresholdProfile { info: 40.0, warning: 100.0, critical: 200.0 }),
    ("SO2", ThresholdProfile { info: 20.0, warning: 80.0, critical: 200.0 }),
    // CO in mg/m3
    ("CO", ThresholdProfile { info: 4.0, warning: 10.0, critical: 30.0 }),
];

/// Key normalization strategies, tried in order during lookup.
fn normalizations(key: &str) -> [String; 3] {
    [
        key.to_string(),
        key.replace(' ', "").to_uppercase(),
        key.to_uppercase(),
    ]
}

/// A profile whose cutoffs are not in ascending order. Classification
/// behavior is undefined for such a profile, so loading surfaces these
/// instead of silently fixing them.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingViolation {
    pub key: String,
    pub profile: ThresholdProfile,
}

impl std::fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "threshold profile '{}' violates info <= warning <= critical ({} / {} / {})",
            self.key, self.profile.info, self.profile.warning, self.profile.critical
        )
    }
}

/// Lookup table of threshold profiles keyed by variable name.
#[derive(Debug, Clone)]
pub struct ThresholdRegistry {
    profiles: HashMap<String, ThresholdProfile>,
}

/// Root structure of thresholds.toml:
///
/// ```toml
/// [profiles."PM2.5"]
/// info = 12.0
/// warning = 35.0
/// critical = 55.0
/// ```
#[derive(Debug, Deserialize)]
struct ThresholdFile {
    profiles: HashMap<String, ThresholdProfile>,
}

impl ThresholdRegistry {
    /// Registry holding only the built-in table.
    pub fn builtin() -> Self {
        let profiles = BUILTIN_PROFILES
            .iter()
            .map(|(k, p)| (k.to_string(), *p))
            .collect();
        Self { profiles }
    }

    /// Built-in table with `thresholds.toml` merged over it, when the file
    /// exists. A missing file is normal; a malformed file is an error so
    /// that a bad deploy does not silently run with default cutoffs.
    pub fn load(path: &str) -> Result<Self, String> {
        let mut registry = Self::builtin();
        if !Path::new(path).exists() {
            return Ok(registry);
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        let file: ThresholdFile = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path, e))?;
        registry.profiles.extend(file.profiles);
        Ok(registry)
    }

    /// Resolves a profile for a variable key, trying each normalization
    /// strategy in order and returning the first hit.
    pub fn resolve(&self, key: &str) -> Option<&ThresholdProfile> {
        normalizations(key)
            .iter()
            .find_map(|candidate| self.profiles.get(candidate))
    }

    /// Returns every profile whose cutoffs are not ascending. Called at
    /// startup so misordered overrides are visible in the log.
    pub fn validate(&self) -> Vec<OrderingViolation> {
        let mut violations: Vec<OrderingViolation> = self
            .profiles
            .iter()
            .filter(|(_, p)| !(p.info <= p.warning && p.warning <= p.critical))
            .map(|(k, p)| OrderingViolation { key: k.clone(), profile: *p })
            .collect();
        violations.sort_by(|a, b| a.key.cmp(&b.key));
        violations
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
