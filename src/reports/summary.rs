/// Air quality summary aggregation.
///
/// Turns a window of measurements into three views:
/// 1. per-variable statistics (mean/max/min/sample count), worst first;
/// 2. per-station averages, limited to the highest-reading stations;
/// 3. a spatial heatmap binning those station averages onto a fixed grid.
///
/// Variables with zero samples in the window simply never appear — a mean
/// is only ever computed over a non-empty group.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::Measurement;

/// Grid cell edge length in degrees (~1 km scale, latitude dependent).
pub const HEATMAP_CELL_SIZE_DEG: f64 = 0.01;

/// Station averages are capped to the top entries by average value.
pub const MAX_HOTSPOT_STATIONS: usize = 200;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Statistics for one variable over the query window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSummary {
    pub variable_id: i64,
    pub name: String,
    pub unit: String,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub samples: usize,
}

/// Average reading at one station over the query window.
///
/// Coordinates are echoed as stored; stations with unparsable coordinates
/// stay in this list but are excluded from the heatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationAverage {
    pub station_id: i64,
    pub name: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub average: f64,
}

/// One heatmap cell: centroid of the contributing stations and the mean
/// of their averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// Complete summary report payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: Vec<VariableSummary>,
    pub hotspots: Vec<StationAverage>,
    pub heatmap: Vec<HeatmapCell>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

struct Accumulator {
    sum: f64,
    max: f64,
    min: f64,
    count: usize,
}

impl Accumulator {
    fn new(value: f64) -> Self {
        Self { sum: value, max: value, min: value, count: 1 }
    }

    fn push(&mut self, value: f64) {
        self.sum += value;
        self.max = self.max.max(value);
        self.min = self.min.min(value);
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Builds the full summary report from measurements in the query window.
/// An empty window yields empty lists.
pub fn build_summary(measurements: &[Measurement]) -> SummaryReport {
    let summary = variable_statistics(measurements);
    let hotspots = station_averages(measurements);
    let heatmap = bin_heatmap(&hotspots);
    SummaryReport { summary, hotspots, heatmap }
}

/// Per-variable statistics, ordered by descending mean.
fn variable_statistics(measurements: &[Measurement]) -> Vec<VariableSummary> {
    let mut by_variable: HashMap<i64, (String, String, Accumulator)> = HashMap::new();

    for m in measurements {
        by_variable
            .entry(m.variable_id)
            .and_modify(|(_, _, acc)| acc.push(m.value))
            .or_insert_with(|| {
                (m.variable_name.clone(), m.variable_unit.clone(), Accumulator::new(m.value))
            });
    }

    let mut stats: Vec<VariableSummary> = by_variable
        .into_iter()
        .map(|(variable_id, (name, unit, acc))| VariableSummary {
            variable_id,
            name,
            unit,
            mean: acc.mean(),
            max: acc.max,
            min: acc.min,
            samples: acc.count,
        })
        .collect();

    // Descending mean; variable id breaks ties so output is deterministic.
    stats.sort_by(|a, b| {
        b.mean
            .partial_cmp(&a.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.variable_id.cmp(&b.variable_id))
    });
    stats
}

/// Per-station averages, descending, capped at `MAX_HOTSPOT_STATIONS`.
fn station_averages(measurements: &[Measurement]) -> Vec<StationAverage> {
    let mut by_station: HashMap<i64, (Measurement, f64, usize)> = HashMap::new();

    for m in measurements {
        by_station
            .entry(m.station_id)
            .and_modify(|(_, sum, count)| {
                *sum += m.value;
                *count += 1;
            })
            .or_insert_with(|| (m.clone(), m.value, 1));
    }

    let mut averages: Vec<StationAverage> = by_station
        .into_iter()
        .map(|(station_id, (sample, sum, count))| StationAverage {
            station_id,
            name: sample.station_name,
            lat: sample.station_lat,
            lon: sample.station_lon,
            average: sum / count as f64,
        })
        .collect();

    averages.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.station_id.cmp(&b.station_id))
    });
    averages.truncate(MAX_HOTSPOT_STATIONS);
    averages
}

/// Bins station averages onto the grid. Cell membership is by nearest
/// multiple of the cell size; two stations closer than half a cell on
/// both axes always share a cell. Stations without parsable coordinates
/// are skipped here (they remain in the hotspot list).
fn bin_heatmap(stations: &[StationAverage]) -> Vec<HeatmapCell> {
    struct Cell {
        sum: f64,
        lat_sum: f64,
        lon_sum: f64,
        count: usize,
    }

    // BTreeMap keeps cell output order deterministic for identical input.
    let mut grid: BTreeMap<(i64, i64), Cell> = BTreeMap::new();

    for s in stations {
        let (lat, lon) = match (parse_coord(s.lat.as_deref()), parse_coord(s.lon.as_deref())) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };

        let key = (
            (lat / HEATMAP_CELL_SIZE_DEG).round() as i64,
            (lon / HEATMAP_CELL_SIZE_DEG).round() as i64,
        );

        let cell = grid.entry(key).or_insert(Cell { sum: 0.0, lat_sum: 0.0, lon_sum: 0.0, count: 0 });
        cell.sum += s.average;
        cell.lat_sum += lat;
        cell.lon_sum += lon;
        cell.count += 1;
    }

    grid.into_values()
        .map(|c| HeatmapCell {
            lat: c.lat_sum / c.count as f64,
            lon: c.lon_sum / c.count as f64,
            intensity: c.sum / c.count as f64,
        })
        .collect()
}

fn parse_coord(raw: Option<&str>) -> Option<f64> {
    let v: f64 = raw?.trim().parse().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn m(station_id: i64, variable_id: i64, value: f64, lat: &str, lon: &str) -> Measurement {
        Measurement {
            measured_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            value,
            sensor_id: station_id * 10,
            variable_id,
            variable_name: format!("VAR{}", variable_id),
            variable_unit: "ug/m3".to_string(),
            station_id,
            station_name: format!("Station {}", station_id),
            station_lat: Some(lat.to_string()),
            station_lon: Some(lon.to_string()),
        }
    }

    #[test]
    fn test_empty_window_yields_empty_report() {
        let report = build_summary(&[]);
        assert!(report.summary.is_empty());
        assert!(report.hotspots.is_empty());
        assert!(report.heatmap.is_empty());
    }

    #[test]
    fn test_sample_counts_sum_to_total_measurements() {
        let measurements = vec![
            m(1, 1, 10.0, "4.60", "-74.08"),
            m(1, 1, 20.0, "4.60", "-74.08"),
            m(2, 2, 5.0, "4.61", "-74.09"),
            m(2, 1, 30.0, "4.61", "-74.09"),
            m(3, 3, 1.0, "4.62", "-74.10"),
        ];
        let report = build_summary(&measurements);

        let total: usize = report.summary.iter().map(|v| v.samples).sum();
        assert_eq!(total, measurements.len(), "every measurement counts exactly once");
    }

    #[test]
    fn test_variable_statistics_and_descending_order() {
        let measurements = vec![
            m(1, 1, 10.0, "4.60", "-74.08"),
            m(1, 1, 30.0, "4.60", "-74.08"),
            m(2, 2, 50.0, "4.61", "-74.09"),
        ];
        let report = build_summary(&measurements);

        assert_eq!(report.summary.len(), 2);
        // Variable 2 (mean 50) sorts before variable 1 (mean 20).
        assert_eq!(report.summary[0].variable_id, 2);
        assert_eq!(report.summary[0].mean, 50.0);
        assert_eq!(report.summary[1].variable_id, 1);
        assert_eq!(report.summary[1].mean, 20.0);
        assert_eq!(report.summary[1].max, 30.0);
        assert_eq!(report.summary[1].min, 10.0);
        assert_eq!(report.summary[1].samples, 2);
    }

    #[test]
    fn test_station_averages_descend_and_truncate() {
        let mut measurements = Vec::new();
        for station in 1..=(MAX_HOTSPOT_STATIONS as i64 + 50) {
            measurements.push(m(station, 1, station as f64, "4.60", "-74.08"));
        }
        let report = build_summary(&measurements);

        assert_eq!(report.hotspots.len(), MAX_HOTSPOT_STATIONS);
        // The highest averages survive the cap.
        assert_eq!(report.hotspots[0].average, (MAX_HOTSPOT_STATIONS + 50) as f64);
        assert!(
            report.hotspots.windows(2).all(|w| w[0].average >= w[1].average),
            "hotspots must be ordered by descending average"
        );
    }

    #[test]
    fn test_nearby_stations_share_a_heatmap_cell() {
        // 0.004 degrees apart — less than half the 0.01 cell size, so both
        // round to the same grid cell.
        let measurements = vec![
            m(1, 1, 10.0, "4.600", "-74.080"),
            m(2, 1, 30.0, "4.604", "-74.082"),
        ];
        let report = build_summary(&measurements);

        assert_eq!(report.heatmap.len(), 1, "both stations must bin into one cell");
        let cell = &report.heatmap[0];
        assert!((cell.intensity - 20.0).abs() < 1e-9, "cell intensity is the mean of station averages");
        assert!((cell.lat - 4.602).abs() < 1e-9, "centroid latitude is the mean of contributors");
        assert!((cell.lon - -74.081).abs() < 1e-9);
    }

    #[test]
    fn test_distant_stations_get_separate_cells() {
        let measurements = vec![
            m(1, 1, 10.0, "4.60", "-74.08"),
            m(2, 1, 30.0, "4.70", "-74.20"),
        ];
        let report = build_summary(&measurements);
        assert_eq!(report.heatmap.len(), 2);
    }

    #[test]
    fn test_binning_is_deterministic() {
        let measurements = vec![
            m(1, 1, 10.0, "4.60", "-74.08"),
            m(2, 1, 30.0, "4.70", "-74.20"),
            m(3, 1, 20.0, "4.65", "-74.15"),
        ];
        let a = build_summary(&measurements).heatmap;
        let b = build_summary(&measurements).heatmap;
        assert_eq!(a, b, "identical input must produce identical cell lists");
    }

    #[test]
    fn test_unparsable_coordinates_skip_heatmap_but_keep_hotspot() {
        let mut bad = m(1, 1, 99.0, "4.60", "-74.08");
        bad.station_lat = Some("unknown".to_string());
        let measurements = vec![bad, m(2, 1, 10.0, "4.70", "-74.20")];
        let report = build_summary(&measurements);

        assert_eq!(report.hotspots.len(), 2, "station stays in the average list");
        assert_eq!(report.hotspots[0].station_id, 1);
        assert_eq!(report.heatmap.len(), 1, "only the parsable station is binned");
    }
}
