//! End-to-end report pipeline tests on synthetic measurement data.
//!
//! These exercise the full pure path a request takes after the store
//! query: window resolution, variable filtering, then each report
//! computation. No database required.

use chrono::{DateTime, Duration, TimeZone, Utc};

use aqmon_service::model::{Measurement, VariableSelector};
use aqmon_service::reports::{alerts, projection, summary, trends, window};
use aqmon_service::thresholds::ThresholdRegistry;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn measurement(
    offset_mins: i64,
    value: f64,
    station_id: i64,
    variable_id: i64,
    variable_name: &str,
) -> Measurement {
    Measurement {
        measured_at: t0() + Duration::minutes(offset_mins),
        value,
        sensor_id: station_id * 100 + variable_id,
        variable_id,
        variable_name: variable_name.to_string(),
        variable_unit: "ug/m3".to_string(),
        station_id,
        station_name: format!("Station {}", station_id),
        station_lat: Some(format!("{:.3}", 4.6 + station_id as f64 * 0.05)),
        station_lon: Some("-74.080".to_string()),
    }
}

/// A day of readings: two stations, PM2.5 and O3, one PM2.5 spike.
fn city_day() -> Vec<Measurement> {
    let mut out = Vec::new();
    for hour in 0..24i64 {
        out.push(measurement(hour * 60, 18.0 + (hour % 3) as f64, 1, 1, "PM2.5"));
        out.push(measurement(hour * 60 + 10, 15.0, 2, 1, "PM2.5"));
        out.push(measurement(hour * 60 + 20, 60.0, 1, 2, "O3"));
    }
    // Afternoon spike at station 1 crosses the PM2.5 critical cutoff (55).
    out.push(measurement(15 * 60 + 30, 58.0, 1, 1, "PM2.5"));
    out
}

#[test]
fn summary_accounts_for_every_measurement_in_the_window() {
    let data = city_day();
    let report = summary::build_summary(&data);

    let counted: usize = report.summary.iter().map(|v| v.samples).sum();
    assert_eq!(counted, data.len());

    // Two variables, two stations.
    assert_eq!(report.summary.len(), 2);
    assert_eq!(report.hotspots.len(), 2);
    // O3 runs hotter than PM2.5 and sorts first.
    assert_eq!(report.summary[0].name, "O3");
}

#[test]
fn stations_fifty_meters_apart_share_a_heatmap_cell() {
    let mut a = measurement(0, 10.0, 1, 1, "PM2.5");
    let mut b = measurement(5, 30.0, 2, 1, "PM2.5");
    a.station_lat = Some("4.6000".to_string());
    b.station_lat = Some("4.6004".to_string());
    b.station_lon = a.station_lon.clone();

    let report = summary::build_summary(&[a, b]);
    assert_eq!(report.heatmap.len(), 1);
    assert!((report.heatmap[0].intensity - 20.0).abs() < 1e-9);
}

#[test]
fn trend_series_follows_the_variable_filter() {
    let data = city_day();
    let selector = VariableSelector::parse("pm2");
    let filtered: Vec<Measurement> = data.into_iter().filter(|m| selector.matches(m)).collect();

    let series = trends::build_trend(&filtered);
    assert_eq!(series.series.len(), 24, "one bucket per hour with data");
    assert!(
        series.series.windows(2).all(|w| w[0].time < w[1].time),
        "buckets must be chronological"
    );
    // Hour 15 includes the spike: (18 + 15 + 58) / 3.
    let hour15 = series
        .series
        .iter()
        .find(|p| p.time == t0() + Duration::hours(15))
        .expect("hour 15 bucket should exist");
    assert!((hour15.value - 91.0 / 3.0).abs() < 1e-9);
}

#[test]
fn alert_pipeline_flags_the_spike_in_threshold_mode() {
    let data = city_day();
    let selector = VariableSelector::parse("PM2.5");
    let filtered: Vec<Measurement> = data.into_iter().filter(|m| selector.matches(m)).collect();

    let registry = ThresholdRegistry::builtin();
    let report = alerts::evaluate(&filtered, Some("PM2.5"), &registry);

    assert_eq!(report.mode, alerts::AlertMode::Thresholds);
    let critical: Vec<_> = report
        .alerts
        .iter()
        .filter(|a| a.severity == aqmon_service::model::Severity::Critical)
        .collect();
    assert_eq!(critical.len(), 1, "only the 58.0 spike is critical");
    assert_eq!(critical[0].value, 58.0);
    assert_eq!(critical[0].station, "Station 1");
    // Baseline PM2.5 values (15-20) all sit in the info band (>= 12).
    assert!(report.alerts.len() > 1);
}

#[test]
fn alert_pipeline_uses_statistics_for_unknown_variables() {
    let mut data: Vec<Measurement> = (0..20).map(|i| measurement(i * 5, 10.0, 1, 9, "Ruido")).collect();
    data.push(measurement(200, 100.0, 1, 9, "Ruido"));

    let registry = ThresholdRegistry::builtin();
    let report = alerts::evaluate(&data, Some("Ruido"), &registry);

    assert_eq!(report.mode, alerts::AlertMode::Statistical);
    let bound = report.threshold.expect("bound should be computed");
    assert!(bound > 10.0 && bound < 100.0);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].value, 100.0);
}

#[test]
fn projection_continues_a_rising_trend() {
    // Steady rise: 0.5 units per hour over two days.
    let data: Vec<Measurement> = (0..48)
        .map(|h| measurement(h * 60, 10.0 + 0.5 * h as f64, 1, 1, "PM2.5"))
        .collect();

    let report = projection::build_projection(&data, 24, 24).expect("enough data to fit");
    assert!(report.slope > 0.0, "rising data must fit a positive slope");
    assert_eq!(report.projection.len(), 24);

    // Projected values keep climbing past the last observation.
    let last_observed = 10.0 + 0.5 * 47.0;
    assert!(report.projection[0].value > last_observed);
    assert!(
        report.projection.windows(2).all(|w| w[1].value > w[0].value),
        "a positive slope projects a monotonic series"
    );
}

#[test]
fn projection_reports_available_count_when_data_is_thin() {
    let data = vec![
        measurement(0, 1.0, 1, 1, "PM2.5"),
        measurement(60, 2.0, 1, 1, "PM2.5"),
    ];
    let err = projection::build_projection(&data, 24, 24).unwrap_err();
    assert_eq!(
        err,
        aqmon_service::model::ReportError::InsufficientData { available: 2 }
    );
}

#[test]
fn default_window_covers_exactly_the_trailing_day() {
    let now = t0() + Duration::days(10);
    let w = window::resolve(None, None, now);
    let data: Vec<Measurement> = city_day();

    // All of city_day sits 10 days before `now`, outside the default window.
    let in_window: Vec<&Measurement> = data
        .iter()
        .filter(|m| m.measured_at >= w.start && m.measured_at < w.end)
        .collect();
    assert!(in_window.is_empty());

    let report = summary::build_summary(&[]);
    assert!(report.summary.is_empty(), "empty window is a result, not an error");
}
