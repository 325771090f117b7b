/// Hourly trend series for one variable.
///
/// Measurements are bucketed by truncating their timestamp to the hour;
/// each bucket reports the mean of its values. Buckets with no
/// measurements are omitted rather than zero-filled, so consumers see
/// gaps as gaps.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Measurement;

/// One bucket of the series: the hour it starts at and the mean value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Ordered hourly series, ascending by bucket start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeries {
    pub series: Vec<TrendPoint>,
}

/// Truncates a timestamp to the start of its hour.
fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Builds the hourly series. The input is sorted ascending first — store
/// ordering is a convention, not a guarantee — then bucketed in a single
/// pass, so buckets come out in chronological order.
pub fn build_trend(measurements: &[Measurement]) -> TrendSeries {
    let mut points: Vec<(DateTime<Utc>, f64)> = measurements
        .iter()
        .map(|m| (m.measured_at, m.value))
        .collect();
    points.sort_by_key(|(ts, _)| *ts);

    let mut series: Vec<TrendPoint> = Vec::new();
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut current: Option<DateTime<Utc>> = None;

    for (ts, value) in points {
        let bucket = hour_bucket(ts);
        match current {
            Some(open) if open == bucket => {
                sum += value;
                count += 1;
            }
            Some(open) => {
                series.push(TrendPoint { time: open, value: sum / count as f64 });
                current = Some(bucket);
                sum = value;
                count = 1;
            }
            None => {
                current = Some(bucket);
                sum = value;
                count = 1;
            }
        }
    }

    if let Some(open) = current {
        series.push(TrendPoint { time: open, value: sum / count as f64 });
    }

    TrendSeries { series }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn m(ts: DateTime<Utc>, value: f64) -> Measurement {
        Measurement {
            measured_at: ts,
            value,
            sensor_id: 1,
            variable_id: 1,
            variable_name: "PM2.5".to_string(),
            variable_unit: "ug/m3".to_string(),
            station_id: 1,
            station_name: "Centro".to_string(),
            station_lat: Some("4.60".to_string()),
            station_lon: Some("-74.08".to_string()),
        }
    }

    fn at(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, min, 0).unwrap()
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        assert!(build_trend(&[]).series.is_empty());
    }

    #[test]
    fn test_measurements_in_same_hour_average_into_one_bucket() {
        let series = build_trend(&[m(at(10, 5), 10.0), m(at(10, 25), 20.0), m(at(10, 55), 30.0)]);
        assert_eq!(series.series.len(), 1);
        assert_eq!(series.series[0].time, at(10, 0));
        assert!((series.series[0].value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_buckets_are_strictly_ascending() {
        let series = build_trend(&[
            m(at(8, 30), 1.0),
            m(at(9, 10), 2.0),
            m(at(9, 50), 4.0),
            m(at(11, 0), 8.0),
        ]);
        let times: Vec<_> = series.series.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![at(8, 0), at(9, 0), at(11, 0)]);
        assert!(
            series.series.windows(2).all(|w| w[0].time < w[1].time),
            "bucket starts must strictly increase"
        );
    }

    #[test]
    fn test_empty_hours_are_omitted_not_zero_filled() {
        let series = build_trend(&[m(at(8, 0), 1.0), m(at(12, 0), 2.0)]);
        assert_eq!(series.series.len(), 2, "the 9-11h gap must not produce buckets");
    }

    #[test]
    fn test_unsorted_input_is_bucketed_chronologically() {
        // Deliberately out of order; the builder must not trust store order.
        let series = build_trend(&[m(at(11, 0), 8.0), m(at(9, 10), 2.0), m(at(9, 50), 4.0)]);
        assert_eq!(series.series[0].time, at(9, 0));
        assert!((series.series[0].value - 3.0).abs() < 1e-9);
        assert_eq!(series.series[1].time, at(11, 0));
    }
}
