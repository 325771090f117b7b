/// Station infrastructure snapshot.
///
/// Reports every registered station with its calibration and maintenance
/// metadata and the timestamp of its most recent measurement, so operators
/// can spot silent stations and overdue maintenance from one payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StationInfrastructureRow;

/// One station in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationStatus {
    pub station_id: i64,
    pub name: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub calibration_certificate: Option<String>,
    pub maintenance_date: Option<DateTime<Utc>>,
    /// `None` when the station has never reported a measurement.
    pub last_measurement: Option<DateTime<Utc>>,
}

/// Infrastructure report payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureReport {
    pub stations: Vec<StationStatus>,
}

/// Assembles the snapshot from store rows.
pub fn build_infrastructure(rows: Vec<StationInfrastructureRow>) -> InfrastructureReport {
    let stations = rows
        .into_iter()
        .map(|r| StationStatus {
            station_id: r.station_id,
            name: r.name,
            lat: r.lat,
            lon: r.lon,
            calibration_certificate: r.calibration_certificate,
            maintenance_date: r.maintenance_date,
            last_measurement: r.last_measurement,
        })
        .collect();
    InfrastructureReport { stations }
}
