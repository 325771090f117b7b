/// Measurement store access layer.
///
/// Issues the two read-only collaborator operations the reporting core
/// depends on: range-filtered measurement queries and station metadata
/// resolution. All SQL runs against the schema owned by the management
/// backend (`measurement` ⋈ `sensor` ⋈ `station`, ⋈ `variable`); this
/// service never writes to it.
///
/// Report computation itself is pure and lives under `reports`; this
/// module only fetches rows and maps them into `model::Measurement`.

use chrono::{DateTime, Utc};
use postgres::types::ToSql;
use postgres::Client;
use rust_decimal::Decimal;

use crate::model::{Measurement, ReportError, VariableSelector};
use crate::reports::window::ReportWindow;

// ---------------------------------------------------------------------------
// Measurement queries
// ---------------------------------------------------------------------------

/// Fetches measurements in `[window.start, window.end)`, optionally
/// filtered by station and variable, joined with their sensor, station,
/// and variable metadata.
///
/// Rows come back ordered by timestamp, but callers must not rely on
/// store ordering — the report core re-sorts before any time-sensitive
/// pass.
pub fn query_measurements(
    client: &mut Client,
    window: &ReportWindow,
    station_id: Option<i64>,
    variable: Option<&VariableSelector>,
) -> Result<Vec<Measurement>, ReportError> {
    let mut sql = String::from(
        "SELECT m.m_date, m.m_value, m.sensor_id, m.variable_id, \
                v.v_name, v.v_unit, \
                st.station_id, st.s_name, st.lat, st.lon \
         FROM measurement m \
         JOIN sensor s ON s.sensor_id = m.sensor_id \
         JOIN station st ON st.station_id = s.station_id \
         JOIN variable v ON v.v_id = m.variable_id \
         WHERE m.m_date >= $1 AND m.m_date < $2",
    );

    // Owned filter values must outlive the borrowed params slice.
    let name_pattern;
    let variable_id;
    let station;

    let mut params: Vec<&(dyn ToSql + Sync)> = vec![&window.start, &window.end];

    if let Some(id) = station_id {
        station = id;
        sql.push_str(&format!(" AND st.station_id = ${}", params.len() + 1));
        params.push(&station);
    }

    match variable {
        Some(VariableSelector::Id(id)) => {
            variable_id = *id;
            sql.push_str(&format!(" AND m.variable_id = ${}", params.len() + 1));
            params.push(&variable_id);
        }
        Some(VariableSelector::NameContains(needle)) => {
            name_pattern = format!("%{}%", needle.to_lowercase());
            sql.push_str(&format!(" AND LOWER(v.v_name) LIKE ${}", params.len() + 1));
            params.push(&name_pattern);
        }
        None => {}
    }

    sql.push_str(" ORDER BY m.m_date");

    let rows = client
        .query(sql.as_str(), &params)
        .map_err(|e| ReportError::Store(format!("measurement query failed: {}", e)))?;

    let mut measurements = Vec::with_capacity(rows.len());
    for row in rows {
        let measured_at: DateTime<Utc> = row.get(0);
        let value: Decimal = row.get(1);

        measurements.push(Measurement {
            measured_at,
            value: value.to_string().parse().unwrap_or(0.0),
            sensor_id: row.get(2),
            variable_id: row.get(3),
            variable_name: row.get(4),
            variable_unit: row.get(5),
            station_id: row.get(6),
            station_name: row.get(7),
            station_lat: row.get(8),
            station_lon: row.get(9),
        });
    }

    Ok(measurements)
}

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// One station's infrastructure record, with the timestamp of its most
/// recent measurement (through any of its sensors).
#[derive(Debug, Clone)]
pub struct StationInfrastructureRow {
    pub station_id: i64,
    pub name: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub calibration_certificate: Option<String>,
    pub maintenance_date: Option<DateTime<Utc>>,
    pub last_measurement: Option<DateTime<Utc>>,
}

/// Fetches every station with its latest measurement time.
pub fn fetch_infrastructure(
    client: &mut Client,
) -> Result<Vec<StationInfrastructureRow>, ReportError> {
    let rows = client
        .query(
            "SELECT st.station_id, st.s_name, st.lat, st.lon, \
                    st.calibration_certificate, st.maintenance_date, \
                    (SELECT MAX(m.m_date) \
                     FROM measurement m \
                     JOIN sensor s ON s.sensor_id = m.sensor_id \
                     WHERE s.station_id = st.station_id) AS last_measurement \
             FROM station st \
             ORDER BY st.station_id",
            &[],
        )
        .map_err(|e| ReportError::Store(format!("infrastructure query failed: {}", e)))?;

    let mut stations = Vec::with_capacity(rows.len());
    for row in rows {
        stations.push(StationInfrastructureRow {
            station_id: row.get(0),
            name: row.get(1),
            lat: row.get(2),
            lon: row.get(3),
            calibration_certificate: row.get(4),
            maintenance_date: row.get(5),
            last_measurement: row.get(6),
        });
    }

    Ok(stations)
}
