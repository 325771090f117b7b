/// HTTP endpoint exposing the report operations.
///
/// A small JSON REST API for dashboards and external analysis tools:
///
/// - GET /health                  - Service health check
/// - GET /reports/air_quality     - Summary + hotspots + heatmap
/// - GET /reports/trends          - Hourly trend series for a variable
/// - GET /reports/alerts          - Threshold / statistical alerts
/// - GET /reports/projection      - Linear projection for a variable
/// - GET /reports/infrastructure  - Station infrastructure snapshot
///
/// Requests are stateless and independent; each one is served on a pool
/// worker with its own scoped database connection, released when the
/// handler returns.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use postgres::Client;
use threadpool::ThreadPool;

use crate::db;
use crate::logging::{self, Component};
use crate::model::{ReportError, VariableSelector};
use crate::reports::{alerts, infrastructure, projection, summary, trends, window};
use crate::store;
use crate::thresholds::ThresholdRegistry;

/// Default worker count for the request pool.
pub const DEFAULT_WORKERS: usize = 4;

// ---------------------------------------------------------------------------
// Query-string parsing
// ---------------------------------------------------------------------------

/// Splits a request URL into its path and decoded query parameters.
/// Malformed pairs are dropped rather than failing the request.
fn parse_url(url: &str) -> (String, HashMap<String, String>) {
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p, q),
        None => (url, ""),
    };

    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key).map(|c| c.into_owned());
        let value = urlencoding::decode(value).map(|c| c.into_owned());
        if let (Ok(key), Ok(value)) = (key, value) {
            params.insert(key, value);
        }
    }

    (path.to_string(), params)
}

/// Parses an optional numeric station filter. Unlike dates, a malformed
/// station id is a caller error, not something to silently default.
fn parse_station_id(params: &HashMap<String, String>) -> Result<Option<i64>, ReportError> {
    match params.get("station_id").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ReportError::InvalidInput(format!("station_id must be numeric, got '{}'", raw))),
    }
}

fn variable_selector(params: &HashMap<String, String>) -> Option<VariableSelector> {
    params
        .get("variable")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(VariableSelector::parse)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_summary(
    client: &mut Client,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ReportError> {
    let station_id = parse_station_id(params)?;
    let w = window::resolve(
        params.get("start_date").map(String::as_str),
        params.get("end_date").map(String::as_str),
        Utc::now(),
    );

    let measurements = store::query_measurements(client, &w, station_id, None)?;
    let report = summary::build_summary(&measurements);
    Ok(serde_json::to_value(&report).unwrap_or_default())
}

fn handle_trends(
    client: &mut Client,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ReportError> {
    let station_id = parse_station_id(params)?;
    let selector = variable_selector(params);
    let days = window::parse_count(params.get("days").map(String::as_str), 7);
    let w = window::trailing_days(days, Utc::now());

    let measurements = store::query_measurements(client, &w, station_id, selector.as_ref())?;
    let series = trends::build_trend(&measurements);
    Ok(serde_json::to_value(&series).unwrap_or_default())
}

fn handle_alerts(
    client: &mut Client,
    params: &HashMap<String, String>,
    registry: &ThresholdRegistry,
) -> Result<serde_json::Value, ReportError> {
    let station_id = parse_station_id(params)?;
    let selector = variable_selector(params);
    let days = window::parse_count(params.get("days").map(String::as_str), 7);
    let w = window::trailing_days(days, Utc::now());

    let measurements = store::query_measurements(client, &w, station_id, selector.as_ref())?;
    // Threshold profiles resolve against the raw variable key the caller
    // sent, so name variants go through the normalization strategies.
    let variable_key = params.get("variable").map(String::as_str);
    let report = alerts::evaluate(&measurements, variable_key, registry);
    Ok(serde_json::to_value(&report).unwrap_or_default())
}

fn handle_projection(
    client: &mut Client,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ReportError> {
    let station_id = parse_station_id(params)?;
    let selector = variable_selector(params);
    let hours = window::parse_count(params.get("hours").map(String::as_str), 24);
    let points = window::parse_count(params.get("points").map(String::as_str), hours);
    // Projections always fit over the trailing week.
    let w = window::trailing_days(7, Utc::now());

    let measurements = store::query_measurements(client, &w, station_id, selector.as_ref())?;
    let report = projection::build_projection(&measurements, hours, points)?;
    Ok(serde_json::to_value(&report).unwrap_or_default())
}

fn handle_infrastructure(client: &mut Client) -> Result<serde_json::Value, ReportError> {
    let rows = store::fetch_infrastructure(client)?;
    let report = infrastructure::build_infrastructure(rows);
    Ok(serde_json::to_value(&report).unwrap_or_default())
}

fn handle_health() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "service": "aqmon_service",
        "version": env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps a report error to an HTTP status and JSON body.
fn error_body(err: &ReportError) -> (u16, serde_json::Value) {
    match err {
        ReportError::InvalidInput(msg) => (400, serde_json::json!({ "error": msg })),
        ReportError::InsufficientData { available } => (
            400,
            serde_json::json!({
                "error": "Not enough data to project",
                "available": available,
            }),
        ),
        ReportError::Store(msg) => (500, serde_json::json!({ "error": msg })),
    }
}

/// Routes one request to its handler. Every route except /health opens
/// its own database connection, scoped to the request.
fn route(url: &str, registry: &ThresholdRegistry) -> (u16, serde_json::Value) {
    let (path, params) = parse_url(url);

    if path == "/health" {
        return (200, handle_health());
    }

    let known_route = matches!(
        path.as_str(),
        "/reports/air_quality"
            | "/reports/trends"
            | "/reports/alerts"
            | "/reports/projection"
            | "/reports/infrastructure"
    );
    if !known_route {
        return (
            404,
            serde_json::json!({
                "error": "Not found",
                "available_endpoints": [
                    "/health",
                    "/reports/air_quality",
                    "/reports/trends",
                    "/reports/alerts",
                    "/reports/projection",
                    "/reports/infrastructure",
                ],
            }),
        );
    }

    let mut client = match db::connect_simple() {
        Ok(client) => client,
        Err(e) => {
            logging::error(Component::Store, &format!("connection failed: {}", e));
            return (500, serde_json::json!({ "error": "Database unavailable" }));
        }
    };

    let result = match path.as_str() {
        "/reports/air_quality" => handle_summary(&mut client, &params),
        "/reports/trends" => handle_trends(&mut client, &params),
        "/reports/alerts" => handle_alerts(&mut client, &params, registry),
        "/reports/projection" => handle_projection(&mut client, &params),
        "/reports/infrastructure" => handle_infrastructure(&mut client),
        _ => unreachable!("route checked above"),
    };

    match result {
        Ok(body) => (200, body),
        Err(e) => {
            match e {
                ReportError::Store(ref msg) => {
                    logging::error(Component::Store, msg);
                }
                ref other => {
                    logging::info(Component::Report, &format!("{} -> {}", path, other));
                }
            }
            error_body(&e)
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Starts the endpoint server on the specified port, serving requests on
/// a fixed worker pool. Blocks the calling thread.
pub fn start_endpoint_server(
    port: u16,
    workers: usize,
    registry: Arc<ThresholdRegistry>,
) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;
    let pool = ThreadPool::new(workers.max(1));

    logging::info(
        Component::Endpoint,
        &format!("listening on http://0.0.0.0:{} ({} workers)", port, pool.max_count()),
    );

    for request in server.incoming_requests() {
        let registry = Arc::clone(&registry);
        pool.execute(move || {
            let url = request.url().to_string();
            let (status, body) = route(&url, &registry);
            if let Err(e) = request.respond(create_response(status, body)) {
                logging::error(Component::Endpoint, &format!("failed to send response: {}", e));
            }
        });
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: serde_json::Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    let bytes = body.into_bytes();

    let mut response =
        tiny_http::Response::from_data(bytes).with_status_code(tiny_http::StatusCode::from(status_code));
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
