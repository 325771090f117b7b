//! Air Quality Monitoring Service - Report Endpoint
//!
//! Serves on-demand air quality reports computed from the measurement
//! database maintained by the management backend:
//! 1. Per-variable summaries with station hotspots and a spatial heatmap
//! 2. Hourly trend series for a variable
//! 3. Threshold and statistical alerts
//! 4. Short-horizon linear projections
//! 5. Station infrastructure snapshots
//!
//! The service is read-only: ingestion, registration, and approval
//! workflows belong to the management backend.
//!
//! Usage:
//!   cargo run --release                    # Serve on the default port 8080
//!   cargo run --release -- --port 9000     # Serve on port 9000
//!   cargo run --release -- --workers 8     # Request pool size
//!   cargo run --release -- --log-file aqmon.log
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use std::env;
use std::sync::Arc;

use aqmon_service::logging::{self, Component, LogLevel};
use aqmon_service::thresholds::ThresholdRegistry;
use aqmon_service::{db, endpoint};

const DEFAULT_PORT: u16 = 8080;
const THRESHOLDS_FILE: &str = "thresholds.toml";

fn main() {
    println!("Air Quality Report Service");
    println!("==========================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port = DEFAULT_PORT;
    let mut workers = endpoint::DEFAULT_WORKERS;
    let mut log_file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(DEFAULT_PORT);
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--workers" => {
                if i + 1 < args.len() {
                    workers = args[i + 1].parse().unwrap_or(endpoint::DEFAULT_WORKERS);
                    i += 2;
                } else {
                    eprintln!("Error: --workers requires a count");
                    std::process::exit(1);
                }
            }
            "--log-file" => {
                if i + 1 < args.len() {
                    log_file = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("Error: --log-file requires a path");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT] [--workers N] [--log-file PATH]", args[0]);
                std::process::exit(1);
            }
        }
    }

    logging::init_logger(LogLevel::Info, log_file.as_deref());

    // Validate database access up front so a misconfigured deploy fails
    // loudly instead of on the first request.
    println!("Validating database access...");
    match db::connect_and_verify(db::REQUIRED_TABLES) {
        Ok(_) => println!("   Database OK ({} tables verified)\n", db::REQUIRED_TABLES.len()),
        Err(e) => {
            eprintln!("\nDatabase validation failed: {}\n", e);
            std::process::exit(1);
        }
    }

    // Load threshold profiles; a misordered profile is a configuration
    // problem worth shouting about, but not fatal.
    let registry = match ThresholdRegistry::load(THRESHOLDS_FILE) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("\nThreshold configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    for violation in registry.validate() {
        logging::warn(Component::Thresholds, &violation.to_string());
    }
    println!("Loaded {} threshold profiles", registry.len());

    println!("Serving reports on http://0.0.0.0:{}", port);
    println!("   GET /health");
    println!("   GET /reports/air_quality?station_id&start_date&end_date");
    println!("   GET /reports/trends?variable&station_id&days");
    println!("   GET /reports/alerts?variable&station_id&days");
    println!("   GET /reports/projection?variable&station_id&hours&points");
    println!("   GET /reports/infrastructure");
    println!("   Press Ctrl+C to stop\n");

    if let Err(e) = endpoint::start_endpoint_server(port, workers, Arc::new(registry)) {
        eprintln!("\nEndpoint server error: {}", e);
        std::process::exit(1);
    }
}
