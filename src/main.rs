//! carbon-window entry point: CLI wiring, logging, and report output.

use std::process;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carbon_window::cli::Cli;
use carbon_window::io::export::export_csv;
use carbon_window::runner::{load_forecast, run_scenario};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let scenario = match cli.scenario() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let series = match load_forecast(&scenario.forecast, Utc::now()) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let output = match run_scenario(&scenario, &series) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&output.result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize result: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{}", output.report);
    }

    if let Some(ref path) = cli.export_candidates {
        if let Err(e) = export_csv(&output.candidates, &output.result.best, path) {
            error!(path = %path.display(), "candidate export failed: {e}");
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path.display(), rows = output.candidates.len(), "candidates exported");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(carbon_window::api::AppState::new(series, &scenario.optimizer));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(carbon_window::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
