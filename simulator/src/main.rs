//! FlightSurety Simulator
//!
//! Runs airlines, passengers and an oracle fleet against an in-process
//! engine: admit and fund airlines, sell policies, request flight statuses,
//! let the fleet report random statuses and withdraw the payouts.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flightsurety_engine::{FlightSurety, SuretyConfig};

mod controller;
mod metrics;
mod oracle;

use controller::SimulationController;
use metrics::SimulationMetrics;
use oracle::OracleFleet;

/// FlightSurety Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "FlightSurety airline, passenger and oracle simulation")]
struct Args {
    /// Number of airlines, including the founder
    #[arg(short, long, default_value = "5")]
    airlines: usize,

    /// Number of passengers
    #[arg(short, long, default_value = "10")]
    passengers: usize,

    /// Number of flights to publish
    #[arg(short, long, default_value = "3")]
    flights: usize,

    /// Number of oracles to register
    #[arg(short, long, default_value = "20")]
    oracles: usize,

    /// Maximum status request rounds
    #[arg(long, default_value = "20")]
    rounds: usize,

    /// Pause between request rounds in milliseconds
    #[arg(long, default_value = "200")]
    tick_ms: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Log in JSON
    #[arg(long)]
    json: bool,

    /// Print every engine event as a JSON line on stdout
    #[arg(long)]
    dump_events: bool,

    /// Print the engine counters in Prometheus text format on exit
    #[arg(long)]
    prometheus: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    if args.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting FlightSurety Simulator");

    let config = SuretyConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let engine = Arc::new(FlightSurety::new(config)?);
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, airlines = args.airlines, passengers = args.passengers, "Engine ready");

    let dump = args.dump_events.then(|| {
        let mut events = engine.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => error!(error = %e, "Event serialization failed"),
                    },
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let metrics = Arc::new(RwLock::new(SimulationMetrics::new()));
    let exporter = args.prometheus.then(|| engine.metrics_handle());

    // Oracles first, so the fleet hears every request
    let fleet = OracleFleet::register(&engine, args.oracles, StdRng::seed_from_u64(seed.wrapping_add(1)));
    info!(oracles = fleet.len(), "Oracle fleet registered");
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let fleet_handle = tokio::spawn(fleet.run(
        engine.clone(),
        engine.subscribe(),
        metrics.clone(),
        shutdown_rx,
    ));

    let tick = Duration::from_millis(args.tick_ms);
    let mut controller = SimulationController::new(
        engine.clone(),
        args.airlines,
        args.passengers,
        args.flights,
        tick,
        seed,
        metrics.clone(),
    );

    controller.initialize()?;
    controller.sell_policies().await;
    controller.run(args.rounds).await?;

    // Let the fleet drain the last requests
    tokio::time::sleep(tick).await;
    controller.settle().await?;

    let _ = shutdown_tx.send(()).await;
    fleet_handle.await?;
    if let Some(handle) = dump {
        handle.abort();
    }

    let summary = controller.get_metrics().await;
    info!("Simulation complete");
    info!("Policies sold: {}", summary.policies_sold);
    info!("Policies refused: {}", summary.policies_rejected);
    info!("Status requests: {}", summary.status_requests);
    info!("Oracle reports: {} accepted, {} refused", summary.reports_submitted, summary.reports_rejected);
    info!(
        "Flights resolved: {} of {} ({:.0}%)",
        summary.flights_resolved,
        controller.flight_count(),
        summary.resolution_rate(controller.flight_count()) * 100.0
    );
    info!("Payouts: {} across {} withdrawals", summary.payouts, summary.withdrawals);
    info!(
        escrow = %engine.escrow_balance(),
        ledger_ok = engine.verify_integrity(),
        engine_metrics = %serde_json::to_string(&engine.metrics())?,
        "Final ledger state"
    );

    if let Some(counters) = exporter {
        print!("{}", counters.to_prometheus());
    }

    Ok(())
}
