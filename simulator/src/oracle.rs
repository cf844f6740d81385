//! Simulated oracle fleet.
//!
//! Registers a batch of oracles, then answers every `OracleRequest` it sees
//! with a random status from each oracle holding the requested index.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

use flightsurety_common::{Event, FlightKey, OracleIndex, Principal};
use flightsurety_engine::{FlightSurety, ReportOutcome};

use crate::metrics::SimulationMetrics;

/// A registered oracle and its indices.
#[derive(Debug, Clone)]
pub struct SimulatedOracle {
    /// Oracle identity.
    pub id: Principal,
    /// Indices assigned at registration.
    pub indices: [OracleIndex; 3],
}

/// Random status code: one of 0, 10, 20, 30, 40, 50.
pub fn random_status<R: Rng>(rng: &mut R) -> u8 {
    rng.gen_range(0..6u8) * 10
}

/// Oracles answering status requests.
pub struct OracleFleet {
    oracles: Vec<SimulatedOracle>,
    rng: StdRng,
}

impl OracleFleet {
    /// Register `count` oracles. Failed registrations are logged and skipped.
    pub fn register(engine: &FlightSurety, count: usize, rng: StdRng) -> Self {
        let fee = engine.config().oracle.registration_fee;
        let mut oracles = Vec::with_capacity(count);

        for n in 1..=count {
            let id = Principal::new(format!("ORACLE_{}", n));
            if let Err(e) = engine.register_oracle(&id, fee) {
                warn!(oracle = %id, error = %e, "Oracle registration failed");
                continue;
            }

            match engine.get_my_indexes(&id) {
                Ok(indices) => {
                    info!(oracle = %id, ?indices, "Oracle ready");
                    oracles.push(SimulatedOracle { id, indices });
                }
                Err(e) => warn!(oracle = %id, error = %e, "Oracle indices unavailable"),
            }
        }

        Self { oracles, rng }
    }

    /// Number of registered oracles.
    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    /// Answer requests until a shutdown signal arrives.
    pub async fn run(
        mut self,
        engine: Arc<FlightSurety>,
        mut events: broadcast::Receiver<Event>,
        metrics: Arc<RwLock<SimulationMetrics>>,
        mut shutdown: mpsc::Receiver<()>,
    ) {
        info!(oracles = self.oracles.len(), "Oracle fleet listening");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Ok(Event::OracleRequest { index, flight }) => {
                        self.answer(&engine, index, &flight, &metrics).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Oracle fleet lagged behind the event stream");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("Oracle fleet stopped");
    }

    async fn answer(
        &mut self,
        engine: &FlightSurety,
        index: OracleIndex,
        flight: &FlightKey,
        metrics: &RwLock<SimulationMetrics>,
    ) {
        for oracle in self.oracles.iter().filter(|o| o.indices.contains(&index)) {
            let code = random_status(&mut self.rng);

            match engine.submit_oracle_response(&oracle.id, index, flight, code) {
                Ok(ReportOutcome::Resolved { status, credited }) => {
                    info!(flight = %flight, %status, credited, "Flight resolved");
                    let mut metrics = metrics.write().await;
                    metrics.record_report();
                    metrics.record_resolution();
                }
                Ok(outcome) => {
                    debug!(oracle = %oracle.id, code, ?outcome, "Report submitted");
                    metrics.write().await.record_report();
                }
                Err(e) => {
                    warn!(oracle = %oracle.id, error = %e, "Report rejected");
                    metrics.write().await.record_report_rejected();
                }
            }
        }
    }
}
