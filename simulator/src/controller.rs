//! Simulation controller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use flightsurety_common::{from_unix_seconds, now, Amount, FlightKey, FlightSuretyError, Principal};
use flightsurety_engine::{FlightSurety, RegistrationOutcome};

use crate::metrics::SimulationMetrics;

/// Drives airlines and passengers against the engine.
pub struct SimulationController {
    /// The engine under simulation.
    engine: Arc<FlightSurety>,
    /// Airlines to admit, including the founder.
    airline_count: usize,
    /// Passengers buying insurance.
    passenger_count: usize,
    /// Flights to publish.
    flight_count: usize,
    /// Pause between request rounds.
    tick: Duration,
    /// Random number generator.
    rng: StdRng,
    /// Admitted and funded airlines.
    airlines: Vec<Principal>,
    /// Published flights.
    flights: Vec<FlightKey>,
    /// Simulation metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(
        engine: Arc<FlightSurety>,
        airline_count: usize,
        passenger_count: usize,
        flight_count: usize,
        tick: Duration,
        seed: u64,
        metrics: Arc<RwLock<SimulationMetrics>>,
    ) -> Self {
        Self {
            engine,
            airline_count: airline_count.max(1),
            passenger_count,
            flight_count,
            tick,
            rng: StdRng::seed_from_u64(seed),
            airlines: Vec::new(),
            flights: Vec::new(),
            metrics,
        }
    }

    fn passenger(n: usize) -> Principal {
        Principal::new(format!("PASSENGER_{}", n))
    }

    /// Admit and fund the airlines, then publish their flights.
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        let stake = self.engine.config().consensus.min_airline_stake;
        let founder = self.engine.config().first_airline.clone();

        self.engine.fund_airline(&founder, stake)?;
        self.airlines.push(founder);

        for n in 2..=self.airline_count {
            let candidate = Principal::new(format!("AIRLINE_{}", n));

            // Every funded airline votes until the candidate is in
            for voter in &self.airlines {
                match self.engine.register_airline(voter, &candidate)? {
                    RegistrationOutcome::Registered | RegistrationOutcome::AlreadyRegistered => break,
                    outcome => info!(airline = %candidate, voter = %voter, ?outcome, "Vote cast"),
                }
            }

            self.engine.fund_airline(&candidate, stake)?;
            info!(airline = %candidate, "Airline admitted and funded");
            self.airlines.push(candidate);
        }

        let departure = now().timestamp() + 86_400;
        for i in 0..self.flight_count {
            let airline = self.airlines[i % self.airlines.len()].clone();
            let timestamp = from_unix_seconds(departure + 3_600 * i as i64)
                .context("departure time out of range")?;
            let key = FlightKey::new(airline.clone(), format!("FS{:04}", 100 + i), timestamp);

            self.engine.register_flight(&airline, &key)?;
            info!(flight = %key, "Flight published");
            self.flights.push(key);
        }

        Ok(())
    }

    /// Every passenger insures one random flight for a random premium.
    pub async fn sell_policies(&mut self) {
        if self.flights.is_empty() {
            return;
        }

        for n in 1..=self.passenger_count {
            let passenger = Self::passenger(n);
            let flight = &self.flights[self.rng.gen_range(0..self.flights.len())];
            let premium = Amount::new(Decimal::new(self.rng.gen_range(1..=10), 1));

            match self.engine.buy_insurance(&passenger, flight, premium) {
                Ok(()) => {
                    info!(passenger = %passenger, flight = %flight, premium = %premium, "Policy sold");
                    self.metrics.write().await.record_policy();
                }
                Err(e) => {
                    warn!(passenger = %passenger, error = %e, "Policy refused");
                    self.metrics.write().await.record_policy_rejected();
                }
            }
        }
    }

    /// Request statuses until every flight resolves or `rounds` run out.
    pub async fn run(&mut self, rounds: usize) -> anyhow::Result<()> {
        for round in 1..=rounds {
            let pending: Vec<FlightKey> = self
                .flights
                .iter()
                .filter(|key| self.engine.flight(key).map_or(false, |f| !f.is_resolved()))
                .cloned()
                .collect();
            if pending.is_empty() {
                info!(round, "All flights resolved");
                break;
            }

            for key in &pending {
                self.request_status(round, key).await?;
            }

            tokio::time::sleep(self.tick).await;
        }

        Ok(())
    }

    /// Ask the oracles about one flight. Returns `false` when the flight
    /// resolved before the request went out.
    async fn request_status(&mut self, round: usize, key: &FlightKey) -> anyhow::Result<bool> {
        let requester = Self::passenger(self.rng.gen_range(1..=self.passenger_count.max(1)));
        let index = match self.engine.fetch_flight_status(&requester, key) {
            Ok(index) => index,
            // The fleet runs concurrently and may have settled it already
            Err(FlightSuretyError::NotMatchable(_)) => {
                debug!(round, flight = %key, "Flight resolved before request");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        info!(round, flight = %key, index, "Status requested");
        self.metrics.write().await.record_request();
        Ok(true)
    }

    /// Every passenger withdraws whatever was credited.
    pub async fn settle(&self) -> anyhow::Result<()> {
        for n in 1..=self.passenger_count {
            let passenger = Self::passenger(n);
            let paid = self.engine.withdraw(&passenger)?;
            if paid.is_positive() {
                info!(passenger = %passenger, amount = %paid, "Payout withdrawn");
                self.metrics.write().await.record_withdrawal(paid.value());
            }
        }

        Ok(())
    }

    /// Number of published flights.
    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }

    /// Get simulation metrics.
    pub async fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.read().await.clone()
    }
}
