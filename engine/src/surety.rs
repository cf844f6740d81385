//! The FlightSurety engine facade.
//!
//! Every mutating operation takes the ledger's write lock for its whole
//! duration and passes the access gate before touching the store, so
//! operations are serialized and either fully applied or not at all.
//! Queries take the read lock and are never gated.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use flightsurety_common::{
    Amount, CallerId, Event, FlightKey, FlightStatus, FlightSuretyError, OracleIndex, Principal,
    Result, TxId,
};
use flightsurety_ledger::{Airline, Flight, JournalEntry, LedgerEngine, Session};

use crate::config::SuretyConfig;
use crate::insurance::{InsuranceDesk, InsuranceInfo};
use crate::metrics::{Metrics, MetricsSnapshot, SharedMetrics};
use crate::oracle::{OracleDesk, ReportOutcome};
use crate::registration::{AirlineRegistry, RegistrationOutcome};

/// The flight-delay insurance engine.
pub struct FlightSurety {
    /// Configuration.
    config: SuretyConfig,
    /// Gated ledger; the single writer lock.
    ledger: RwLock<LedgerEngine>,
    /// Airline consensus and flight registration.
    registry: AirlineRegistry,
    /// Policies and payouts.
    insurance: InsuranceDesk,
    /// Oracle registration and quorum.
    oracles: OracleDesk,
    /// Event publisher.
    events: broadcast::Sender<Event>,
    /// Counters.
    metrics: SharedMetrics,
}

impl FlightSurety {
    /// Create an engine with the configured first airline already registered.
    pub fn new(config: SuretyConfig) -> Result<Self> {
        config
            .validate()
            .map_err(FlightSuretyError::ConfigurationError)?;

        let mut ledger = LedgerEngine::new(config.owner.clone());
        ledger
            .gate_mut()
            .authorize_caller(&config.owner, config.engine_id.clone())?;

        let registry = AirlineRegistry::new(config.consensus.clone());
        let genesis = {
            let mut session = ledger.open(&config.engine_id)?;
            registry.seed_founder(&mut session, &config.first_airline)?
        };

        let (events, _) = broadcast::channel(config.event_capacity);
        let metrics: SharedMetrics = Arc::new(Metrics::new());
        metrics.record_events(&genesis);

        info!(
            owner = %config.owner,
            first_airline = %config.first_airline,
            engine_id = %config.engine_id,
            "FlightSurety engine started"
        );

        Ok(Self {
            insurance: InsuranceDesk::new(config.insurance.clone()),
            oracles: OracleDesk::new(config.oracle.clone(), config.seed.clone()),
            registry,
            ledger: RwLock::new(ledger),
            events,
            metrics,
            config,
        })
    }

    /// Run one mutating operation under the write lock.
    ///
    /// Events are published before the lock is released so subscribers see
    /// them in commit order.
    fn execute<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Session<'_>, TxId) -> Result<(T, Vec<Event>)>,
    ) -> Result<T> {
        let tx_id = TxId::new();
        let mut ledger = self.ledger.write();

        match ledger
            .open(&self.config.engine_id)
            .and_then(|mut session| f(&mut session, tx_id))
        {
            Ok((value, events)) => {
                self.metrics.record_events(&events);
                self.publish(events);
                Ok(value)
            }
            Err(e) => {
                self.metrics.operation_rejected();
                warn!(
                    operation,
                    tx_id = %tx_id,
                    code = e.error_code(),
                    error = %e,
                    "Operation rejected"
                );
                Err(e)
            }
        }
    }

    fn publish(&self, events: Vec<Event>) {
        for event in events {
            // No subscribers is not an error
            let _ = self.events.send(event);
        }
    }

    /// Subscribe to events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Get configuration.
    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    /// Get current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the counters, for exporters.
    pub fn metrics_handle(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    // --- Administration ---

    /// Pause or resume all mutating operations. Owner only.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn set_operating_status(&self, caller: &Principal, operational: bool) -> Result<()> {
        let mut ledger = self.ledger.write();
        let changed = ledger
            .gate_mut()
            .set_operating_status(caller, operational)
            .map_err(|e| {
                self.metrics.operation_rejected();
                e
            })?;

        if changed {
            self.publish(vec![Event::OperatingStatusChanged { operational }]);
        }
        Ok(())
    }

    /// Allow another logic module to mutate the ledger. Owner only.
    pub fn authorize_caller(&self, caller: &Principal, module: CallerId) -> Result<()> {
        self.ledger.write().gate_mut().authorize_caller(caller, module)
    }

    /// Revoke a logic module's access. Owner only.
    ///
    /// Revoking the engine's own identity leaves every mutating operation
    /// failing with `Unauthorized` until it is authorized again.
    pub fn deauthorize_caller(&self, caller: &Principal, module: &CallerId) -> Result<()> {
        self.ledger.write().gate_mut().deauthorize_caller(caller, module)
    }

    // --- Airlines and flights ---

    /// Register or vote for an airline.
    pub fn register_airline(
        &self,
        caller: &Principal,
        candidate: &Principal,
    ) -> Result<RegistrationOutcome> {
        let outcome = self.execute("register_airline", |session, _| {
            self.registry.register_airline(session, caller, candidate)
        })?;

        if matches!(outcome, RegistrationOutcome::VoteRecorded { .. }) {
            self.metrics.vote_cast();
        }
        Ok(outcome)
    }

    /// Deposit stake for the calling airline. Returns the total stake.
    pub fn fund_airline(&self, caller: &Principal, amount: Amount) -> Result<Amount> {
        self.execute("fund_airline", |session, tx_id| {
            self.registry.fund_airline(session, tx_id, caller, amount)
        })
    }

    /// Publish a flight of the calling airline.
    pub fn register_flight(&self, caller: &Principal, key: &FlightKey) -> Result<()> {
        self.execute("register_flight", |session, _| {
            self.registry
                .register_flight(session, caller, key)
                .map(|events| ((), events))
        })
    }

    // --- Insurance ---

    /// Buy a policy on a flight.
    pub fn buy_insurance(&self, caller: &Principal, key: &FlightKey, amount: Amount) -> Result<()> {
        self.execute("buy_insurance", |session, tx_id| {
            self.insurance
                .buy_insurance(session, tx_id, caller, key, amount)
                .map(|events| ((), events))
        })
    }

    /// Pay out the caller's credit balance. Returns the amount paid.
    pub fn withdraw(&self, caller: &Principal) -> Result<Amount> {
        self.execute("withdraw", |session, tx_id| {
            self.insurance.withdraw(session, tx_id, caller)
        })
    }

    // --- Oracles ---

    /// Register the caller as an oracle. Returns its indices.
    pub fn register_oracle(&self, caller: &Principal, stake: Amount) -> Result<[OracleIndex; 3]> {
        self.execute("register_oracle", |session, tx_id| {
            self.oracles.register_oracle(session, tx_id, caller, stake)
        })
    }

    /// Request a status report for a flight. Returns the requested index.
    pub fn fetch_flight_status(&self, caller: &Principal, key: &FlightKey) -> Result<OracleIndex> {
        self.execute("fetch_flight_status", |session, _| {
            self.oracles.fetch_flight_status(session, caller, key)
        })
    }

    /// Submit an oracle's report for an open request.
    pub fn submit_oracle_response(
        &self,
        caller: &Principal,
        index: OracleIndex,
        key: &FlightKey,
        status_code: u8,
    ) -> Result<ReportOutcome> {
        let outcome = self.execute("submit_oracle_response", |session, tx_id| {
            self.oracles.submit_oracle_response(
                session,
                tx_id,
                &self.insurance,
                caller,
                index,
                key,
                status_code,
            )
        })?;

        if matches!(outcome, ReportOutcome::Ignored(_)) {
            self.metrics.report_ignored();
        }
        Ok(outcome)
    }

    // --- Queries ---

    /// Check the operational switch.
    pub fn is_operational(&self) -> bool {
        self.ledger.read().gate().is_operational()
    }

    /// Check if a module may mutate the ledger.
    pub fn is_caller_authorized(&self, module: &CallerId) -> bool {
        self.ledger.read().gate().is_authorized(module)
    }

    /// Airline record.
    pub fn airline(&self, airline: &Principal) -> Option<Airline> {
        self.ledger.read().store().airline(airline).cloned()
    }

    /// Whether the airline is Registered or Funded.
    pub fn is_airline_registered(&self, airline: &Principal) -> bool {
        self.ledger
            .read()
            .store()
            .airline(airline)
            .map_or(false, |a| a.state.is_registered())
    }

    /// Whether the airline is Funded and can sell insurance.
    pub fn is_airline_available(&self, airline: &Principal) -> bool {
        self.ledger
            .read()
            .store()
            .airline(airline)
            .map_or(false, |a| a.state.is_funded())
    }

    /// Stake deposited by an airline.
    pub fn get_airline_funds(&self, airline: &Principal) -> Option<Amount> {
        self.ledger.read().store().airline(airline).map(|a| a.stake)
    }

    /// Number of Registered or Funded airlines.
    pub fn registered_airline_count(&self) -> usize {
        self.ledger.read().store().registered_airline_count()
    }

    /// Flight record.
    pub fn flight(&self, key: &FlightKey) -> Option<Flight> {
        self.ledger.read().store().flight(key).cloned()
    }

    /// Whether the flight is registered.
    pub fn is_flight_registered(&self, key: &FlightKey) -> bool {
        self.ledger
            .read()
            .store()
            .flight(key)
            .map_or(false, |f| f.registered)
    }

    /// Current status of a registered flight.
    pub fn get_flight_status(&self, key: &FlightKey) -> Result<FlightStatus> {
        self.ledger
            .read()
            .store()
            .flight(key)
            .map(|f| f.status)
            .ok_or_else(|| FlightSuretyError::FlightNotFound(key.clone()))
    }

    /// A passenger's policy on a flight.
    pub fn get_insurance_info(&self, key: &FlightKey, passenger: &Principal) -> Option<InsuranceInfo> {
        let ledger = self.ledger.read();
        self.insurance.insurance_info(ledger.store(), key, passenger)
    }

    /// Indices assigned to an oracle.
    pub fn get_my_indexes(&self, oracle: &Principal) -> Result<[OracleIndex; 3]> {
        let ledger = self.ledger.read();
        self.oracles.indices_of(ledger.store(), oracle)
    }

    /// Number of registered oracles.
    pub fn oracle_count(&self) -> usize {
        self.ledger.read().store().oracle_count()
    }

    /// Withdrawable balance of a passenger.
    pub fn credit_balance(&self, passenger: &Principal) -> Amount {
        self.ledger.read().credit_balance(passenger)
    }

    /// Pooled escrow balance.
    pub fn escrow_balance(&self) -> Amount {
        self.ledger.read().escrow_balance()
    }

    /// Copy of the escrow journal.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.ledger.read().store().journal().to_vec()
    }

    /// Check that the journal balances and matches every account.
    pub fn verify_integrity(&self) -> bool {
        self.ledger.read().verify_integrity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsurety_common::from_unix_seconds;

    fn engine() -> FlightSurety {
        FlightSurety::new(SuretyConfig::default()).unwrap()
    }

    fn owner() -> Principal {
        Principal::new("OWNER")
    }

    fn first_airline() -> Principal {
        Principal::new("AIRLINE_1")
    }

    #[test]
    fn test_genesis_state() {
        let engine = engine();

        assert!(engine.is_operational());
        assert!(engine.is_airline_registered(&first_airline()));
        assert!(!engine.is_airline_available(&first_airline()));
        assert_eq!(engine.registered_airline_count(), 1);
        assert_eq!(engine.get_airline_funds(&first_airline()), Some(Amount::ZERO));
        assert_eq!(engine.get_airline_funds(&Principal::new("AIRLINE_2")), None);
        assert!(engine.is_caller_authorized(&engine.config().engine_id));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SuretyConfig::default();
        config.oracle.quorum = 0;

        let err = FlightSurety::new(config).err().unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_only_owner_pauses() {
        let engine = engine();

        let err = engine
            .set_operating_status(&first_airline(), false)
            .unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        assert!(engine.is_operational());

        engine.set_operating_status(&owner(), false).unwrap();
        assert!(!engine.is_operational());
        assert_eq!(
            engine.fund_airline(&first_airline(), Amount::from_units(10)),
            Err(FlightSuretyError::NotOperational)
        );

        engine.set_operating_status(&owner(), true).unwrap();
        assert!(engine.fund_airline(&first_airline(), Amount::from_units(10)).is_ok());
    }

    #[test]
    fn test_deauthorized_engine_cannot_mutate() {
        let engine = engine();
        let engine_id = engine.config().engine_id.clone();

        engine.deauthorize_caller(&owner(), &engine_id).unwrap();
        let err = engine
            .fund_airline(&first_airline(), Amount::from_units(10))
            .unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");

        engine.authorize_caller(&owner(), engine_id).unwrap();
        assert!(engine.fund_airline(&first_airline(), Amount::from_units(10)).is_ok());
    }

    #[test]
    fn test_rejections_are_counted() {
        let engine = engine();
        let key = FlightKey::new(first_airline(), "ND1309", from_unix_seconds(1_700_000_000).unwrap());

        assert!(engine.register_flight(&first_airline(), &key).is_err());
        assert!(engine.get_flight_status(&key).is_err());
        assert_eq!(engine.metrics().operations_rejected, 1);
        assert_eq!(engine.metrics().airlines_registered, 1);
    }

    #[test]
    fn test_metrics_handle_tracks_live_counters() {
        let engine = engine();
        let counters = engine.metrics_handle();

        engine.fund_airline(&first_airline(), Amount::from_units(10)).unwrap();
        assert_eq!(counters.snapshot().airlines_funded, 1);
        assert!(counters
            .to_prometheus()
            .contains("flightsurety_airlines_funded 1\n"));
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let engine = engine();
        let mut events = engine.subscribe();

        engine
            .fund_airline(&first_airline(), Amount::from_units(10))
            .unwrap();
        engine
            .register_airline(&first_airline(), &Principal::new("AIRLINE_2"))
            .unwrap();
        engine.set_operating_status(&owner(), false).unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            Event::AirlineFunded {
                airline: first_airline(),
                amount: Amount::from_units(10),
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            Event::AirlineRegistered {
                airline: Principal::new("AIRLINE_2"),
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            Event::OperatingStatusChanged { operational: false }
        );
    }
}
