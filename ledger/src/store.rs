//! Typed entity store.
//!
//! A dumb, strongly typed map per entity. Lookups of unknown keys return
//! `None`; nothing is ever zero-initialized on read, since a zero stake or
//! premium is a legitimate value. Mutators demand a [`WriteToken`] and do no
//! business validation.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use flightsurety_common::{
    Amount, FlightKey, FlightSuretyError, Principal, Result, RoundKey,
};

use crate::access::WriteToken;
use crate::balance::{AccountBalance, LedgerAccount};
use crate::journal::{JournalBatch, JournalEntry};
use crate::records::{Airline, Flight, OracleRegistration, Policy, ResponseRound};

/// All persistent protocol state.
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    airlines: HashMap<Principal, Airline>,
    flights: HashMap<FlightKey, Flight>,
    policies: HashMap<FlightKey, BTreeMap<Principal, Policy>>,
    oracles: HashMap<Principal, OracleRegistration>,
    rounds: HashMap<RoundKey, ResponseRound>,
    balances: HashMap<LedgerAccount, AccountBalance>,
    journal: Vec<JournalEntry>,
    nonce: u64,
}

impl LedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Airlines ---

    /// Look up an airline in any admission state.
    pub fn airline(&self, id: &Principal) -> Option<&Airline> {
        self.airlines.get(id)
    }

    /// Airlines that are Registered or Funded.
    pub fn registered_airline_count(&self) -> usize {
        self.airlines
            .values()
            .filter(|a| a.state.is_registered())
            .count()
    }

    /// Insert or replace an airline.
    pub fn put_airline(&mut self, _token: &WriteToken, airline: Airline) {
        debug!(airline = %airline.id, state = ?airline.state, "Storing airline");
        self.airlines.insert(airline.id.clone(), airline);
    }

    /// Mutable access to an existing airline.
    pub fn airline_mut(&mut self, _token: &WriteToken, id: &Principal) -> Option<&mut Airline> {
        self.airlines.get_mut(id)
    }

    // --- Flights ---

    /// Look up a flight by its composite key.
    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    /// Insert or replace a flight.
    pub fn put_flight(&mut self, _token: &WriteToken, flight: Flight) {
        debug!(flight = %flight.key, "Storing flight");
        self.flights.insert(flight.key.clone(), flight);
    }

    /// Mutable access to an existing flight.
    pub fn flight_mut(&mut self, _token: &WriteToken, key: &FlightKey) -> Option<&mut Flight> {
        self.flights.get_mut(key)
    }

    // --- Policies ---

    /// A passenger's policy on a flight.
    pub fn policy(&self, flight: &FlightKey, passenger: &Principal) -> Option<&Policy> {
        self.policies.get(flight).and_then(|p| p.get(passenger))
    }

    /// Policies on a flight, ordered by passenger.
    pub fn policies_for(&self, flight: &FlightKey) -> impl Iterator<Item = &Policy> {
        self.policies.get(flight).into_iter().flat_map(|p| p.values())
    }

    /// Insert or replace a policy.
    pub fn put_policy(&mut self, _token: &WriteToken, policy: Policy) {
        debug!(flight = %policy.flight, passenger = %policy.passenger, "Storing policy");
        self.policies
            .entry(policy.flight.clone())
            .or_default()
            .insert(policy.passenger.clone(), policy);
    }

    /// Mutable access to every policy on a flight.
    pub fn policies_for_mut(
        &mut self,
        _token: &WriteToken,
        flight: &FlightKey,
    ) -> impl Iterator<Item = &mut Policy> {
        self.policies
            .get_mut(flight)
            .into_iter()
            .flat_map(|p| p.values_mut())
    }

    // --- Oracles ---

    /// An oracle's registration.
    pub fn oracle(&self, id: &Principal) -> Option<&OracleRegistration> {
        self.oracles.get(id)
    }

    /// Number of registered oracles.
    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Insert or replace an oracle registration.
    pub fn put_oracle(&mut self, _token: &WriteToken, registration: OracleRegistration) {
        debug!(oracle = %registration.oracle, indices = ?registration.indices, "Storing oracle");
        self.oracles
            .insert(registration.oracle.clone(), registration);
    }

    // --- Response rounds ---

    /// A response round by (index, flight).
    pub fn round(&self, key: &RoundKey) -> Option<&ResponseRound> {
        self.rounds.get(key)
    }

    /// Insert or replace a response round.
    pub fn put_round(&mut self, _token: &WriteToken, round: ResponseRound) {
        debug!(round = %round.key, "Storing response round");
        self.rounds.insert(round.key.clone(), round);
    }

    /// Mutable access to an open response round.
    pub fn round_mut(&mut self, _token: &WriteToken, key: &RoundKey) -> Option<&mut ResponseRound> {
        self.rounds.get_mut(key)
    }

    // --- Nonce ---

    /// Return the current nonce and advance it.
    pub fn next_nonce(&mut self, _token: &WriteToken) -> u64 {
        let nonce = self.nonce;
        self.nonce = self.nonce.wrapping_add(1);
        nonce
    }

    // --- Escrow ---

    /// Balance of an account that has seen at least one entry.
    pub fn balance(&self, account: &LedgerAccount) -> Option<Amount> {
        self.balances.get(account).map(|b| b.balance)
    }

    /// Every account that has seen an entry.
    pub fn balances(&self) -> impl Iterator<Item = &AccountBalance> {
        self.balances.values()
    }

    /// Committed entries, oldest first.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Apply a balanced batch to the account balances and append it to the journal.
    pub fn commit_batch(
        &mut self,
        _token: &WriteToken,
        batch: JournalBatch,
    ) -> Result<Vec<JournalEntry>> {
        if !batch.is_balanced() {
            return Err(FlightSuretyError::LedgerImbalance(batch.tx_id.to_string()));
        }

        let mut committed = Vec::with_capacity(batch.entries.len());
        for mut entry in batch.entries {
            let balance = self
                .balances
                .entry(entry.account.clone())
                .or_insert_with(|| AccountBalance::zero(entry.account.clone()));
            entry.balance_after = balance.apply(entry.signed_amount());
            committed.push(entry);
        }

        debug!(tx_id = %batch.tx_id, entries = committed.len(), "Journal batch committed");
        self.journal.extend(committed.iter().cloned());
        Ok(committed)
    }
}
