//! Airline admission, funding and flight registration.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use flightsurety_common::{
    AirlineState, Amount, Event, FlightKey, FlightSuretyError, Principal, Result, TxId,
};
use flightsurety_ledger::{Airline, Flight, JournalBatch, LedgerAccount, Session};

use crate::config::ConsensusConfig;
use crate::roles;

/// Result of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationOutcome {
    /// The candidate is now Registered.
    Registered,
    /// The vote counted; the candidate still needs more.
    VoteRecorded { votes: usize, required: usize },
    /// The caller had already voted for this candidate.
    DuplicateVote { votes: usize, required: usize },
    /// The candidate was already Registered or Funded.
    AlreadyRegistered,
}

/// Distinct votes needed once `registered` airlines exist: ceil((N + 1) / 2).
pub fn required_votes(registered: usize) -> usize {
    (registered + 2) / 2
}

/// Consensus and registration rules for airlines and their flights.
pub struct AirlineRegistry {
    config: ConsensusConfig,
}

impl AirlineRegistry {
    /// Create a new registry.
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Admit the genesis airline without a vote.
    #[instrument(skip(self, session))]
    pub fn seed_founder(&self, session: &mut Session<'_>, airline: &Principal) -> Result<Vec<Event>> {
        if roles::registered_airline(session.store, airline).is_ok() {
            return Ok(Vec::new());
        }

        let mut record = Airline::candidate(airline.clone());
        record.transition_to(AirlineState::Registered)?;
        session.store.put_airline(&session.token, record);

        info!(airline = %airline, "Founding airline registered");
        Ok(vec![Event::AirlineRegistered {
            airline: airline.clone(),
        }])
    }

    /// Register `candidate` on behalf of a funded airline.
    ///
    /// While fewer than `founder_limit` airlines are registered the caller
    /// admits the candidate alone. After that every call is a vote, and the
    /// candidate is admitted once distinct voters reach [`required_votes`].
    #[instrument(skip(self, session), fields(caller = %caller, candidate = %candidate))]
    pub fn register_airline(
        &self,
        session: &mut Session<'_>,
        caller: &Principal,
        candidate: &Principal,
    ) -> Result<(RegistrationOutcome, Vec<Event>)> {
        roles::funded_airline(session.store, caller)?;

        let existing = session.store.airline(candidate);
        if existing.map_or(false, |a| a.state.is_registered()) {
            debug!("Candidate already registered");
            return Ok((RegistrationOutcome::AlreadyRegistered, Vec::new()));
        }

        let mut record = existing
            .cloned()
            .unwrap_or_else(|| Airline::candidate(candidate.clone()));
        let registered = session.store.registered_airline_count();

        let outcome = if registered < self.config.founder_limit {
            record.transition_to(AirlineState::Registered)?;
            RegistrationOutcome::Registered
        } else {
            let required = required_votes(registered);
            if !record.add_vote(caller.clone()) {
                debug!(votes = record.vote_count(), required, "Duplicate vote ignored");
                return Ok((
                    RegistrationOutcome::DuplicateVote {
                        votes: record.vote_count(),
                        required,
                    },
                    Vec::new(),
                ));
            }

            let votes = record.vote_count();
            if votes >= required {
                record.transition_to(AirlineState::Registered)?;
                RegistrationOutcome::Registered
            } else {
                info!(votes, required, "Vote recorded");
                RegistrationOutcome::VoteRecorded { votes, required }
            }
        };

        session.store.put_airline(&session.token, record);

        let mut events = Vec::new();
        if outcome == RegistrationOutcome::Registered {
            info!(registered = registered + 1, "Airline registered");
            events.push(Event::AirlineRegistered {
                airline: candidate.clone(),
            });
        }
        Ok((outcome, events))
    }

    /// Deposit stake for the calling airline.
    ///
    /// The first deposit must meet the minimum and moves the airline to
    /// Funded; later deposits top up the stake. Returns the total stake.
    #[instrument(skip(self, session), fields(caller = %caller, amount = %amount))]
    pub fn fund_airline(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        caller: &Principal,
        amount: Amount,
    ) -> Result<(Amount, Vec<Event>)> {
        if !amount.is_positive() {
            return Err(FlightSuretyError::InvalidAmount(amount));
        }

        let airline = roles::registered_airline(session.store, caller)?;
        let promote = !airline.state.is_funded();
        if promote && amount < self.config.min_airline_stake {
            return Err(FlightSuretyError::BelowMinimum {
                required: self.config.min_airline_stake,
                provided: amount,
            });
        }

        let mut batch = JournalBatch::new(tx_id);
        batch.transfer(
            LedgerAccount::External(caller.clone()),
            LedgerAccount::Escrow,
            amount,
            "airline stake",
        );
        session.store.commit_batch(&session.token, batch)?;

        let airline = session
            .store
            .airline_mut(&session.token, caller)
            .ok_or_else(|| FlightSuretyError::AirlineNotRegistered(caller.clone()))?;
        airline.deposit(amount);
        if promote {
            airline.transition_to(AirlineState::Funded)?;
            info!(stake = %airline.stake, "Airline funded");
        } else {
            debug!(stake = %airline.stake, "Airline stake topped up");
        }

        Ok((
            airline.stake,
            vec![Event::AirlineFunded {
                airline: caller.clone(),
                amount,
            }],
        ))
    }

    /// Publish a flight for the calling airline.
    #[instrument(skip(self, session), fields(caller = %caller, flight = %key))]
    pub fn register_flight(
        &self,
        session: &mut Session<'_>,
        caller: &Principal,
        key: &FlightKey,
    ) -> Result<Vec<Event>> {
        // Only the flight's own airline, once Funded, may publish it
        roles::funded_airline(session.store, caller)?;
        if caller != &key.airline {
            return Err(FlightSuretyError::NotFunded(caller.clone()));
        }

        if session.store.flight(key).is_some() {
            return Err(FlightSuretyError::AlreadyExists(key.to_string()));
        }

        session.store.put_flight(&session.token, Flight::new(key.clone()));
        info!("Flight registered");

        Ok(vec![Event::FlightRegistered { flight: key.clone() }])
    }
}
