//! Oracle registration and quorum matching.
//!
//! A status request picks one index bucket and opens a round keyed by
//! (index, flight). Only oracles holding that index may answer, each at most
//! once per round. The first status to collect `quorum` matching reports
//! fixes the flight's status for good.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use flightsurety_common::{
    Amount, Event, FlightKey, FlightStatus, FlightSuretyError, OracleIndex, Principal, Result,
    RoundKey, TxId,
};
use flightsurety_crypto::hash_to_index;
use flightsurety_ledger::{
    JournalBatch, LedgerAccount, LedgerStore, OracleRegistration, ResponseRound, Session,
};

use crate::config::OracleConfig;
use crate::insurance::InsuranceDesk;
use crate::roles;

/// Why a report was dropped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// The flight's status is already final.
    FlightResolved,
    /// The oracle already reported in this round.
    DuplicateResponse,
}

/// Result of an oracle report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportOutcome {
    /// Counted; `count` reports now agree on the status.
    Recorded { count: usize },
    /// Quorum reached and the flight resolved.
    Resolved { status: FlightStatus, credited: usize },
    /// Dropped.
    Ignored(IgnoreReason),
}

/// Oracle registry and response matching.
pub struct OracleDesk {
    config: OracleConfig,
    seed: String,
}

impl OracleDesk {
    /// Create a new oracle desk. `seed` is mixed into every index draw.
    pub fn new(config: OracleConfig, seed: impl Into<String>) -> Self {
        Self {
            config,
            seed: seed.into(),
        }
    }

    /// Draw one index for `caller`, consuming a nonce.
    fn draw_index(&self, session: &mut Session<'_>, caller: &Principal) -> OracleIndex {
        let nonce = session.store.next_nonce(&session.token);
        hash_to_index(
            &[
                self.seed.as_bytes(),
                caller.as_str().as_bytes(),
                &nonce.to_be_bytes(),
            ],
            self.config.index_space,
        )
    }

    /// Draw three distinct indices. Terminates because the index space
    /// holds at least three values and every draw advances the nonce.
    fn draw_indices(&self, session: &mut Session<'_>, caller: &Principal) -> [OracleIndex; 3] {
        let first = self.draw_index(session, caller);

        let mut second = self.draw_index(session, caller);
        while second == first {
            second = self.draw_index(session, caller);
        }

        let mut third = self.draw_index(session, caller);
        while third == first || third == second {
            third = self.draw_index(session, caller);
        }

        [first, second, third]
    }

    /// Register the caller as an oracle and assign its indices.
    #[instrument(skip(self, session), fields(oracle = %caller, stake = %stake))]
    pub fn register_oracle(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        caller: &Principal,
        stake: Amount,
    ) -> Result<([OracleIndex; 3], Vec<Event>)> {
        if stake < self.config.registration_fee {
            return Err(FlightSuretyError::InsufficientStake {
                required: self.config.registration_fee,
                provided: stake,
            });
        }
        if session.store.oracle(caller).is_some() {
            return Err(FlightSuretyError::AlreadyRegistered(caller.clone()));
        }

        let mut batch = JournalBatch::new(tx_id);
        batch.transfer(
            LedgerAccount::External(caller.clone()),
            LedgerAccount::Escrow,
            stake,
            "oracle fee",
        );
        session.store.commit_batch(&session.token, batch)?;

        let indices = self.draw_indices(session, caller);
        session
            .store
            .put_oracle(&session.token, OracleRegistration::new(caller.clone(), indices, stake));

        info!(?indices, "Oracle registered");
        Ok((
            indices,
            vec![Event::OracleRegistered {
                oracle: caller.clone(),
                indices,
            }],
        ))
    }

    /// Ask the oracles holding a random index for the status of a flight.
    ///
    /// An open round under the same key is kept with its reports.
    #[instrument(skip(self, session), fields(requester = %caller, flight = %key))]
    pub fn fetch_flight_status(
        &self,
        session: &mut Session<'_>,
        caller: &Principal,
        key: &FlightKey,
    ) -> Result<(OracleIndex, Vec<Event>)> {
        let flight = session
            .store
            .flight(key)
            .ok_or_else(|| FlightSuretyError::FlightNotFound(key.clone()))?;
        if flight.is_resolved() {
            return Err(FlightSuretyError::NotMatchable(format!(
                "flight {} already resolved as {}",
                key, flight.status
            )));
        }

        let index = self.draw_index(session, caller);
        let round_key = RoundKey::new(index, key.clone());
        if session.store.round(&round_key).is_none() {
            session
                .store
                .put_round(&session.token, ResponseRound::open(round_key, caller.clone()));
            info!(index, "Oracle round opened");
        } else {
            debug!(index, "Oracle round already open");
        }

        Ok((
            index,
            vec![Event::OracleRequest {
                index,
                flight: key.clone(),
            }],
        ))
    }

    /// Record an oracle's report and resolve the flight on quorum.
    ///
    /// On resolution the insurees are credited through `insurance` before
    /// the round or flight is touched.
    #[instrument(skip(self, session, insurance), fields(oracle = %caller, flight = %key))]
    pub fn submit_oracle_response(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        insurance: &InsuranceDesk,
        caller: &Principal,
        index: OracleIndex,
        key: &FlightKey,
        code: u8,
    ) -> Result<(ReportOutcome, Vec<Event>)> {
        let oracle = roles::oracle(session.store, caller)?;
        if !oracle.0.has_index(index) {
            return Err(FlightSuretyError::NotRequested(format!(
                "index {} is not assigned to {}",
                index, caller
            )));
        }

        let status = FlightStatus::from_code(code)
            .ok_or_else(|| FlightSuretyError::NotMatchable(format!("unknown status code {}", code)))?;

        let round_key = RoundKey::new(index, key.clone());
        let round = session
            .store
            .round(&round_key)
            .ok_or_else(|| FlightSuretyError::NotRequested(format!("no open request {}", round_key)))?;

        let resolved = session
            .store
            .flight(key)
            .ok_or_else(|| FlightSuretyError::FlightNotFound(key.clone()))?
            .is_resolved();
        if resolved {
            debug!("Late report for resolved flight ignored");
            return Ok((ReportOutcome::Ignored(IgnoreReason::FlightResolved), Vec::new()));
        }
        if round.has_responded(caller) {
            debug!("Repeat report ignored");
            return Ok((ReportOutcome::Ignored(IgnoreReason::DuplicateResponse), Vec::new()));
        }

        let count = round.count(status) + 1;
        let reaches_quorum = count >= self.config.quorum;

        let credits = if reaches_quorum {
            insurance.credit_insurees(session, tx_id, key, status)?
        } else {
            Vec::new()
        };

        if let Some(round) = session.store.round_mut(&session.token, &round_key) {
            round.record(caller.clone(), status);
        }
        let mut events = vec![Event::OracleReport {
            oracle: caller.clone(),
            index,
            flight: key.clone(),
            status,
        }];

        if !reaches_quorum {
            debug!(%status, count, quorum = self.config.quorum, "Report recorded");
            return Ok((ReportOutcome::Recorded { count }, events));
        }

        if let Some(flight) = session.store.flight_mut(&session.token, key) {
            flight.resolve(status);
        }
        info!(%status, credited = credits.len(), "Flight status resolved");

        let credited = credits.len();
        events.push(Event::FlightStatusResolved {
            flight: key.clone(),
            status,
        });
        events.extend(credits);

        Ok((ReportOutcome::Resolved { status, credited }, events))
    }

    /// Indices assigned to a registered oracle.
    pub fn indices_of(&self, store: &LedgerStore, oracle: &Principal) -> Result<[OracleIndex; 3]> {
        store
            .oracle(oracle)
            .map(|registration| registration.indices)
            .ok_or_else(|| FlightSuretyError::not_found("oracle", oracle))
    }
}
