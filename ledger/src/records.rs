//! Entity records held by the ledger store.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use flightsurety_common::{
    now, AirlineState, Amount, FlightKey, FlightStatus, FlightSuretyError, OracleIndex,
    Principal, Result, RoundKey, Timestamp,
};

/// An airline and its admission progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    /// Airline identity.
    pub id: Principal,
    /// Admission state.
    pub state: AirlineState,
    /// Accumulated stake.
    pub stake: Amount,
    /// Distinct airlines that voted for this candidate.
    pub voters: BTreeSet<Principal>,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl Airline {
    /// A candidate with no votes yet.
    pub fn candidate(id: Principal) -> Self {
        let now = now();
        Self {
            id,
            state: AirlineState::Unregistered,
            stake: Amount::ZERO,
            voters: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of distinct votes collected.
    pub fn vote_count(&self) -> usize {
        self.voters.len()
    }

    /// Record a vote. Returns false if this voter already voted.
    pub fn add_vote(&mut self, voter: Principal) -> bool {
        let added = self.voters.insert(voter);
        if added {
            self.updated_at = now();
        }
        added
    }

    /// Move to the next admission state.
    pub fn transition_to(&mut self, next: AirlineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(FlightSuretyError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        self.state = next;
        if next.is_registered() {
            // The voting window is over
            self.voters.clear();
        }
        self.updated_at = now();
        Ok(())
    }

    /// Add to the stake.
    pub fn deposit(&mut self, amount: Amount) {
        self.stake += amount;
        self.updated_at = now();
    }
}

/// A published flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    /// Composite key.
    pub key: FlightKey,
    /// Current status code.
    pub status: FlightStatus,
    /// Registration flag.
    pub registered: bool,
    /// When the flight was registered.
    pub registered_at: Timestamp,
    /// When oracle quorum fixed the status.
    pub resolved_at: Option<Timestamp>,
}

impl Flight {
    /// A freshly registered flight with unknown status.
    pub fn new(key: FlightKey) -> Self {
        Self {
            key,
            status: FlightStatus::Unknown,
            registered: true,
            registered_at: now(),
            resolved_at: None,
        }
    }

    /// Whether quorum has been reached. A flight may resolve to `Unknown`.
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Fix the status. Returns false if it was already fixed.
    pub fn resolve(&mut self, status: FlightStatus) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.status = status;
        self.resolved_at = Some(now());
        true
    }
}

/// A passenger's insurance on one flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Insured passenger.
    pub passenger: Principal,
    /// Insured flight.
    pub flight: FlightKey,
    /// Premium paid.
    pub premium: Amount,
    /// Whether the payout has been credited.
    pub credited: bool,
    /// When the policy was bought.
    pub purchased_at: Timestamp,
}

impl Policy {
    /// Create a new, uncredited policy.
    pub fn new(passenger: Principal, flight: FlightKey, premium: Amount) -> Self {
        Self {
            passenger,
            flight,
            premium,
            credited: false,
            purchased_at: now(),
        }
    }

    /// Payout owed on an airline-caused delay.
    pub fn payout(&self, multiplier: Decimal) -> Amount {
        self.premium.scaled(multiplier)
    }

    /// Mark as credited. Returns false if it already was.
    pub fn mark_credited(&mut self) -> bool {
        if self.credited {
            return false;
        }
        self.credited = true;
        true
    }
}

/// An oracle and the index buckets it answers for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRegistration {
    /// Oracle identity.
    pub oracle: Principal,
    /// Assigned indices, fixed at registration.
    pub indices: [OracleIndex; 3],
    /// Registration fee paid.
    pub stake: Amount,
    /// When the oracle registered.
    pub registered_at: Timestamp,
}

impl OracleRegistration {
    /// Create a new registration.
    pub fn new(oracle: Principal, indices: [OracleIndex; 3], stake: Amount) -> Self {
        Self {
            oracle,
            indices,
            stake,
            registered_at: now(),
        }
    }

    /// Check if the oracle answers requests for `index`.
    pub fn has_index(&self, index: OracleIndex) -> bool {
        self.indices.contains(&index)
    }
}

/// Reports collected for one oracle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRound {
    /// Round key.
    pub key: RoundKey,
    /// Who asked for the status.
    pub requester: Principal,
    /// Oracles per reported status, in arrival order.
    pub responses: BTreeMap<FlightStatus, Vec<Principal>>,
    /// When the request was made.
    pub opened_at: Timestamp,
}

impl ResponseRound {
    /// Open a new round.
    pub fn open(key: RoundKey, requester: Principal) -> Self {
        Self {
            key,
            requester,
            responses: BTreeMap::new(),
            opened_at: now(),
        }
    }

    /// Check if the oracle already reported in this round, for any status.
    pub fn has_responded(&self, oracle: &Principal) -> bool {
        self.responses.values().any(|voters| voters.contains(oracle))
    }

    /// Append a report and return the size of its bucket.
    pub fn record(&mut self, oracle: Principal, status: FlightStatus) -> usize {
        let bucket = self.responses.entry(status).or_default();
        bucket.push(oracle);
        bucket.len()
    }

    /// Number of reports for a status.
    pub fn count(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsurety_common::from_unix_seconds;
    use rust_decimal_macros::dec;

    fn flight_key() -> FlightKey {
        FlightKey::new(
            Principal::new("AIRLINE_1"),
            "ND1309",
            from_unix_seconds(1_700_000_000).unwrap(),
        )
    }

    #[test]
    fn test_airline_votes_are_deduplicated() {
        let mut airline = Airline::candidate(Principal::new("AIRLINE_5"));

        assert!(airline.add_vote(Principal::new("AIRLINE_1")));
        assert!(!airline.add_vote(Principal::new("AIRLINE_1")));
        assert!(airline.add_vote(Principal::new("AIRLINE_2")));
        assert_eq!(airline.vote_count(), 2);
    }

    #[test]
    fn test_airline_cannot_skip_registration() {
        let mut airline = Airline::candidate(Principal::new("AIRLINE_5"));

        assert!(airline.transition_to(AirlineState::Funded).is_err());
        airline.transition_to(AirlineState::Registered).unwrap();
        airline.transition_to(AirlineState::Funded).unwrap();
        assert!(airline.transition_to(AirlineState::Registered).is_err());
    }

    #[test]
    fn test_flight_resolves_once() {
        let mut flight = Flight::new(flight_key());
        assert!(!flight.is_resolved());

        assert!(flight.resolve(FlightStatus::Unknown));
        assert!(flight.is_resolved());
        assert!(!flight.resolve(FlightStatus::LateAirline));
        assert_eq!(flight.status, FlightStatus::Unknown);
    }

    #[test]
    fn test_policy_payout_and_credit() {
        let mut policy = Policy::new(Principal::new("PASSENGER_1"), flight_key(), Amount::from_units(1));

        assert_eq!(policy.payout(dec!(1.5)), Amount::new(dec!(1.5)));
        assert!(policy.mark_credited());
        assert!(!policy.mark_credited());
        assert!(policy.credited);
    }

    #[test]
    fn test_round_tracks_responders() {
        let key = RoundKey::new(3, flight_key());
        let mut round = ResponseRound::open(key, Principal::new("PASSENGER_1"));

        assert_eq!(round.record(Principal::new("ORACLE_1"), FlightStatus::OnTime), 1);
        assert_eq!(round.record(Principal::new("ORACLE_2"), FlightStatus::OnTime), 2);
        assert_eq!(round.record(Principal::new("ORACLE_3"), FlightStatus::LateWeather), 1);

        assert!(round.has_responded(&Principal::new("ORACLE_3")));
        assert!(!round.has_responded(&Principal::new("ORACLE_4")));
        assert_eq!(round.count(FlightStatus::OnTime), 2);
        assert_eq!(round.count(FlightStatus::LateAirline), 0);
    }
}
