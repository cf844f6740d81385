//! Events emitted by state-changing operations for external subscribers.

use serde::{Deserialize, Serialize};

use crate::{Amount, FlightKey, FlightStatus, OracleIndex, Principal};

/// An event emitted by a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// Airline admitted (founder mode or consensus reached).
    AirlineRegistered { airline: Principal },
    /// Airline deposited stake.
    AirlineFunded { airline: Principal, amount: Amount },
    /// Flight published by its airline.
    FlightRegistered { flight: FlightKey },
    /// Passenger bought a policy.
    InsurancePurchased {
        passenger: Principal,
        flight: FlightKey,
        amount: Amount,
    },
    /// Oracle registered with its assigned indices.
    OracleRegistered {
        oracle: Principal,
        indices: [OracleIndex; 3],
    },
    /// Oracles holding `index` should report the status of `flight`.
    OracleRequest { index: OracleIndex, flight: FlightKey },
    /// An oracle's report was recorded.
    OracleReport {
        oracle: Principal,
        index: OracleIndex,
        flight: FlightKey,
        status: FlightStatus,
    },
    /// Quorum reached; the flight's status is now final.
    FlightStatusResolved {
        flight: FlightKey,
        status: FlightStatus,
    },
    /// A policy paid out into the passenger's credit balance.
    InsureeCredited {
        passenger: Principal,
        flight: FlightKey,
        amount: Amount,
    },
    /// Credited funds transferred out to the passenger.
    Withdrawn { passenger: Principal, amount: Amount },
    /// Owner switched the operational flag.
    OperatingStatusChanged { operational: bool },
}

impl Event {
    /// Event name as seen by subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            Event::AirlineRegistered { .. } => "AirlineRegistered",
            Event::AirlineFunded { .. } => "AirlineFunded",
            Event::FlightRegistered { .. } => "FlightRegistered",
            Event::InsurancePurchased { .. } => "InsurancePurchased",
            Event::OracleRegistered { .. } => "OracleRegistered",
            Event::OracleRequest { .. } => "OracleRequest",
            Event::OracleReport { .. } => "OracleReport",
            Event::FlightStatusResolved { .. } => "FlightStatusResolved",
            Event::InsureeCredited { .. } => "InsureeCredited",
            Event::Withdrawn { .. } => "Withdrawn",
            Event::OperatingStatusChanged { .. } => "OperatingStatusChanged",
        }
    }
}
