//! Flight status codes and the airline admission state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a flight as reported by oracles.
///
/// The numeric codes are part of the oracle wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FlightStatus {
    /// Not yet resolved.
    Unknown = 0,
    /// Departed on time.
    OnTime = 10,
    /// Delayed through the airline's fault.
    LateAirline = 20,
    /// Delayed by weather.
    LateWeather = 30,
    /// Delayed by a technical problem.
    LateTechnical = 40,
    /// Delayed for another reason.
    LateOther = 50,
}

impl FlightStatus {
    /// All status codes in ascending order.
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    /// Parse a wire status code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Get the wire status code.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Only airline-attributable delay makes policies pay out.
    pub fn is_payable(&self) -> bool {
        matches!(self, FlightStatus::LateAirline)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Admission state of an airline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirlineState {
    /// Candidate collecting registration votes.
    Unregistered,
    /// Admitted, but has not deposited the minimum stake.
    Registered,
    /// Stake deposited; may vote, register flights and sell insurance.
    Funded,
}

impl AirlineState {
    /// Get valid next states from current state.
    pub fn valid_transitions(&self) -> &[AirlineState] {
        match self {
            AirlineState::Unregistered => &[AirlineState::Registered],
            AirlineState::Registered => &[AirlineState::Funded],
            AirlineState::Funded => &[],
        }
    }

    /// Check if transition to given state is valid.
    pub fn can_transition_to(&self, next: AirlineState) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Registered or better.
    pub fn is_registered(&self) -> bool {
        !matches!(self, AirlineState::Unregistered)
    }

    /// Check if the airline has deposited its stake.
    pub fn is_funded(&self) -> bool {
        matches!(self, AirlineState::Funded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in FlightStatus::ALL {
            assert_eq!(FlightStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(FlightStatus::from_code(20), Some(FlightStatus::LateAirline));
        assert_eq!(FlightStatus::from_code(15), None);
        assert_eq!(FlightStatus::from_code(60), None);
    }

    #[test]
    fn test_only_airline_delay_is_payable() {
        let payable: Vec<_> = FlightStatus::ALL
            .into_iter()
            .filter(|s| s.is_payable())
            .collect();
        assert_eq!(payable, vec![FlightStatus::LateAirline]);
    }

    #[test]
    fn test_airline_transitions() {
        assert!(AirlineState::Unregistered.can_transition_to(AirlineState::Registered));
        assert!(AirlineState::Registered.can_transition_to(AirlineState::Funded));

        // No skipping, no reversal
        assert!(!AirlineState::Unregistered.can_transition_to(AirlineState::Funded));
        assert!(!AirlineState::Funded.can_transition_to(AirlineState::Registered));
        assert!(!AirlineState::Registered.can_transition_to(AirlineState::Unregistered));
    }

    #[test]
    fn test_registered_includes_funded() {
        assert!(!AirlineState::Unregistered.is_registered());
        assert!(AirlineState::Registered.is_registered());
        assert!(AirlineState::Funded.is_registered());
        assert!(!AirlineState::Registered.is_funded());
    }
}
