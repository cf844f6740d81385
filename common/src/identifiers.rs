//! Identifier types for FlightSurety protocol entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Timestamp;

/// Index bucket an oracle answers requests for.
pub type OracleIndex = u8;

/// Opaque identity of an account (owner, airline, passenger or oracle).
///
/// The core never authenticates principals itself; the execution platform
/// hands over an already verified identity with every call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create a new principal.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Principals are opaque; the only malformed one is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of a logic module allowed to mutate the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    /// Create a new caller ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of one atomic operation, shared by all journal entries it writes.
/// Uses UUID v7 for time-ordered identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(Uuid);

impl TxId {
    /// Create a new transaction ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a flight: operating airline, designator and scheduled departure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    /// Airline operating the flight.
    pub airline: Principal,
    /// Flight designator, e.g. "NH097".
    pub flight: String,
    /// Scheduled departure.
    pub timestamp: Timestamp,
}

impl FlightKey {
    /// Create a new flight key.
    pub fn new(airline: Principal, flight: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            airline,
            flight: flight.into(),
            timestamp,
        }
    }

    /// Create a canonical string representation.
    pub fn canonical(&self) -> String {
        format!(
            "{}:{}:{}",
            self.airline,
            self.flight,
            self.timestamp.timestamp()
        )
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Key of an oracle response round: the requested index plus the flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundKey {
    /// Index bucket the request was dispatched to.
    pub index: OracleIndex,
    /// Flight being queried.
    pub flight: FlightKey,
}

impl RoundKey {
    /// Create a new round key.
    pub fn new(index: OracleIndex, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.flight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_unix_seconds;

    #[test]
    fn test_tx_id_creation() {
        let id1 = TxId::new();
        let id2 = TxId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_tx_id_is_time_ordered() {
        let id = TxId::new();
        let parsed = Uuid::parse_str(&id.to_string()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_principal_is_opaque() {
        assert!(!Principal::new("AIRLINE_1").is_empty());
        assert!(!Principal::new("0xc1e07e06bdde797757ae50798f29cb2bf269bd58").is_empty());
        assert!(!Principal::new("airline-with-dash").is_empty());
        assert!(Principal::new("").is_empty());
    }

    #[test]
    fn test_flight_key_canonical() {
        let key = FlightKey::new(
            Principal::new("AIRLINE_5"),
            "NH097",
            from_unix_seconds(1_700_000_000).unwrap(),
        );
        assert_eq!(key.canonical(), "AIRLINE_5:NH097:1700000000");
        assert_eq!(RoundKey::new(7, key).to_string(), "7@AIRLINE_5:NH097:1700000000");
    }
}
