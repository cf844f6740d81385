//! Capability checks.
//!
//! Each operation resolves its caller into the role it needs before touching
//! the store. A role borrows the record that grants it, so a check cannot go
//! stale within the operation.

use flightsurety_common::{FlightSuretyError, Principal, Result};
use flightsurety_ledger::{Airline, LedgerStore, OracleRegistration};

/// An airline that has deposited its stake.
#[derive(Debug, Clone, Copy)]
pub struct FundedAirline<'a>(pub &'a Airline);

/// A registered oracle with its indices.
#[derive(Debug, Clone, Copy)]
pub struct Oracle<'a>(pub &'a OracleRegistration);

/// Resolve `caller` as a funded airline, for votes and flight registration.
pub fn funded_airline<'a>(store: &'a LedgerStore, caller: &Principal) -> Result<FundedAirline<'a>> {
    match store.airline(caller) {
        Some(airline) if airline.state.is_funded() => Ok(FundedAirline(airline)),
        _ => Err(FlightSuretyError::NotFunded(caller.clone())),
    }
}

/// Resolve `airline` as one that can sell insurance.
pub fn available_airline<'a>(store: &'a LedgerStore, airline: &Principal) -> Result<FundedAirline<'a>> {
    match store.airline(airline) {
        Some(record) if record.state.is_funded() => Ok(FundedAirline(record)),
        _ => Err(FlightSuretyError::AirlineUnavailable(airline.clone())),
    }
}

/// Resolve `airline` as admitted (Registered or Funded).
pub fn registered_airline<'a>(store: &'a LedgerStore, airline: &Principal) -> Result<&'a Airline> {
    match store.airline(airline) {
        Some(record) if record.state.is_registered() => Ok(record),
        _ => Err(FlightSuretyError::AirlineNotRegistered(airline.clone())),
    }
}

/// Resolve `caller` as a registered oracle.
pub fn oracle<'a>(store: &'a LedgerStore, caller: &Principal) -> Result<Oracle<'a>> {
    store
        .oracle(caller)
        .map(Oracle)
        .ok_or_else(|| FlightSuretyError::NotRequested(format!("{} is not a registered oracle", caller)))
}
