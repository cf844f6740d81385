//! FlightSurety Ledger
//!
//! Persistent entity store for airlines, flights, policies, oracles and
//! response rounds, wrapped by the access gate that decides who may mutate
//! it. Every value movement is recorded in a double-entry escrow journal.

pub mod access;
pub mod balance;
pub mod engine;
pub mod journal;
pub mod records;
pub mod store;

pub use access::{AccessGate, WriteToken};
pub use balance::{AccountBalance, LedgerAccount};
pub use engine::{LedgerEngine, Session};
pub use journal::{EntryType, JournalBatch, JournalEntry};
pub use records::{Airline, Flight, OracleRegistration, Policy, ResponseRound};
pub use store::LedgerStore;
