//! FlightSurety Engine
//!
//! Airline consensus, insurance escrow and oracle quorum on top of the gated
//! ledger. [`FlightSurety`] is the single entry point; every mutating
//! operation runs atomically under one writer lock.

pub mod config;
pub mod insurance;
pub mod metrics;
pub mod oracle;
pub mod registration;
pub mod roles;
pub mod surety;

pub use config::{ConsensusConfig, InsuranceConfig, OracleConfig, SuretyConfig};
pub use insurance::{InsuranceDesk, InsuranceInfo};
pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
pub use oracle::{IgnoreReason, OracleDesk, ReportOutcome};
pub use registration::{required_votes, AirlineRegistry, RegistrationOutcome};
pub use surety::FlightSurety;
