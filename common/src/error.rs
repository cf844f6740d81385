//! Error types for FlightSurety protocol.

use crate::{AirlineState, Amount, FlightKey, Principal};
use thiserror::Error;

/// Main error type for FlightSurety operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlightSuretyError {
    /// Operational switch is off.
    #[error("Contract is currently not operational")]
    NotOperational,

    /// Caller lacks the role or permission for the action.
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: String, action: String },

    /// Caller airline has not deposited its stake.
    #[error("Airline {0} is not funded")]
    NotFunded(Principal),

    /// Target airline cannot sell insurance.
    #[error("Airline {0} is not available")]
    AirlineUnavailable(Principal),

    /// Airline has not been admitted yet.
    #[error("Airline {0} is not registered")]
    AirlineNotRegistered(Principal),

    /// Duplicate create.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Principal already holds the role.
    #[error("Already registered: {0}")]
    AlreadyRegistered(Principal),

    /// Flight key is not registered.
    #[error("Flight not found: {0}")]
    FlightNotFound(FlightKey),

    /// Missing key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Airline funding below the required stake.
    #[error("Funding below minimum: required {required}, provided {provided}")]
    BelowMinimum { required: Amount, provided: Amount },

    /// Premium above the per-policy cap.
    #[error("Premium {provided} exceeds cap {cap}")]
    PremiumExceedsCap { cap: Amount, provided: Amount },

    /// Zero or negative value.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    /// Oracle registration fee not met.
    #[error("Insufficient stake: required {required}, provided {provided}")]
    InsufficientStake { required: Amount, provided: Amount },

    /// Response does not belong to an open request of this oracle.
    #[error("Not requested: {0}")]
    NotRequested(String),

    /// Request or response does not match the flight's state.
    #[error("Not matchable: {0}")]
    NotMatchable(String),

    /// Invalid airline state transition.
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: AirlineState, to: AirlineState },

    /// Journal batch whose debits and credits differ.
    #[error("Unbalanced journal batch {0}")]
    LedgerImbalance(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl FlightSuretyError {
    /// Build an authorization error.
    pub fn unauthorized(caller: impl ToString, action: impl Into<String>) -> Self {
        FlightSuretyError::Unauthorized {
            caller: caller.to_string(),
            action: action.into(),
        }
    }

    /// Build a not-found error.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        FlightSuretyError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Get error code for callers and event consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            FlightSuretyError::NotOperational => "NOT_OPERATIONAL",
            FlightSuretyError::Unauthorized { .. } => "UNAUTHORIZED",
            FlightSuretyError::NotFunded(_) => "NOT_FUNDED",
            FlightSuretyError::AirlineUnavailable(_) => "AIRLINE_UNAVAILABLE",
            FlightSuretyError::AirlineNotRegistered(_) => "AIRLINE_NOT_REGISTERED",
            FlightSuretyError::AlreadyExists(_) => "ALREADY_EXISTS",
            FlightSuretyError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            FlightSuretyError::FlightNotFound(_) => "FLIGHT_NOT_FOUND",
            FlightSuretyError::NotFound { .. } => "NOT_FOUND",
            FlightSuretyError::BelowMinimum { .. } => "BELOW_MINIMUM",
            FlightSuretyError::PremiumExceedsCap { .. } => "PREMIUM_EXCEEDS_CAP",
            FlightSuretyError::InvalidAmount(_) => "INVALID_AMOUNT",
            FlightSuretyError::InsufficientStake { .. } => "INSUFFICIENT_STAKE",
            FlightSuretyError::NotRequested(_) => "NOT_REQUESTED",
            FlightSuretyError::NotMatchable(_) => "NOT_MATCHABLE",
            FlightSuretyError::InvalidTransition { .. } => "INVALID_TRANSITION",
            FlightSuretyError::LedgerImbalance(_) => "LEDGER_IMBALANCE",
            FlightSuretyError::ConfigurationError(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for FlightSurety operations.
pub type Result<T> = std::result::Result<T, FlightSuretyError>;
