//! Engine configuration.

use rust_decimal::Decimal;

use flightsurety_common::{Amount, CallerId, Principal};

/// Airline admission configuration.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Registered airlines below which any funded airline admits alone.
    pub founder_limit: usize,
    /// Stake required to move from Registered to Funded.
    pub min_airline_stake: Amount,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            founder_limit: 4,
            min_airline_stake: Amount::from_units(10),
        }
    }
}

/// Policy configuration.
#[derive(Debug, Clone)]
pub struct InsuranceConfig {
    /// Maximum premium per policy.
    pub max_premium: Amount,
    /// Payout as a multiple of the premium on an airline-caused delay.
    pub payout_multiplier: Decimal,
}

impl Default for InsuranceConfig {
    fn default() -> Self {
        Self {
            max_premium: Amount::from_units(1),
            payout_multiplier: Decimal::new(15, 1),
        }
    }
}

/// Oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Fee to register an oracle.
    pub registration_fee: Amount,
    /// Matching responses needed to resolve a flight.
    pub quorum: usize,
    /// Indices are drawn from `0..index_space`.
    pub index_space: u8,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            registration_fee: Amount::from_units(1),
            quorum: 3,
            index_space: 10,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone)]
pub struct SuretyConfig {
    /// Identity allowed to pause the engine and manage callers.
    pub owner: Principal,
    /// Airline registered at genesis.
    pub first_airline: Principal,
    /// Identity the engine presents to the access gate.
    pub engine_id: CallerId,
    /// Seed mixed into oracle index derivation.
    pub seed: String,
    /// Buffered events per subscriber before lagging.
    pub event_capacity: usize,
    /// Airline admission configuration.
    pub consensus: ConsensusConfig,
    /// Policy configuration.
    pub insurance: InsuranceConfig,
    /// Oracle configuration.
    pub oracle: OracleConfig,
    /// Log level.
    pub log_level: String,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            owner: Principal::new("OWNER"),
            first_airline: Principal::new("AIRLINE_1"),
            engine_id: CallerId::new("flightsurety-app"),
            seed: "flightsurety".to_string(),
            event_capacity: 1024,
            consensus: ConsensusConfig::default(),
            insurance: InsuranceConfig::default(),
            oracle: OracleConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl SuretyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(owner) = std::env::var("SURETY_OWNER") {
            config.owner = Principal::new(owner);
        }

        if let Ok(airline) = std::env::var("SURETY_FIRST_AIRLINE") {
            config.first_airline = Principal::new(airline);
        }

        if let Ok(id) = std::env::var("SURETY_ENGINE_ID") {
            config.engine_id = CallerId::new(id);
        }

        if let Ok(seed) = std::env::var("SURETY_SEED") {
            config.seed = seed;
        }

        if let Ok(capacity) = std::env::var("SURETY_EVENT_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.event_capacity = capacity;
            }
        }

        if let Ok(stake) = std::env::var("SURETY_MIN_AIRLINE_STAKE") {
            if let Ok(stake) = Amount::from_str(&stake) {
                config.consensus.min_airline_stake = stake;
            }
        }

        if let Ok(premium) = std::env::var("SURETY_MAX_PREMIUM") {
            if let Ok(premium) = Amount::from_str(&premium) {
                config.insurance.max_premium = premium;
            }
        }

        if let Ok(fee) = std::env::var("SURETY_ORACLE_FEE") {
            if let Ok(fee) = Amount::from_str(&fee) {
                config.oracle.registration_fee = fee;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.owner.is_empty() {
            return Err("Owner identity cannot be empty".to_string());
        }

        if self.first_airline.is_empty() {
            return Err("First airline identity cannot be empty".to_string());
        }

        if self.event_capacity == 0 {
            return Err("Event capacity cannot be 0".to_string());
        }

        if self.consensus.founder_limit == 0 {
            return Err("Founder limit cannot be 0".to_string());
        }

        if !self.consensus.min_airline_stake.is_positive() {
            return Err("Minimum airline stake must be positive".to_string());
        }

        if !self.insurance.max_premium.is_positive() {
            return Err("Maximum premium must be positive".to_string());
        }

        if self.insurance.payout_multiplier < Decimal::ONE {
            return Err("Payout multiplier cannot be below 1".to_string());
        }

        if self.oracle.quorum == 0 {
            return Err("Oracle quorum cannot be 0".to_string());
        }

        // Three distinct indices per oracle
        if self.oracle.index_space < 3 {
            return Err("Oracle index space must hold at least 3 indices".to_string());
        }

        Ok(())
    }
}
