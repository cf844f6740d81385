//! Policies, payouts and withdrawals.
//!
//! Premiums flow from the passenger into the pooled escrow. On an
//! airline-caused delay each policy is credited once, moving the payout
//! from escrow into the passenger's credit account, and a withdrawal moves
//! the whole credit balance back out.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use flightsurety_common::{
    Amount, Event, FlightKey, FlightStatus, FlightSuretyError, Principal, Result, TxId,
};
use flightsurety_ledger::{JournalBatch, LedgerAccount, LedgerStore, Policy, Session};

use crate::config::InsuranceConfig;
use crate::roles;

/// A passenger's view of one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    /// Premium paid.
    pub premium: Amount,
    /// Amount owed if the airline causes a delay.
    pub payout: Amount,
    /// Whether the payout was credited.
    pub credited: bool,
}

/// Insurance sales and payouts.
pub struct InsuranceDesk {
    config: InsuranceConfig,
}

impl InsuranceDesk {
    /// Create a new insurance desk.
    pub fn new(config: InsuranceConfig) -> Self {
        Self { config }
    }

    /// Sell a policy on a registered, unresolved flight of a funded airline.
    #[instrument(skip(self, session), fields(passenger = %caller, flight = %key, amount = %amount))]
    pub fn buy_insurance(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        caller: &Principal,
        key: &FlightKey,
        amount: Amount,
    ) -> Result<Vec<Event>> {
        roles::available_airline(session.store, &key.airline)?;

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

        if !amount.is_positive() {
            return Err(FlightSuretyError::InvalidAmount(amount));
        }
        if amount > self.config.max_premium {
            return Err(FlightSuretyError::PremiumExceedsCap {
                cap: self.config.max_premium,
                provided: amount,
            });
        }
        if session.store.policy(key, caller).is_some() {
            return Err(FlightSuretyError::AlreadyExists(format!(
                "policy of {} on {}",
                caller, key
            )));
        }

        let mut batch = JournalBatch::new(tx_id);
        batch.transfer(
            LedgerAccount::External(caller.clone()),
            LedgerAccount::Escrow,
            amount,
            "premium",
        );
        session.store.commit_batch(&session.token, batch)?;
        session
            .store
            .put_policy(&session.token, Policy::new(caller.clone(), key.clone(), amount));

        info!("Insurance purchased");
        Ok(vec![Event::InsurancePurchased {
            passenger: caller.clone(),
            flight: key.clone(),
            amount,
        }])
    }

    /// Credit every uncredited policy on a flight that resolved as `status`.
    ///
    /// Only an airline-caused delay pays out; any other status credits
    /// nothing. The escrow transfer is committed before any policy is marked,
    /// so a failure leaves every policy untouched.
    #[instrument(skip(self, session), fields(flight = %key, status = %status))]
    pub fn credit_insurees(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        key: &FlightKey,
        status: FlightStatus,
    ) -> Result<Vec<Event>> {
        if !status.is_payable() {
            debug!("Status does not pay out");
            return Ok(Vec::new());
        }

        let payouts: Vec<(Principal, Amount)> = session
            .store
            .policies_for(key)
            .filter(|p| !p.credited)
            .map(|p| (p.passenger.clone(), p.payout(self.config.payout_multiplier)))
            .collect();
        if payouts.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = JournalBatch::new(tx_id);
        for (passenger, payout) in &payouts {
            batch.transfer(
                LedgerAccount::Escrow,
                LedgerAccount::Credit(passenger.clone()),
                *payout,
                "insuree credit",
            );
        }
        session.store.commit_batch(&session.token, batch)?;

        for policy in session.store.policies_for_mut(&session.token, key) {
            policy.mark_credited();
        }

        let total: Amount = payouts.iter().map(|(_, payout)| *payout).sum();
        info!(policies = payouts.len(), total = %total, "Insurees credited");

        Ok(payouts
            .into_iter()
            .map(|(passenger, amount)| Event::InsureeCredited {
                passenger,
                flight: key.clone(),
                amount,
            })
            .collect())
    }

    /// Pay out the caller's entire credit balance.
    ///
    /// A zero balance is a no-op returning zero.
    #[instrument(skip(self, session), fields(passenger = %caller))]
    pub fn withdraw(
        &self,
        session: &mut Session<'_>,
        tx_id: TxId,
        caller: &Principal,
    ) -> Result<(Amount, Vec<Event>)> {
        let account = LedgerAccount::Credit(caller.clone());
        let balance = session.store.balance(&account).unwrap_or(Amount::ZERO);
        if !balance.is_positive() {
            debug!("Nothing to withdraw");
            return Ok((Amount::ZERO, Vec::new()));
        }

        let mut batch = JournalBatch::new(tx_id);
        batch.transfer(
            account,
            LedgerAccount::External(caller.clone()),
            balance,
            "withdrawal",
        );
        session.store.commit_batch(&session.token, batch)?;

        info!(amount = %balance, "Credit withdrawn");
        Ok((
            balance,
            vec![Event::Withdrawn {
                passenger: caller.clone(),
                amount: balance,
            }],
        ))
    }

    /// Policy details, or `None` if the passenger never insured the flight.
    pub fn insurance_info(
        &self,
        store: &LedgerStore,
        key: &FlightKey,
        passenger: &Principal,
    ) -> Option<InsuranceInfo> {
        store.policy(key, passenger).map(|policy| InsuranceInfo {
            premium: policy.premium,
            payout: policy.payout(self.config.payout_multiplier),
            credited: policy.credited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsurety_common::{from_unix_seconds, AirlineState, CallerId};
    use flightsurety_ledger::{Airline, Flight, LedgerEngine};

    fn airline() -> Principal {
        Principal::new("AIRLINE_1")
    }

    fn passenger(n: usize) -> Principal {
        Principal::new(format!("PASSENGER_{}", n))
    }

    fn flight_key() -> FlightKey {
        FlightKey::new(airline(), "ND1309", from_unix_seconds(1_700_000_000).unwrap())
    }

    /// A ledger with one funded airline and one registered flight.
    fn ledger() -> LedgerEngine {
        let owner = Principal::new("OWNER");
        let mut ledger = LedgerEngine::new(owner.clone());
        ledger
            .gate_mut()
            .authorize_caller(&owner, CallerId::new("app"))
            .unwrap();

        let session = ledger.open(&CallerId::new("app")).unwrap();
        let mut record = Airline::candidate(airline());
        record.transition_to(AirlineState::Registered).unwrap();
        record.deposit(Amount::from_units(10));
        record.transition_to(AirlineState::Funded).unwrap();
        session.store.put_airline(&session.token, record);
        session.store.put_flight(&session.token, Flight::new(flight_key()));
        ledger
    }

    fn desk() -> InsuranceDesk {
        InsuranceDesk::new(InsuranceConfig::default())
    }

    #[test]
    fn test_buy_insurance_checks() {
        let mut ledger = ledger();
        let desk = desk();
        let mut session = ledger.open(&CallerId::new("app")).unwrap();

        let unknown_airline = FlightKey::new(
            Principal::new("AIRLINE_9"),
            "XX1",
            from_unix_seconds(1_700_000_000).unwrap(),
        );
        let err = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &unknown_airline, Amount::from_units(1))
            .unwrap_err();
        assert_eq!(err.error_code(), "AIRLINE_UNAVAILABLE");

        let unknown_flight = FlightKey::new(airline(), "XX1", from_unix_seconds(1).unwrap());
        let err = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &unknown_flight, Amount::from_units(1))
            .unwrap_err();
        assert_eq!(err, FlightSuretyError::FlightNotFound(unknown_flight));

        let err = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), Amount::from_units(2))
            .unwrap_err();
        assert!(matches!(err, FlightSuretyError::PremiumExceedsCap { .. }));

        let err = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), Amount::ZERO)
            .unwrap_err();
        assert_eq!(err, FlightSuretyError::InvalidAmount(Amount::ZERO));

        assert!(session.store.journal().is_empty());
        assert!(session.store.policy(&flight_key(), &passenger(1)).is_none());
    }

    #[test]
    fn test_one_policy_per_passenger() {
        let mut ledger = ledger();
        let desk = desk();
        let mut session = ledger.open(&CallerId::new("app")).unwrap();
        let premium = Amount::from_str("0.5").unwrap();

        let events = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), premium)
            .unwrap();
        assert_eq!(events.len(), 1);

        let err = desk
            .buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), premium)
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        assert_eq!(session.store.balance(&LedgerAccount::Escrow), Some(premium));

        let info = desk
            .insurance_info(session.store, &flight_key(), &passenger(1))
            .unwrap();
        assert_eq!(info.payout, Amount::from_str("0.75").unwrap());
        assert!(!info.credited);
    }

    #[test]
    fn test_credit_only_on_airline_delay() {
        let mut ledger = ledger();
        let desk = desk();
        let mut session = ledger.open(&CallerId::new("app")).unwrap();
        desk.buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), Amount::from_units(1))
            .unwrap();

        for status in [FlightStatus::OnTime, FlightStatus::LateWeather, FlightStatus::Unknown] {
            let events = desk
                .credit_insurees(&mut session, TxId::new(), &flight_key(), status)
                .unwrap();
            assert!(events.is_empty());
        }

        let events = desk
            .credit_insurees(&mut session, TxId::new(), &flight_key(), FlightStatus::LateAirline)
            .unwrap();
        assert_eq!(
            events,
            vec![Event::InsureeCredited {
                passenger: passenger(1),
                flight: flight_key(),
                amount: Amount::from_str("1.5").unwrap(),
            }]
        );

        // Each policy is credited at most once
        let events = desk
            .credit_insurees(&mut session, TxId::new(), &flight_key(), FlightStatus::LateAirline)
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(
            session.store.balance(&LedgerAccount::Credit(passenger(1))),
            Some(Amount::from_str("1.5").unwrap())
        );
    }

    #[test]
    fn test_withdraw_pays_once() {
        let mut ledger = ledger();
        let desk = desk();
        {
            let mut session = ledger.open(&CallerId::new("app")).unwrap();
            desk.buy_insurance(&mut session, TxId::new(), &passenger(1), &flight_key(), Amount::from_units(1))
                .unwrap();
            desk.credit_insurees(&mut session, TxId::new(), &flight_key(), FlightStatus::LateAirline)
                .unwrap();

            let (paid, events) = desk.withdraw(&mut session, TxId::new(), &passenger(1)).unwrap();
            assert_eq!(paid, Amount::from_str("1.5").unwrap());
            assert_eq!(events.len(), 1);

            let (paid, events) = desk.withdraw(&mut session, TxId::new(), &passenger(1)).unwrap();
            assert_eq!(paid, Amount::ZERO);
            assert!(events.is_empty());
        }

        assert_eq!(ledger.credit_balance(&passenger(1)), Amount::ZERO);
        assert_eq!(ledger.escrow_balance(), Amount::from_str("-0.5").unwrap());
        assert!(ledger.verify_integrity());
    }
}
