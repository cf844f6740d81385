//! Escrow accounts and balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use flightsurety_common::{Amount, Principal};

/// An account in the escrow journal.
///
/// `External` accounts mirror value held outside the protocol; their balance
/// goes negative as value is deposited, so the sum over all accounts is
/// always zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAccount {
    /// A principal's wallet outside the protocol.
    External(Principal),
    /// Pooled stakes, premiums and fees.
    Escrow,
    /// Payouts owed to a passenger and not yet withdrawn.
    Credit(Principal),
}

impl fmt::Display for LedgerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerAccount::External(p) => write!(f, "external:{}", p),
            LedgerAccount::Escrow => write!(f, "escrow"),
            LedgerAccount::Credit(p) => write!(f, "credit:{}", p),
        }
    }
}

/// Account balance at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account identifier.
    pub account: LedgerAccount,
    /// Current balance.
    pub balance: Amount,
    /// When this balance was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    /// Create a new zero balance.
    pub fn zero(account: LedgerAccount) -> Self {
        Self {
            account,
            balance: Amount::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// Apply a signed change and return the new balance.
    pub fn apply(&mut self, delta: Amount) -> Amount {
        self.balance += delta;
        self.updated_at = Utc::now();
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_operations() {
        let mut balance = AccountBalance::zero(LedgerAccount::Escrow);

        assert_eq!(balance.apply(Amount::from_units(10)), Amount::from_units(10));
        assert_eq!(balance.apply(Amount::from_units(-4)), Amount::from_units(6));
    }

    #[test]
    fn test_account_display() {
        let account = LedgerAccount::Credit(Principal::new("PASSENGER_1"));
        assert_eq!(account.to_string(), "credit:PASSENGER_1");
        assert_eq!(LedgerAccount::Escrow.to_string(), "escrow");
    }
}
