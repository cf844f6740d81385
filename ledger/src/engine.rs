//! Gated ledger: the store reachable only through the access gate.

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use flightsurety_common::{Amount, CallerId, Principal, Result};

use crate::access::{AccessGate, WriteToken};
use crate::balance::LedgerAccount;
use crate::journal::EntryType;
use crate::store::LedgerStore;

/// Write access for a single operation.
pub struct Session<'a> {
    /// Token proving the gate admitted the caller.
    pub token: WriteToken,
    /// The store to mutate.
    pub store: &'a mut LedgerStore,
}

/// The ledger engine owns the store and the gate in front of it.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    gate: AccessGate,
    store: LedgerStore,
}

impl LedgerEngine {
    /// Create a new ledger engine.
    pub fn new(owner: Principal) -> Self {
        Self {
            gate: AccessGate::new(owner),
            store: LedgerStore::new(),
        }
    }

    /// Access gate (read-only).
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Access gate, for owner administration.
    pub fn gate_mut(&mut self) -> &mut AccessGate {
        &mut self.gate
    }

    /// Read-only view of the store; queries bypass the gate.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Pass the gate and obtain write access for one operation.
    pub fn open(&mut self, caller: &CallerId) -> Result<Session<'_>> {
        let token = self.gate.authorize(caller)?;
        Ok(Session {
            token,
            store: &mut self.store,
        })
    }

    /// Balance owed to a passenger, zero if nothing was ever credited.
    pub fn credit_balance(&self, passenger: &Principal) -> Amount {
        self.store
            .balance(&LedgerAccount::Credit(passenger.clone()))
            .unwrap_or(Amount::ZERO)
    }

    /// Pooled escrow balance.
    pub fn escrow_balance(&self) -> Amount {
        self.store
            .balance(&LedgerAccount::Escrow)
            .unwrap_or(Amount::ZERO)
    }

    /// Verify ledger integrity: the journal balances and replays to the
    /// stored balances, and all balances sum to zero.
    #[instrument(skip(self))]
    pub fn verify_integrity(&self) -> bool {
        let journal = self.store.journal();

        let debits: Decimal = journal
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| e.amount.value())
            .sum();
        let credits: Decimal = journal
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| e.amount.value())
            .sum();
        if debits != credits {
            warn!(%debits, %credits, "Journal debits and credits differ");
            return false;
        }

        for balance in self.store.balances() {
            let replayed: Amount = journal
                .iter()
                .filter(|e| e.account == balance.account)
                .map(|e| e.signed_amount())
                .sum();
            if replayed != balance.balance {
                warn!(account = %balance.account, "Balance does not match journal");
                return false;
            }
        }

        let net: Amount = self.store.balances().map(|b| b.balance).sum();
        net.is_zero()
    }
}
