//! Journal entry types for double-entry escrow bookkeeping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightsurety_common::{Amount, TxId};

use crate::balance::LedgerAccount;

/// Type of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Value leaves the account.
    Debit,
    /// Value enters the account.
    Credit,
}

/// A single journal entry in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Operation this entry belongs to.
    pub tx_id: TxId,
    /// Account affected.
    pub account: LedgerAccount,
    /// Entry type (debit or credit).
    pub entry_type: EntryType,
    /// Amount.
    pub amount: Amount,
    /// Balance after this entry (set when the batch is committed).
    pub balance_after: Amount,
    /// Free-form reason, e.g. "premium".
    pub memo: String,
    /// When this entry was created.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    fn new(
        tx_id: TxId,
        account: LedgerAccount,
        entry_type: EntryType,
        amount: Amount,
        memo: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_id,
            account,
            entry_type,
            amount,
            balance_after: Amount::ZERO,
            memo: memo.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Get signed amount (negative for debit, positive for credit).
    pub fn signed_amount(&self) -> Amount {
        match self.entry_type {
            EntryType::Debit => Amount::new(-self.amount.value()),
            EntryType::Credit => self.amount,
        }
    }
}

/// A batch of journal entries that must be committed together.
#[derive(Debug, Clone)]
pub struct JournalBatch {
    /// Entries in the batch.
    pub entries: Vec<JournalEntry>,
    /// Operation ID for the batch.
    pub tx_id: TxId,
}

impl JournalBatch {
    /// Create a new batch.
    pub fn new(tx_id: TxId) -> Self {
        Self {
            entries: Vec::new(),
            tx_id,
        }
    }

    /// Move `amount` from one account to another.
    pub fn transfer(
        &mut self,
        from: LedgerAccount,
        to: LedgerAccount,
        amount: Amount,
        memo: &str,
    ) -> &mut Self {
        self.entries
            .push(JournalEntry::new(self.tx_id, from, EntryType::Debit, amount, memo));
        self.entries
            .push(JournalEntry::new(self.tx_id, to, EntryType::Credit, amount, memo));
        self
    }

    /// Verify the batch is balanced (debits == credits).
    pub fn is_balanced(&self) -> bool {
        let net: Decimal = self
            .entries
            .iter()
            .map(|e| e.signed_amount().value())
            .sum();
        net.is_zero()
    }
}
