//! Ledger store abstraction and record types.
//!
//! The consumer validates instructions against point reads, then hands the
//! store a fully-resolved settlement to apply in one atomic transaction.
//! Every write path reports duplicates through [`StoreError::Conflict`], so
//! replayed work degrades to a no-op instead of double-applying.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instruction::{Instruction, OpKind};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Errors surfaced by a [`LedgerStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write — the row (or the whole
    /// settlement) was already applied.
    #[error("duplicate write: {0}")]
    Conflict(String),

    /// Any other persistence failure. Fatal to the batch being applied.
    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for the idempotent-replay outcome.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Lifecycle of a tick relative to a block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Declared, but its mint window has not opened yet.
    Deployed,
    /// Inside the mint window; mints are accepted.
    MintOpen,
    /// Past the mint window; transfers are accepted.
    MintClosed,
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deployed => write!(f, "deployed"),
            Self::MintOpen => write!(f, "mint-open"),
            Self::MintClosed => write!(f, "mint-closed"),
        }
    }
}

/// A deployed token: one row per tick, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDefinition {
    pub tick: String,
    pub creator: String,
    pub counterparty: String,
    pub block_number: u64,
    pub extrinsic_hash: String,
    /// Total supply shared among minters.
    pub amount: u64,
    /// First block of the mint window.
    pub start: u64,
    /// Last block of the mint window (inclusive).
    pub end: u64,
    pub created: DateTime<Utc>,
}

impl TokenDefinition {
    /// Phase of this tick at `block`.
    pub fn phase_at(&self, block: u64) -> TickPhase {
        if block < self.start {
            TickPhase::Deployed
        } else if block <= self.end {
            TickPhase::MintOpen
        } else {
            TickPhase::MintClosed
        }
    }

    /// Mints are valid only inside the window.
    pub fn mint_open(&self, block: u64) -> bool {
        self.phase_at(block) == TickPhase::MintOpen
    }

    /// Transfers are valid once the window has closed.
    pub fn transfer_open(&self, block: u64) -> bool {
        block >= self.end
    }
}

/// An account holding a balance of one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: String,
    pub tick: String,
    pub balance: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Append-only record of one balance-affecting event.
///
/// `extrinsic_hash` is unique: re-applying the settlement that produced an
/// entry conflicts instead of double-writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub from: String,
    pub to: String,
    pub block_number: u64,
    pub extrinsic_hash: String,
    pub tick: String,
    pub op: OpKind,
    pub delta: i64,
    pub timestamp: DateTime<Utc>,
}

/// Atomic write set for one mint tick-group.
#[derive(Debug, Clone)]
pub struct MintSettlement {
    pub tick: String,
    /// Equal share credited to every participating sender.
    pub share: u64,
    /// Accounts for senders minting this tick for the first time.
    pub new_accounts: Vec<AccountRecord>,
    /// Senders already holding this tick, credited in place.
    pub existing: Vec<String>,
    /// One `+share` entry per participating sender.
    pub audits: Vec<AuditEntry>,
    pub timestamp: DateTime<Utc>,
}

/// Atomic write set for one transfer instruction.
#[derive(Debug, Clone)]
pub struct TransferSettlement {
    pub tick: String,
    pub amount: u64,
    pub from: String,
    pub to: String,
    /// Debit-leg audit entry (`-amount` against `from`).
    pub audit: AuditEntry,
    pub timestamp: DateTime<Utc>,
}

// ─── LedgerStore ─────────────────────────────────────────────────────────────

/// Durable backing for the dot-20 ledger.
///
/// `apply_mint`, `apply_transfer`, and `log_instructions` are each one atomic
/// transaction; a [`StoreError::Conflict`] from any of them means the same
/// write already landed.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Point lookup of a token definition.
    async fn token_definition(&self, tick: &str)
        -> Result<Option<TokenDefinition>, StoreError>;

    /// First-writer-wins creation; `Conflict` if the tick is taken.
    async fn create_token_definition(
        &self,
        definition: TokenDefinition,
    ) -> Result<(), StoreError>;

    /// Current balance of `(address, tick)`, if the account exists.
    async fn account_balance(
        &self,
        address: &str,
        tick: &str,
    ) -> Result<Option<u64>, StoreError>;

    /// Which of `addresses` already hold an account for `tick`.
    async fn existing_accounts(
        &self,
        addresses: &[String],
        tick: &str,
    ) -> Result<HashSet<String>, StoreError>;

    /// Apply one mint tick-group atomically.
    async fn apply_mint(&self, settlement: MintSettlement) -> Result<(), StoreError>;

    /// Apply one transfer atomically.
    async fn apply_transfer(&self, settlement: TransferSettlement) -> Result<(), StoreError>;

    /// Bulk-append the raw batch; `Conflict` if any row already exists.
    async fn log_instructions(&self, instructions: &[Instruction]) -> Result<(), StoreError>;
}

// ─── In-memory store (tests and dev) ─────────────────────────────────────────

#[derive(Default)]
struct LedgerTables {
    definitions: HashMap<String, TokenDefinition>,
    accounts: HashMap<(String, String), AccountRecord>,
    audits: Vec<AuditEntry>,
    audit_hashes: HashSet<String>,
    raw_log: HashMap<String, Instruction>,
}

/// In-memory [`LedgerStore`] with the same conflict semantics as the SQLite
/// backend. All data is lost on drop.
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: Mutex<LedgerTables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit entries attributed to `(address, tick)`, oldest first.
    pub fn audit_entries(&self, address: &str, tick: &str) -> Vec<AuditEntry> {
        self.tables
            .lock()
            .unwrap()
            .audits
            .iter()
            .filter(|e| e.from == address && e.tick == tick)
            .cloned()
            .collect()
    }

    /// Total number of audit entries.
    pub fn audit_count(&self) -> usize {
        self.tables.lock().unwrap().audits.len()
    }

    /// Number of raw instruction rows.
    pub fn raw_count(&self) -> usize {
        self.tables.lock().unwrap().raw_log.len()
    }

    /// Sum of balances held for `tick`.
    pub fn minted_total(&self, tick: &str) -> u64 {
        self.tables
            .lock()
            .unwrap()
            .accounts
            .values()
            .filter(|a| a.tick == tick)
            .map(|a| a.balance)
            .sum()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn token_definition(
        &self,
        tick: &str,
    ) -> Result<Option<TokenDefinition>, StoreError> {
        Ok(self.tables.lock().unwrap().definitions.get(tick).cloned())
    }

    async fn create_token_definition(
        &self,
        definition: TokenDefinition,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.definitions.contains_key(&definition.tick) {
            return Err(StoreError::Conflict(format!(
                "tick {} already defined",
                definition.tick
            )));
        }
        tables.definitions.insert(definition.tick.clone(), definition);
        Ok(())
    }

    async fn account_balance(
        &self,
        address: &str,
        tick: &str,
    ) -> Result<Option<u64>, StoreError> {
        let key = (address.to_string(), tick.to_string());
        Ok(self.tables.lock().unwrap().accounts.get(&key).map(|a| a.balance))
    }

    async fn existing_accounts(
        &self,
        addresses: &[String],
        tick: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(addresses
            .iter()
            .filter(|a| tables.accounts.contains_key(&(a.to_string(), tick.to_string())))
            .cloned()
            .collect())
    }

    async fn apply_mint(&self, settlement: MintSettlement) -> Result<(), StoreError> {
        let MintSettlement {
            tick,
            share,
            new_accounts,
            existing,
            audits,
            timestamp,
        } = settlement;

        let mut tables = self.tables.lock().unwrap();
        for audit in &audits {
            if tables.audit_hashes.contains(&audit.extrinsic_hash) {
                return Err(StoreError::Conflict(format!(
                    "audit entry {} already recorded",
                    audit.extrinsic_hash
                )));
            }
        }
        for account in &new_accounts {
            let key = (account.address.clone(), account.tick.clone());
            if tables.accounts.contains_key(&key) {
                return Err(StoreError::Conflict(format!(
                    "account {}/{} already exists",
                    account.address, account.tick
                )));
            }
        }

        for audit in audits {
            tables.audit_hashes.insert(audit.extrinsic_hash.clone());
            tables.audits.push(audit);
        }
        for account in new_accounts {
            let key = (account.address.clone(), account.tick.clone());
            tables.accounts.insert(key, account);
        }
        for address in existing {
            if let Some(account) = tables.accounts.get_mut(&(address, tick.clone())) {
                account.balance += share;
                account.updated = timestamp;
            }
        }
        Ok(())
    }

    async fn apply_transfer(&self, settlement: TransferSettlement) -> Result<(), StoreError> {
        let TransferSettlement {
            tick,
            amount,
            from,
            to,
            audit,
            timestamp,
        } = settlement;

        let mut tables = self.tables.lock().unwrap();
        if tables.audit_hashes.contains(&audit.extrinsic_hash) {
            return Err(StoreError::Conflict(format!(
                "audit entry {} already recorded",
                audit.extrinsic_hash
            )));
        }

        let sender_key = (from.clone(), tick.clone());
        let sender = tables
            .accounts
            .get_mut(&sender_key)
            .ok_or_else(|| StoreError::Backend(format!("missing sender account {from}/{tick}")))?;
        sender.balance = sender
            .balance
            .checked_sub(amount)
            .ok_or_else(|| StoreError::Backend(format!("balance underflow for {from}/{tick}")))?;
        sender.updated = timestamp;

        let recipient_key = (to.clone(), tick.clone());
        let recipient = tables
            .accounts
            .entry(recipient_key)
            .or_insert_with(|| AccountRecord {
                address: to,
                tick,
                balance: 0,
                created: timestamp,
                updated: timestamp,
            });
        recipient.balance += amount;
        recipient.updated = timestamp;

        tables.audit_hashes.insert(audit.extrinsic_hash.clone());
        tables.audits.push(audit);
        Ok(())
    }

    async fn log_instructions(&self, instructions: &[Instruction]) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        for instruction in instructions {
            if tables.raw_log.contains_key(&instruction.extrinsic_hash) {
                return Err(StoreError::Conflict(format!(
                    "instruction {} already logged",
                    instruction.extrinsic_hash
                )));
            }
        }
        for instruction in instructions {
            tables
                .raw_log
                .insert(instruction.extrinsic_hash.clone(), instruction.clone());
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
