//! SQLite ledger store.
//!
//! Persists token definitions, accounts, audit entries, and the raw
//! instruction log to a single SQLite file. Uses `sqlx` with WAL mode; mint
//! groups and transfers are applied inside one transaction each, and
//! uniqueness violations surface as [`StoreError::Conflict`].
//!
//! # Usage
//! ```rust,no_run
//! use dotindex_storage::SqliteLedgerStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteLedgerStore::open("./ledger.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteLedgerStore::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use dotindex_core::instruction::Instruction;
use dotindex_core::store::{
    AuditEntry, LedgerStore, MintSettlement, StoreError, TokenDefinition, TransferSettlement,
};

/// SQLite-backed [`LedgerStore`].
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./ledger.db"`) or a full SQLite
    /// URL (`"sqlite:./ledger.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(store_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests. Pinned to
    /// one connection so every query sees the same memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(store_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS token_definitions (
                tick           TEXT PRIMARY KEY,
                creator        TEXT    NOT NULL,
                counterparty   TEXT    NOT NULL,
                block_number   INTEGER NOT NULL,
                extrinsic_hash TEXT    NOT NULL,
                amount         INTEGER NOT NULL,
                start_block    INTEGER NOT NULL,
                end_block      INTEGER NOT NULL,
                created        INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
                address TEXT    NOT NULL,
                tick    TEXT    NOT NULL,
                balance INTEGER NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL,
                PRIMARY KEY (address, tick)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        // extrinsic_hash is UNIQUE: replaying the settlement that produced an
        // entry conflicts and rolls the whole transaction back.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS audit_entries (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                sender         TEXT    NOT NULL,
                recipient      TEXT    NOT NULL,
                block_number   INTEGER NOT NULL,
                extrinsic_hash TEXT    NOT NULL UNIQUE,
                tick           TEXT    NOT NULL,
                op             TEXT    NOT NULL,
                delta          INTEGER NOT NULL,
                created        INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_audit_account ON audit_entries (sender, tick);",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS raw_instructions (
                extrinsic_hash  TEXT PRIMARY KEY,
                sender          TEXT    NOT NULL,
                recipient       TEXT    NOT NULL,
                block_number    INTEGER NOT NULL,
                extrinsic_index INTEGER NOT NULL,
                transfer_amount INTEGER NOT NULL,
                content         TEXT    NOT NULL,
                created         INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    // ─── Read helpers ───────────────────────────────────────────────────────

    /// Audit entries attributed to `(sender, tick)`, oldest first.
    pub async fn audit_entries(
        &self,
        sender: &str,
        tick: &str,
    ) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT sender, recipient, block_number, extrinsic_hash, tick, op, delta, created
             FROM audit_entries WHERE sender = ? AND tick = ? ORDER BY id",
        )
        .bind(sender)
        .bind(tick)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let op: String = row.get("op");
            entries.push(AuditEntry {
                from: row.get("sender"),
                to: row.get("recipient"),
                block_number: row.get::<i64, _>("block_number") as u64,
                extrinsic_hash: row.get("extrinsic_hash"),
                tick: row.get("tick"),
                op: op.parse().map_err(StoreError::Backend)?,
                delta: row.get("delta"),
                timestamp: from_millis(row.get("created")),
            });
        }
        Ok(entries)
    }

    /// Total number of audit entries.
    pub async fn audit_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM audit_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.get::<i64, _>("cnt") as u64)
    }

    /// Number of raw instruction rows.
    pub async fn raw_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM raw_instructions")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.get::<i64, _>("cnt") as u64)
    }

    /// Sum of balances held for `tick`.
    pub async fn minted_total(&self, tick: &str) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(balance), 0) AS total FROM accounts WHERE tick = ?",
        )
        .bind(tick)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.get::<i64, _>("total") as u64)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn token_definition(
        &self,
        tick: &str,
    ) -> Result<Option<TokenDefinition>, StoreError> {
        let row = sqlx::query(
            "SELECT tick, creator, counterparty, block_number, extrinsic_hash,
                    amount, start_block, end_block, created
             FROM token_definitions WHERE tick = ?",
        )
        .bind(tick)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|r| TokenDefinition {
            tick: r.get("tick"),
            creator: r.get("creator"),
            counterparty: r.get("counterparty"),
            block_number: r.get::<i64, _>("block_number") as u64,
            extrinsic_hash: r.get("extrinsic_hash"),
            amount: r.get::<i64, _>("amount") as u64,
            start: r.get::<i64, _>("start_block") as u64,
            end: r.get::<i64, _>("end_block") as u64,
            created: from_millis(r.get("created")),
        }))
    }

    async fn create_token_definition(
        &self,
        definition: TokenDefinition,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO token_definitions
             (tick, creator, counterparty, block_number, extrinsic_hash,
              amount, start_block, end_block, created)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&definition.tick)
        .bind(&definition.creator)
        .bind(&definition.counterparty)
        .bind(definition.block_number as i64)
        .bind(&definition.extrinsic_hash)
        .bind(definition.amount as i64)
        .bind(definition.start as i64)
        .bind(definition.end as i64)
        .bind(millis(definition.created))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        debug!(tick = %definition.tick, amount = definition.amount, "token definition created");
        Ok(())
    }

    async fn account_balance(
        &self,
        address: &str,
        tick: &str,
    ) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE address = ? AND tick = ?")
            .bind(address)
            .bind(tick)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(row.map(|r| r.get::<i64, _>("balance") as u64))
    }

    async fn existing_accounts(
        &self,
        addresses: &[String],
        tick: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let mut holders = HashSet::new();
        for address in addresses {
            let row = sqlx::query("SELECT 1 FROM accounts WHERE address = ? AND tick = ?")
                .bind(address)
                .bind(tick)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
            if row.is_some() {
                holders.insert(address.clone());
            }
        }
        Ok(holders)
    }

    async fn apply_mint(&self, settlement: MintSettlement) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        for audit in &settlement.audits {
            insert_audit(&mut tx, audit).await?;
        }
        for account in &settlement.new_accounts {
            sqlx::query(
                "INSERT INTO accounts (address, tick, balance, created, updated)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&account.address)
            .bind(&account.tick)
            .bind(account.balance as i64)
            .bind(millis(account.created))
            .bind(millis(account.updated))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        for address in &settlement.existing {
            sqlx::query(
                "UPDATE accounts SET balance = balance + ?, updated = ?
                 WHERE address = ? AND tick = ?",
            )
            .bind(settlement.share as i64)
            .bind(millis(settlement.timestamp))
            .bind(address)
            .bind(&settlement.tick)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        debug!(
            tick = %settlement.tick,
            share = settlement.share,
            minters = settlement.audits.len(),
            "mint group applied"
        );
        Ok(())
    }

    async fn apply_transfer(&self, settlement: TransferSettlement) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        insert_audit(&mut tx, &settlement.audit).await?;

        sqlx::query(
            "UPDATE accounts SET balance = balance - ?, updated = ?
             WHERE address = ? AND tick = ?",
        )
        .bind(settlement.amount as i64)
        .bind(millis(settlement.timestamp))
        .bind(&settlement.from)
        .bind(&settlement.tick)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "INSERT INTO accounts (address, tick, balance, created, updated)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (address, tick) DO UPDATE SET
                 balance = balance + excluded.balance,
                 updated = excluded.updated",
        )
        .bind(&settlement.to)
        .bind(&settlement.tick)
        .bind(settlement.amount as i64)
        .bind(millis(settlement.timestamp))
        .bind(millis(settlement.timestamp))
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        debug!(
            tick = %settlement.tick,
            from = %settlement.from,
            to = %settlement.to,
            amount = settlement.amount,
            "transfer applied"
        );
        Ok(())
    }

    async fn log_instructions(&self, instructions: &[Instruction]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        for instruction in instructions {
            sqlx::query(
                "INSERT INTO raw_instructions
                 (extrinsic_hash, sender, recipient, block_number, extrinsic_index,
                  transfer_amount, content, created)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&instruction.extrinsic_hash)
            .bind(&instruction.from)
            .bind(&instruction.to)
            .bind(instruction.block_number as i64)
            .bind(instruction.extrinsic_index as i64)
            .bind(instruction.transfer as i64)
            .bind(&instruction.raw_content)
            .bind(millis(instruction.timestamp))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }
}

async fn insert_audit(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    audit: &AuditEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO audit_entries
         (sender, recipient, block_number, extrinsic_hash, tick, op, delta, created)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&audit.from)
    .bind(&audit.to)
    .bind(audit.block_number as i64)
    .bind(&audit.extrinsic_hash)
    .bind(&audit.tick)
    .bind(audit.op.to_string())
    .bind(audit.delta)
    .bind(millis(audit.timestamp))
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;
    Ok(())
}

fn store_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(raw: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(raw).unwrap_or_default()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
