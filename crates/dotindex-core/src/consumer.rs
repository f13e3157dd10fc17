//! Ledger consumer — drains block batches and applies the dot-20 rules.
//!
//! Batches are applied one at a time, deploy → mint → transfer within each
//! batch, so a tick deployed in a block is visible to mints in the same
//! block. Every ledger mutation is one store transaction; duplicate writes
//! surface as conflicts and are swallowed at the scope that produced them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ConsumerConfig;
use crate::error::IndexError;
use crate::instruction::{BlockBatch, Instruction, OpKind, Operation};
use crate::pipeline::PipelineCoordinator;
use crate::store::{
    AccountRecord, AuditEntry, LedgerStore, MintSettlement, TokenDefinition, TransferSettlement,
};

pub struct LedgerConsumer<S> {
    store: Arc<S>,
    pipeline: Arc<PipelineCoordinator>,
    config: ConsumerConfig,
}

impl<S: LedgerStore> LedgerConsumer<S> {
    pub fn new(store: Arc<S>, pipeline: Arc<PipelineCoordinator>, config: ConsumerConfig) -> Self {
        Self {
            store,
            pipeline,
            config,
        }
    }

    /// Drain the pipeline until a non-conflict store failure.
    ///
    /// Conflicts are idempotent-replay outcomes and never stop the loop; any
    /// other store failure propagates so the process can restart against the
    /// idempotent ledger.
    pub async fn run(&self) -> Result<(), IndexError> {
        if let Some(genesis) = self.config.genesis.clone() {
            self.ensure_genesis(genesis).await?;
        }
        loop {
            let Some(batch) = self.pipeline.pop() else {
                tokio::time::sleep(Duration::from_millis(self.config.idle_poll_ms)).await;
                continue;
            };
            let started = Instant::now();
            let block = batch.block_number;
            let count = batch.len();
            self.apply_batch(batch).await?;
            debug!(
                block,
                instructions = count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch applied"
            );
        }
    }

    /// Install a pre-agreed definition if no writer beat us to it.
    async fn ensure_genesis(&self, genesis: TokenDefinition) -> Result<(), IndexError> {
        if self.store.token_definition(&genesis.tick).await?.is_some() {
            return Ok(());
        }
        let tick = genesis.tick.clone();
        match self.store.create_token_definition(genesis).await {
            Err(e) if e.is_conflict() => Ok(()),
            Err(e) => Err(e.into()),
            Ok(()) => {
                info!(tick = %tick, "genesis definition installed");
                Ok(())
            }
        }
    }

    /// Apply one block's instructions in deploy → mint → transfer order, then
    /// persist the raw batch.
    pub async fn apply_batch(&self, batch: BlockBatch) -> Result<(), IndexError> {
        let mut deploys = Vec::new();
        let mut mints = Vec::new();
        let mut transfers = Vec::new();
        for instruction in &batch.instructions {
            match instruction.operation.kind() {
                OpKind::Deploy => deploys.push(instruction),
                OpKind::Mint => mints.push(instruction),
                OpKind::Transfer => transfers.push(instruction),
            }
        }

        self.apply_deploys(&deploys).await?;
        self.apply_mints(&mints).await?;
        self.apply_transfers(&transfers).await?;

        match self.store.log_instructions(&batch.instructions).await {
            Err(e) if e.is_conflict() => {
                debug!(block = batch.block_number, "raw batch already logged");
                Ok(())
            }
            other => Ok(other?),
        }
    }

    async fn apply_deploys(&self, deploys: &[&Instruction]) -> Result<(), IndexError> {
        for instruction in deploys {
            let Operation::Deploy {
                tick,
                amount,
                start,
                end,
            } = &instruction.operation
            else {
                continue;
            };
            let Some(start) = *start else {
                warn!(payload = %instruction.trim_content, "deploy without start block");
                continue;
            };
            let end = end.unwrap_or(start + self.config.mint_window_blocks);
            if end < start {
                warn!(payload = %instruction.trim_content, "deploy window ends before it starts");
                continue;
            }
            if self.store.token_definition(tick).await?.is_some() {
                warn!(tick = %tick, payload = %instruction.trim_content, "tick already deployed");
                continue;
            }
            let definition = TokenDefinition {
                tick: tick.clone(),
                creator: instruction.from.clone(),
                counterparty: instruction.to.clone(),
                block_number: instruction.block_number,
                extrinsic_hash: instruction.extrinsic_hash.clone(),
                amount: amount.unwrap_or(self.config.default_supply),
                start,
                end,
                created: instruction.timestamp,
            };
            match self.store.create_token_definition(definition).await {
                Err(e) if e.is_conflict() => {
                    debug!(tick = %tick, "definition already created");
                }
                other => other?,
            }
        }
        Ok(())
    }

    async fn apply_mints(&self, mints: &[&Instruction]) -> Result<(), IndexError> {
        // Group by tick, first-seen order; within a group the last
        // instruction per sender wins.
        let mut ticks: Vec<String> = Vec::new();
        let mut by_tick: HashMap<String, Vec<&Instruction>> = HashMap::new();
        for &instruction in mints {
            let tick = instruction.operation.tick().to_string();
            let group = by_tick.entry(tick.clone()).or_default();
            if group.is_empty() {
                ticks.push(tick);
            }
            group.push(instruction);
        }

        for tick in &ticks {
            let mut senders: Vec<&str> = Vec::new();
            let mut last_per_sender: HashMap<&str, &Instruction> = HashMap::new();
            for &instruction in &by_tick[tick.as_str()] {
                if last_per_sender
                    .insert(instruction.from.as_str(), instruction)
                    .is_none()
                {
                    senders.push(instruction.from.as_str());
                }
            }
            self.apply_mint_group(tick, &senders, &last_per_sender).await?;
        }
        Ok(())
    }

    async fn apply_mint_group(
        &self,
        tick: &str,
        senders: &[&str],
        last_per_sender: &HashMap<&str, &Instruction>,
    ) -> Result<(), IndexError> {
        // All instructions in a batch come from one block; any of them can
        // stand in for the group.
        let first = last_per_sender[senders[0]];
        let Some(definition) = self.store.token_definition(tick).await? else {
            warn!(tick, payload = %first.trim_content, "mint without deploy");
            return Ok(());
        };
        let block = first.block_number;
        if !definition.mint_open(block) {
            warn!(
                tick,
                block,
                phase = %definition.phase_at(block),
                payload = %first.trim_content,
                "mint outside window"
            );
            return Ok(());
        }

        // Equal split, floor division; the remainder stays unallocated.
        let share = definition.amount / senders.len() as u64;
        let addresses: Vec<String> = senders.iter().map(|s| s.to_string()).collect();
        let holding = self.store.existing_accounts(&addresses, tick).await?;

        let mut settlement = MintSettlement {
            tick: tick.to_string(),
            share,
            new_accounts: Vec::new(),
            existing: Vec::new(),
            audits: Vec::new(),
            timestamp: first.timestamp,
        };
        for sender in senders {
            let instruction = last_per_sender[sender];
            settlement.audits.push(AuditEntry {
                from: instruction.from.clone(),
                to: instruction.to.clone(),
                block_number: instruction.block_number,
                extrinsic_hash: instruction.extrinsic_hash.clone(),
                tick: tick.to_string(),
                op: OpKind::Mint,
                delta: share as i64,
                timestamp: instruction.timestamp,
            });
            if holding.contains(*sender) {
                settlement.existing.push(sender.to_string());
            } else {
                settlement.new_accounts.push(AccountRecord {
                    address: sender.to_string(),
                    tick: tick.to_string(),
                    balance: share,
                    created: instruction.timestamp,
                    updated: instruction.timestamp,
                });
            }
        }

        match self.store.apply_mint(settlement).await {
            Err(e) if e.is_conflict() => {
                debug!(tick, block, "mint group already applied");
                Ok(())
            }
            other => Ok(other?),
        }
    }

    async fn apply_transfers(&self, transfers: &[&Instruction]) -> Result<(), IndexError> {
        for instruction in transfers {
            let Operation::Transfer { tick, amount } = &instruction.operation else {
                continue;
            };
            if instruction.from == instruction.to {
                warn!(payload = %instruction.trim_content, "transfer to self");
                continue;
            }
            if *amount <= 0 {
                warn!(payload = %instruction.trim_content, "transfer amount not positive");
                continue;
            }
            let amount = *amount as u64;
            let Some(definition) = self.store.token_definition(tick).await? else {
                warn!(tick = %tick, payload = %instruction.trim_content, "transfer without deploy");
                continue;
            };
            if !definition.transfer_open(instruction.block_number) {
                warn!(
                    tick = %tick,
                    block = instruction.block_number,
                    phase = %definition.phase_at(instruction.block_number),
                    payload = %instruction.trim_content,
                    "transfer before mint window closed"
                );
                continue;
            }
            let balance = self
                .store
                .account_balance(&instruction.from, tick)
                .await?
                .unwrap_or(0);
            if balance < amount {
                warn!(
                    tick = %tick,
                    balance,
                    amount,
                    payload = %instruction.trim_content,
                    "transfer exceeds balance"
                );
                continue;
            }

            let settlement = TransferSettlement {
                tick: tick.clone(),
                amount,
                from: instruction.from.clone(),
                to: instruction.to.clone(),
                audit: AuditEntry {
                    from: instruction.from.clone(),
                    to: instruction.to.clone(),
                    block_number: instruction.block_number,
                    extrinsic_hash: instruction.extrinsic_hash.clone(),
                    tick: tick.clone(),
                    op: OpKind::Transfer,
                    delta: -(amount as i64),
                    timestamp: instruction.timestamp,
                },
                timestamp: instruction.timestamp,
            };
            match self.store.apply_transfer(settlement).await {
                Err(e) if e.is_conflict() => {
                    debug!(
                        tick = %tick,
                        extrinsic = %instruction.extrinsic_hash,
                        "transfer already applied"
                    );
                }
                other => other?,
            }
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::store::MemoryLedgerStore;
    use chrono::{DateTime, Utc};

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_703_081_268_000).unwrap()
    }

    fn instruction(block: u64, from: &str, to: &str, operation: Operation) -> Instruction {
        let tag = format!("{}-{block}-{from}", operation.kind());
        Instruction {
            block_number: block,
            block_hash: format!("0xblock{block}"),
            extrinsic_index: 0,
            extrinsic_hash: format!("0x{tag}"),
            from: from.into(),
            to: to.into(),
            transfer: 1_000_000_000,
            raw_content: format!("{{'p': 'dot-20', 'op': '{}'}}", operation.kind()),
            trim_content: format!("{{\"p\":\"dot-20\",\"op\":\"{}\"}}", operation.kind()),
            operation,
            timestamp: at(),
        }
    }

    fn deploy(block: u64, from: &str, tick: &str, amount: u64, start: u64, end: u64) -> Instruction {
        instruction(
            block,
            from,
            from,
            Operation::Deploy {
                tick: tick.into(),
                amount: Some(amount),
                start: Some(start),
                end: Some(end),
            },
        )
    }

    fn mint(block: u64, from: &str, tick: &str) -> Instruction {
        instruction(block, from, from, Operation::Mint { tick: tick.into() })
    }

    fn transfer(block: u64, from: &str, to: &str, tick: &str, amount: i64) -> Instruction {
        instruction(
            block,
            from,
            to,
            Operation::Transfer {
                tick: tick.into(),
                amount,
            },
        )
    }

    fn batch(block_number: u64, instructions: Vec<Instruction>) -> BlockBatch {
        BlockBatch {
            block_number,
            instructions,
        }
    }

    fn consumer(store: &Arc<MemoryLedgerStore>) -> LedgerConsumer<MemoryLedgerStore> {
        LedgerConsumer::new(
            Arc::clone(store),
            Arc::new(PipelineCoordinator::new(PipelineConfig::default())),
            ConsumerConfig::default(),
        )
    }

    async fn balance(store: &MemoryLedgerStore, address: &str, tick: &str) -> Option<u64> {
        store.account_balance(address, tick).await.unwrap()
    }

    #[tokio::test]
    async fn deploy_creates_definition() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "alice", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();

        let def = store.token_definition("doge").await.unwrap().unwrap();
        assert_eq!(def.creator, "alice");
        assert_eq!(def.amount, 1_000_000);
        assert_eq!((def.start, def.end), (100, 200));
    }

    #[tokio::test]
    async fn deploy_defaults_supply_and_window() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(
                50,
                vec![instruction(
                    50,
                    "alice",
                    "alice",
                    Operation::Deploy {
                        tick: "bare".into(),
                        amount: None,
                        start: Some(50),
                        end: None,
                    },
                )],
            ))
            .await
            .unwrap();

        let def = store.token_definition("bare").await.unwrap().unwrap();
        assert_eq!(def.amount, 5_000_000);
        assert_eq!(def.end, 50 + 420_000);
    }

    #[tokio::test]
    async fn deploy_without_start_is_skipped() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(
                50,
                vec![instruction(
                    50,
                    "alice",
                    "alice",
                    Operation::Deploy {
                        tick: "nope".into(),
                        amount: Some(1),
                        start: None,
                        end: None,
                    },
                )],
            ))
            .await
            .unwrap();

        assert!(store.token_definition("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deploy_duplicate_tick_keeps_first() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "alice", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(101, vec![deploy(101, "mallory", "doge", 7, 101, 102)]))
            .await
            .unwrap();

        let def = store.token_definition("doge").await.unwrap().unwrap();
        assert_eq!(def.creator, "alice");
        assert_eq!(def.amount, 1_000_000);
    }

    #[tokio::test]
    async fn deploy_with_inverted_window_is_skipped() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(
                100,
                vec![instruction(
                    100,
                    "alice",
                    "alice",
                    Operation::Deploy {
                        tick: "inv".into(),
                        amount: Some(10),
                        start: Some(200),
                        end: Some(100),
                    },
                )],
            ))
            .await
            .unwrap();

        assert!(store.token_definition("inv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn two_minters_split_supply_evenly() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(
                150,
                vec![mint(150, "alice", "doge"), mint(150, "bob", "doge")],
            ))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "doge").await, Some(500_000));
        assert_eq!(balance(&store, "bob", "doge").await, Some(500_000));
    }

    #[tokio::test]
    async fn three_minters_truncate_leaving_remainder_unallocated() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(
                150,
                vec![
                    mint(150, "alice", "doge"),
                    mint(150, "bob", "doge"),
                    mint(150, "carol", "doge"),
                ],
            ))
            .await
            .unwrap();

        for who in ["alice", "bob", "carol"] {
            assert_eq!(balance(&store, who, "doge").await, Some(333_333));
        }
        assert_eq!(store.minted_total("doge"), 999_999);
    }

    #[tokio::test]
    async fn mint_outside_window_is_ignored() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(250, vec![mint(250, "late", "doge")]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(99, vec![mint(99, "early", "doge")]))
            .await
            .unwrap();

        assert_eq!(balance(&store, "late", "doge").await, None);
        assert_eq!(balance(&store, "early", "doge").await, None);
        assert_eq!(store.audit_count(), 0);
    }

    #[tokio::test]
    async fn mint_without_deploy_is_ignored() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(150, vec![mint(150, "alice", "ghost")]))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "ghost").await, None);
    }

    #[tokio::test]
    async fn duplicate_mints_by_one_sender_collapse() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "doge", 1_000_000, 100, 200)]))
            .await
            .unwrap();
        // Same sender twice, one distinct sender: split is by distinct
        // senders, not instructions.
        consumer
            .apply_batch(batch(
                150,
                vec![
                    mint(150, "alice", "doge"),
                    mint(150, "alice", "doge"),
                    mint(150, "bob", "doge"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "doge").await, Some(500_000));
        assert_eq!(balance(&store, "bob", "doge").await, Some(500_000));
    }

    #[tokio::test]
    async fn deploy_is_visible_to_mint_in_same_block() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        // Mint listed before deploy; classification applies deploys first.
        consumer
            .apply_batch(batch(
                100,
                vec![
                    mint(100, "alice", "doge"),
                    deploy(100, "dev", "doge", 1_000_000, 100, 200),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "doge").await, Some(1_000_000));
    }

    #[tokio::test]
    async fn transfer_exceeding_balance_is_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(150, vec![mint(150, "alice", "x")]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(300, vec![transfer(300, "alice", "bob", "x", 150)]))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "x").await, Some(100));
        assert_eq!(balance(&store, "bob", "x").await, None);
    }

    #[tokio::test]
    async fn transfer_moves_balance_and_records_debit() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(150, vec![mint(150, "alice", "x")]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(300, vec![transfer(300, "alice", "bob", "x", 50)]))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "x").await, Some(50));
        assert_eq!(balance(&store, "bob", "x").await, Some(50));

        let debits: Vec<_> = store
            .audit_entries("alice", "x")
            .into_iter()
            .filter(|e| e.op == OpKind::Transfer)
            .collect();
        assert_eq!(debits.len(), 1);
        assert_eq!(debits[0].delta, -50);
        // The credit leg has no audit row of its own.
        assert!(store.audit_entries("bob", "x").is_empty());
    }

    #[tokio::test]
    async fn replayed_batch_changes_nothing() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]))
            .await
            .unwrap();
        let mint_batch = batch(150, vec![mint(150, "alice", "x")]);
        let transfer_batch = batch(300, vec![transfer(300, "alice", "bob", "x", 50)]);
        consumer.apply_batch(mint_batch.clone()).await.unwrap();
        consumer.apply_batch(transfer_batch.clone()).await.unwrap();

        let audits_before = store.audit_count();
        let raw_before = store.raw_count();

        consumer.apply_batch(mint_batch).await.unwrap();
        consumer.apply_batch(transfer_batch).await.unwrap();

        assert_eq!(balance(&store, "alice", "x").await, Some(50));
        assert_eq!(balance(&store, "bob", "x").await, Some(50));
        assert_eq!(store.audit_count(), audits_before);
        assert_eq!(store.raw_count(), raw_before);
    }

    #[tokio::test]
    async fn transfer_before_window_close_is_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(150, vec![mint(150, "alice", "x")]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(199, vec![transfer(199, "alice", "bob", "x", 10)]))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "x").await, Some(100));
        assert_eq!(balance(&store, "bob", "x").await, None);
    }

    #[tokio::test]
    async fn degenerate_transfers_are_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let consumer = consumer(&store);

        consumer
            .apply_batch(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(150, vec![mint(150, "alice", "x")]))
            .await
            .unwrap();
        consumer
            .apply_batch(batch(
                300,
                vec![
                    transfer(300, "alice", "alice", "x", 10),
                    transfer(300, "alice", "bob", "x", 0),
                    transfer(300, "alice", "bob", "x", -5),
                    transfer(300, "alice", "bob", "ghost", 10),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(balance(&store, "alice", "x").await, Some(100));
        assert_eq!(balance(&store, "bob", "x").await, None);
    }

    #[tokio::test]
    async fn genesis_definition_installed_once() {
        let store = Arc::new(MemoryLedgerStore::new());
        let genesis = TokenDefinition {
            tick: "dota".into(),
            creator: "13T28S52mt9aJeoQpzHHxq1LEcwDaK9iTMERJsdK2Tqvftfo".into(),
            counterparty: "13T28S52mt9aJeoQpzHHxq1LEcwDaK9iTMERJsdK2Tqvftfo".into(),
            block_number: 18_681_993,
            extrinsic_hash: "0x095d41d1".into(),
            amount: 5_000_000,
            start: 18_681_993,
            end: 18_723_993,
            created: at(),
        };
        let consumer = LedgerConsumer::new(
            Arc::clone(&store),
            Arc::new(PipelineCoordinator::new(PipelineConfig::default())),
            ConsumerConfig {
                genesis: Some(genesis.clone()),
                ..ConsumerConfig::default()
            },
        );

        consumer.ensure_genesis(genesis.clone()).await.unwrap();
        consumer.ensure_genesis(genesis).await.unwrap();

        let def = store.token_definition("dota").await.unwrap().unwrap();
        assert_eq!(def.amount, 5_000_000);
    }

    #[tokio::test]
    async fn run_drains_pipeline_in_order() {
        let store = Arc::new(MemoryLedgerStore::new());
        let pipeline = Arc::new(PipelineCoordinator::new(PipelineConfig::default()));
        let consumer = Arc::new(LedgerConsumer::new(
            Arc::clone(&store),
            Arc::clone(&pipeline),
            ConsumerConfig {
                idle_poll_ms: 10,
                ..ConsumerConfig::default()
            },
        ));

        pipeline.push(batch(100, vec![deploy(100, "dev", "x", 100, 100, 200)]));
        pipeline.push(batch(150, vec![mint(150, "alice", "x")]));

        let worker = {
            let consumer = Arc::clone(&consumer);
            tokio::spawn(async move { consumer.run().await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(balance(&store, "alice", "x").await, Some(100));
        assert_eq!(pipeline.depth(), 0);
        worker.abort();
    }
}
