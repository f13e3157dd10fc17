//! Configuration for the scanner, pipeline, and consumer.

use serde::{Deserialize, Serialize};

use crate::store::TokenDefinition;

/// Configuration for the block scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// First block to scan.
    pub start_block: u64,
    /// Maximum number of blocks resolved concurrently per window.
    pub window_size: u64,
    /// How long to wait for new finalized blocks when caught up (ms).
    pub poll_interval_ms: u64,
    /// Backoff before reconnecting after a chain failure (ms).
    pub retry_backoff_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            window_size: 16,
            poll_interval_ms: 6000,
            retry_backoff_ms: 3000,
        }
    }
}

/// Configuration for the scan → apply pipeline coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Backlog depth above which the scanner is paused.
    pub high_water_mark: usize,
    /// Sampling interval of the depth monitor (ms).
    pub monitor_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            high_water_mark: 128,
            monitor_interval_ms: 1000,
        }
    }
}

/// Configuration for the ledger consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Supply assigned to a deploy that declares none.
    pub default_supply: u64,
    /// Mint window length assigned when a deploy declares no end block.
    pub mint_window_blocks: u64,
    /// Sleep between queue polls when no batch is pending (ms).
    pub idle_poll_ms: u64,
    /// Token definition installed at startup if absent (first writer wins).
    pub genesis: Option<TokenDefinition>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            default_supply: 5_000_000,
            mint_window_blocks: 420_000,
            idle_poll_ms: 1000,
            genesis: None,
        }
    }
}
