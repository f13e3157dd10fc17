//! Fluent builder API for configuring a block scanner.
//!
//! # Example
//!
//! ```rust,no_run
//! use dotindex_substrate::ScannerBuilder;
//!
//! let config = ScannerBuilder::new()
//!     .start_block(18_600_000)
//!     .window_size(16)
//!     .poll_interval_ms(6000)
//!     .build_config();
//! ```

use dotindex_core::config::ScannerConfig;

use crate::client::ChainClient;
use crate::scanner::BlockScanner;

/// Fluent builder for [`ScannerConfig`] / [`BlockScanner`].
#[derive(Default)]
pub struct ScannerBuilder {
    config: ScannerConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Set the first block to scan.
    pub fn start_block(mut self, block: u64) -> Self {
        self.config.start_block = block;
        self
    }

    /// Set the number of blocks resolved concurrently per window.
    pub fn window_size(mut self, size: u64) -> Self {
        self.config.window_size = size;
        self
    }

    /// Set the caught-up polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the reconnect backoff in milliseconds.
    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Build the [`ScannerConfig`].
    pub fn build_config(self) -> ScannerConfig {
        self.config
    }

    /// Build a [`BlockScanner`] over `client`.
    pub fn build<C: ChainClient>(self, client: C) -> BlockScanner<C> {
        BlockScanner::new(client, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = ScannerBuilder::new().build_config();
        assert_eq!(cfg.start_block, 0);
        assert_eq!(cfg.window_size, 16);
        assert_eq!(cfg.poll_interval_ms, 6000);
    }

    #[test]
    fn builder_custom() {
        let cfg = ScannerBuilder::new()
            .start_block(18_600_000)
            .window_size(8)
            .poll_interval_ms(5000)
            .retry_backoff_ms(2000)
            .build_config();

        assert_eq!(cfg.start_block, 18_600_000);
        assert_eq!(cfg.window_size, 8);
        assert_eq!(cfg.poll_interval_ms, 5000);
        assert_eq!(cfg.retry_backoff_ms, 2000);
    }
}
