//! dotindex-core — data contracts, pipeline coordination, and the dot-20
//! ledger state machine.
//!
//! # Architecture
//!
//! ```text
//! BlockScanner (dotindex-substrate)
//!       └── BatchHandler ──► PipelineCoordinator ──► LedgerConsumer
//!                                 │                        │
//!                        Pause/Resume signal          LedgerStore
//!                        (watch channel back      (memory, or SQLite via
//!                         to the scanner)          dotindex-storage)
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod instruction;
pub mod payload;
pub mod pipeline;
pub mod store;

pub use config::{ConsumerConfig, PipelineConfig, ScannerConfig};
pub use consumer::LedgerConsumer;
pub use error::IndexError;
pub use instruction::{BlockBatch, Instruction, OpKind, Operation};
pub use pipeline::{BatchHandler, FlowSignal, PipelineCoordinator};
pub use store::{LedgerStore, MemoryLedgerStore, StoreError, TickPhase, TokenDefinition};
