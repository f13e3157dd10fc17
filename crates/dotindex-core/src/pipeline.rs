//! Scan → apply pipeline coordinator.
//!
//! Bridges the scanner's per-block batches to the ledger consumer: an owned
//! FIFO buffer, a typed pause/resume signal, and a periodic depth monitor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::IndexError;
use crate::instruction::BlockBatch;

// ─── Control signal ──────────────────────────────────────────────────────────

/// Flow-control signal sent from the coordinator back to the scan-emission
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    /// Keep emitting batches.
    Resume,
    /// Withhold further batches until the backlog drains.
    Pause,
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// Callback invoked by the scanner once per non-empty block, strictly in
/// ascending block order. It may delay its return to apply backpressure.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, batch: BlockBatch) -> Result<(), IndexError>;
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Ordered, lossless buffer between scanner and consumer.
///
/// Batches are consumed strictly FIFO. The monitor task signals `Pause` when
/// the backlog crosses the high-water mark and `Resume` once it drains back
/// under it — a throttle, never a drop mechanism.
pub struct PipelineCoordinator {
    queue: Mutex<VecDeque<BlockBatch>>,
    config: PipelineConfig,
    flow: watch::Sender<FlowSignal>,
}

impl PipelineCoordinator {
    pub fn new(config: PipelineConfig) -> Self {
        let (flow, _) = watch::channel(FlowSignal::Resume);
        Self {
            queue: Mutex::new(VecDeque::new()),
            config,
            flow,
        }
    }

    /// Subscribe to pause/resume signals (handed to the scanner).
    pub fn flow_signal(&self) -> watch::Receiver<FlowSignal> {
        self.flow.subscribe()
    }

    /// Append a batch (scanner side).
    pub fn push(&self, batch: BlockBatch) {
        self.queue.lock().unwrap().push_back(batch);
    }

    /// Take the oldest pending batch (consumer side).
    pub fn pop(&self) -> Option<BlockBatch> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Number of pending batches.
    pub fn depth(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Spawn the periodic depth monitor.
    pub fn run_monitor(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut paused = false;
            let mut ticker = tokio::time::interval(Duration::from_millis(
                coordinator.config.monitor_interval_ms,
            ));
            loop {
                ticker.tick().await;
                let depth = coordinator.depth();
                if depth > coordinator.config.high_water_mark {
                    if !paused {
                        paused = true;
                        let _ = coordinator.flow.send(FlowSignal::Pause);
                        warn!(
                            depth,
                            high_water = coordinator.config.high_water_mark,
                            "backlog over high-water mark, pausing scanner"
                        );
                    }
                } else if paused {
                    paused = false;
                    let _ = coordinator.flow.send(FlowSignal::Resume);
                    info!(depth, "backlog drained, resuming scanner");
                }
            }
        })
    }
}

#[async_trait]
impl BatchHandler for PipelineCoordinator {
    async fn handle(&self, batch: BlockBatch) -> Result<(), IndexError> {
        self.push(batch);
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
