//! Shared data contracts for the indexing pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Operation ───────────────────────────────────────────────────────────────

/// The three dot-20 operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Deploy,
    Mint,
    Transfer,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deploy => write!(f, "deploy"),
            Self::Mint => write!(f, "mint"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

impl std::str::FromStr for OpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(Self::Deploy),
            "mint" => Ok(Self::Mint),
            "transfer" => Ok(Self::Transfer),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

/// A parsed dot-20 payload.
///
/// Closed union over the three operation kinds; each variant carries only the
/// fields its apply rule reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Deploy {
        tick: String,
        /// Declared total supply; `None` falls back to the protocol default.
        amount: Option<u64>,
        /// First block of the mint window.
        start: Option<u64>,
        /// Last block of the mint window; `None` derives from `start`.
        end: Option<u64>,
    },
    Mint {
        tick: String,
    },
    Transfer {
        tick: String,
        /// Requested amount. A missing `amt` field parses as zero so the
        /// non-positive-amount rejection is reported at apply time.
        amount: i64,
    },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Deploy { .. } => OpKind::Deploy,
            Self::Mint { .. } => OpKind::Mint,
            Self::Transfer { .. } => OpKind::Transfer,
        }
    }

    pub fn tick(&self) -> &str {
        match self {
            Self::Deploy { tick, .. } | Self::Mint { tick } | Self::Transfer { tick, .. } => tick,
        }
    }
}

// ─── Instruction ─────────────────────────────────────────────────────────────

/// One decoded dot-20 instruction, pinned to its originating extrinsic.
///
/// Created once by the scanner, consumed once by the ledger consumer, and
/// persisted verbatim in the raw instruction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub block_number: u64,
    pub block_hash: String,
    pub extrinsic_index: u32,
    pub extrinsic_hash: String,
    /// Signer of the batched extrinsic.
    pub from: String,
    /// Destination of the companion keep-alive transfer.
    pub to: String,
    /// Value moved by the companion transfer.
    pub transfer: u64,
    /// Remark text exactly as found on chain.
    pub raw_content: String,
    /// Remark text after normalization.
    pub trim_content: String,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
}

// ─── BlockBatch ──────────────────────────────────────────────────────────────

/// All instructions decoded from a single block — the unit moved through the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBatch {
    pub block_number: u64,
    pub instructions: Vec<Instruction>,
}

impl BlockBatch {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_and_tick() {
        let op = Operation::Transfer {
            tick: "dota".into(),
            amount: 50,
        };
        assert_eq!(op.kind(), OpKind::Transfer);
        assert_eq!(op.tick(), "dota");

        let op = Operation::Mint { tick: "doge".into() };
        assert_eq!(op.kind(), OpKind::Mint);
        assert_eq!(op.tick(), "doge");
    }

    #[test]
    fn op_kind_display_parse_roundtrip() {
        for kind in [OpKind::Deploy, OpKind::Mint, OpKind::Transfer] {
            let parsed: OpKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("burn".parse::<OpKind>().is_err());
    }
}
