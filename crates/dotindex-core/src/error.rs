//! Error types for the dotindex pipeline.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while scanning blocks and applying instructions.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("handler error: {0}")]
    Handler(String),

    #[error("{0}")]
    Other(String),
}
