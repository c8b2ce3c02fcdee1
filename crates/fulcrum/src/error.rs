//! Error types.
//!
//! Reducers and middleware cannot fail by contract, and effects carry no
//! failure channel, so the only fallible surface is the store's own
//! lifecycle.

use thiserror::Error;

/// Errors surfaced by the store lifecycle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The worker task ended abnormally instead of returning the final
    /// state. In practice this means a reducer, middleware, or subscriber
    /// panicked on the worker.
    #[error("store worker terminated abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
