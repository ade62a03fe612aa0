//! Error types returned across the engine boundary.
//!
//! Stepping never fails; only host commands, persistence and configuration
//! loading return these.

use cardshop_logic::grid::Tile;
use thiserror::Error;

/// Rejection of a host command. No state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("cannot use tile {tile}: {reason}")]
    Conflict { tile: Tile, reason: String },

    #[error("nothing at tile {tile}")]
    NotFound { tile: Tile },

    #[error("insufficient funds: need ${needed}, have ${available}")]
    InsufficientFunds { needed: u64, available: u64 },
}

impl ShopError {
    pub(crate) fn invalid_order(reason: impl Into<String>) -> Self {
        ShopError::InvalidOrder {
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(tile: Tile, reason: impl Into<String>) -> Self {
        ShopError::Conflict {
            tile,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during save/load.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Errors from loading or validating a [`crate::config::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
