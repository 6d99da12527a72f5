//! Error types for the cross-domain messenger SDK
//!
//! SDK operations return [`MessengerError`]. Setup paths (client construction,
//! config loading) use `eyre` and convert into [`MessengerError::Config`] at the
//! boundary.

use alloy::primitives::{Address, Bytes, TxHash};
use std::time::Duration;
use thiserror::Error;

use crate::types::{MessageDirection, MessageStatus};

/// Result alias used by every SDK operation
pub type Result<T> = std::result::Result<T, MessengerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessengerError {
    // ========================================================================
    // Codec Errors
    // ========================================================================

    #[error("Unsupported message version: {version}")]
    UnsupportedVersion { version: u16 },

    // ========================================================================
    // Message Resolution Errors
    // ========================================================================

    #[error("Transaction receipt for {tx_hash} is missing or present on both chains")]
    AmbiguousOrMissingReceipt { tx_hash: TxHash },

    #[error("Expected {expected} message(s), found {found}")]
    AmbiguousMessageCount { expected: usize, found: usize },

    #[error("Cannot {operation} for an {direction} message")]
    WrongDirection {
        operation: &'static str,
        direction: MessageDirection,
    },

    #[error("No MessagePassed log found in receipt {tx_hash}")]
    NoWithdrawalFound { tx_hash: TxHash },

    #[error("Receipt {tx_hash} contains {count} withdrawals, only one is supported")]
    MultipleWithdrawalsUnsupported { tx_hash: TxHash, count: usize },

    #[error("Output root for L2 block {l2_block_number} is not yet published")]
    OutputNotPublished { l2_block_number: u64 },

    // ========================================================================
    // Waiting Errors
    // ========================================================================

    #[error("Incompatible message status: expected {expected}, got {current}")]
    IncompatibleStatus {
        expected: MessageStatus,
        current: MessageStatus,
    },

    #[error("Timed out waiting for {operation} after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    // ========================================================================
    // Bridge Errors
    // ========================================================================

    #[error("Token pair not supported by bridge: {l1_token} / {l2_token}")]
    UnsupportedTokenPair { l1_token: Address, l2_token: Address },

    #[error("Provider has no signer attached")]
    MissingSigner,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================

    /// `eth_call` reverted. `reason` is decoded from `Error(string)` data when present.
    #[error("Execution reverted: {}", reason.as_deref().unwrap_or("<no reason>"))]
    Reverted {
        reason: Option<String>,
        data: Option<Bytes>,
    },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MessengerError {
    /// True if this is a revert whose reason contains `needle`
    pub fn is_revert_with(&self, needle: &str) -> bool {
        match self {
            MessengerError::Reverted {
                reason: Some(reason),
                ..
            } => reason.contains(needle),
            _ => false,
        }
    }

    /// True for any contract revert, with or without data
    pub fn is_revert(&self) -> bool {
        matches!(self, MessengerError::Reverted { .. })
    }
}

impl From<eyre::Report> for MessengerError {
    fn from(err: eyre::Report) -> Self {
        MessengerError::Config(format!("{:#}", err))
    }
}

impl From<alloy::sol_types::Error> for MessengerError {
    fn from(err: alloy::sol_types::Error) -> Self {
        MessengerError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_matching() {
        let err = MessengerError::Reverted {
            reason: Some("L2OutputOracle: cannot get output for a block that has not been proposed".into()),
            data: None,
        };
        assert!(err.is_revert());
        assert!(err.is_revert_with("L2OutputOracle: cannot get output"));
        assert!(!err.is_revert_with("something else"));

        let bare = MessengerError::Reverted {
            reason: None,
            data: None,
        };
        assert!(bare.is_revert());
        assert!(!bare.is_revert_with("L2OutputOracle"));

        assert!(!MessengerError::Rpc("connection refused".into()).is_revert());
    }

    #[test]
    fn test_error_display() {
        let err = MessengerError::IncompatibleStatus {
            expected: MessageStatus::Relayed,
            current: MessageStatus::FailedL1ToL2Message,
        };
        assert_eq!(
            err.to_string(),
            "Incompatible message status: expected RELAYED, got FAILED_L1_TO_L2_MESSAGE"
        );

        let err = MessengerError::WrongDirection {
            operation: "convert to low level message",
            direction: MessageDirection::L1ToL2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot convert to low level message for an L1_TO_L2 message"
        );

        let err = MessengerError::Reverted {
            reason: None,
            data: None,
        };
        assert_eq!(err.to_string(), "Execution reverted: <no reason>");
    }

    #[test]
    fn test_from_eyre() {
        let err: MessengerError = eyre::eyre!("bad url").into();
        assert!(matches!(err, MessengerError::Config(msg) if msg == "bad url"));
    }
}
