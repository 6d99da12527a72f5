//! Kroma-SDK: Cross-Domain Message Tracking for the Kroma Rollup
//!
//! This crate tracks messages between an L1 chain and the Kroma L2 and moves
//! them through their lifecycle:
//!
//! - **Encoding and Hashing** - Versioned nonces, relay calldata and withdrawal hashes matching the contracts
//! - **Types** - Messages, statuses, receipts, outputs and proofs
//! - **Configuration** - Chain table, contract overrides and polling options
//! - **EVM Module** - Provider seam, alloy client, contract bindings, event parsing, storage proofs
//! - **Messenger** - Status derivation, waiting, proving and finalizing withdrawals
//! - **Bridge** - ETH and ERC20 deposits and withdrawals through the standard bridges
//! - **Testing Module** - In-memory chain and message builders for tests
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! kroma-sdk = { path = "../kroma-sdk" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Enable chain access, the messenger and the bridge (default)
//! - `testing` - Enable testing utilities (`FakeChain`, message builders)
//! - `full` - Enable all features

// Core modules (always available)
pub mod chain_constants;
pub mod config;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod redact;
pub mod types;

// Chain access (feature-gated)
#[cfg(feature = "evm")]
pub mod bridge;
#[cfg(feature = "evm")]
pub mod evm;
#[cfg(feature = "evm")]
pub mod messenger;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used items at the crate root
pub use config::{
    ClientConfig, ContractOverrides, ContractsConfig, L1Contracts, L2Contracts, MessengerConfig,
    WaitOptions,
};
pub use encoding::{
    decode_versioned_nonce, encode_cross_domain_message, encode_versioned_nonce, MessageVersion,
};
pub use error::{MessengerError, Result};
pub use hash::{
    hash_cross_domain_message, hash_low_level_message, hash_message_hash, hash_output_root_proof,
    hash_withdrawal, keccak256,
};
pub use types::{
    CrossChainMessage, CrossChainMessageProof, CrossChainMessageRequest, Erc20BridgeMessage,
    LowLevelMessage, MessageDirection, MessageLike, MessageReceipt, MessageReceiptStatus,
    MessageStatus, OutputData, OutputRootProof, ProvenWithdrawal, TxReceipt,
};

#[cfg(feature = "evm")]
pub use bridge::{BridgeOptions, StandardBridge};
#[cfg(feature = "evm")]
pub use messenger::CrossChainMessenger;
