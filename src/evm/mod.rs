//! EVM Chain Support Module
//!
//! Everything that touches an L1 or L2 node.
//!
//! ## Submodules
//!
//! - `provider` - The `ChainProvider` seam and its RPC shapes
//! - `client` - alloy HTTP implementation of `ChainProvider`
//! - `contracts` - Kroma contract bindings using alloy sol! macro
//! - `events` - Event parsing for sent messages, withdrawals and bridge transfers
//! - `proof` - `eth_getProof` based storage proofs
//! - `confirmation` - Send and wait for a confirmation depth

pub mod client;
pub mod confirmation;
pub mod contracts;
pub mod events;
pub mod proof;
pub mod provider;

// Re-export commonly used items
pub use client::{AlloyChainProvider, HttpChainProvider};
pub use confirmation::{ConfirmationConfig, ConfirmingSender};
pub use contracts::{
    CrossDomainMessenger, KromaMintableERC20, KromaPortal, L2OutputOracle, L2ToL1MessagePasser,
    StandardBridge,
};
pub use events::MessagePassedEvent;
pub use proof::{make_state_trie_proof, StateTrieProof};
pub use provider::{AccountProof, BlockHeader, ChainProvider, LogQuery, StorageProof};
