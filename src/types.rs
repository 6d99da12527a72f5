//! Shared types for cross-domain messages
//!
//! Statuses are derived, never stored: every [`MessageStatus`] is recomputed
//! from receipts, logs and contract reads on both chains.

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::{Log, TransactionReceipt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a message travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageDirection {
    L1ToL2,
    L2ToL1,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::L1ToL2 => "L1_TO_L2",
            MessageDirection::L2ToL1 => "L2_TO_L1",
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a cross-domain message
///
/// The declaration order is significant. For L2 to L1 messages a later
/// variant implies every earlier one was passed, which is what
/// `wait_for_message_status` relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    /// L1 to L2 message not yet relayed on L2
    UnconfirmedL1ToL2Message,
    /// L1 to L2 message whose relay reverted on L2
    FailedL1ToL2Message,
    /// L2 to L1 message whose L2 block is not covered by a published output root
    OutputRootNotPublished,
    /// Output root published, withdrawal not yet proven on L1
    ReadyToProve,
    /// Withdrawal proven, finalization period still running
    InChallengePeriod,
    /// Finalization period elapsed (or a previous relay failed)
    ReadyForRelay,
    /// Message successfully relayed on the destination chain
    Relayed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::UnconfirmedL1ToL2Message => "UNCONFIRMED_L1_TO_L2_MESSAGE",
            MessageStatus::FailedL1ToL2Message => "FAILED_L1_TO_L2_MESSAGE",
            MessageStatus::OutputRootNotPublished => "OUTPUT_ROOT_NOT_PUBLISHED",
            MessageStatus::ReadyToProve => "READY_TO_PROVE",
            MessageStatus::InChallengePeriod => "IN_CHALLENGE_PERIOD",
            MessageStatus::ReadyForRelay => "READY_FOR_RELAY",
            MessageStatus::Relayed => "RELAYED",
        }
    }

    /// Whether no further transition can happen for a message in this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MessageStatus::Relayed | MessageStatus::FailedL1ToL2Message
        )
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a relay attempt on the destination chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageReceiptStatus {
    RelayedFailed,
    RelayedSucceeded,
}

// ============================================================================
// Messages
// ============================================================================

/// A message observed in a `SentMessage` log on its origin chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    pub direction: MessageDirection,
    pub sender: Address,
    pub target: Address,
    pub message: Bytes,
    /// Versioned nonce (version in the top two bytes)
    pub message_nonce: U256,
    pub value: U256,
    pub min_gas_limit: U256,
    /// Index of the `SentMessage` log within its block
    pub log_index: u64,
    pub block_number: u64,
    pub transaction_hash: TxHash,
}

/// Message as recorded by the L2ToL1MessagePasser, the preimage of the withdrawal hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowLevelMessage {
    pub message_nonce: U256,
    pub sender: Address,
    pub target: Address,
    pub value: U256,
    pub min_gas_limit: U256,
    pub message: Bytes,
}

/// A message that has not been sent yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessageRequest {
    pub direction: MessageDirection,
    pub target: Address,
    pub message: Bytes,
}

/// Token transfer initiated through a standard bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20BridgeMessage {
    pub direction: MessageDirection,
    pub from: Address,
    pub to: Address,
    pub l1_token: Address,
    pub l2_token: Address,
    pub amount: U256,
    pub data: Bytes,
    pub log_index: u64,
    pub block_number: u64,
    pub transaction_hash: TxHash,
}

/// Receipt fields the tracker needs, independent of the RPC client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub block_hash: Option<B256>,
    /// `true` if the transaction succeeded
    pub status: bool,
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for TxReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            block_hash: receipt.block_hash,
            status: receipt.status(),
            logs: receipt.inner.logs().to_vec(),
        }
    }
}

/// Receipt of the transaction that relayed (or tried to relay) a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub receipt_status: MessageReceiptStatus,
    pub transaction_receipt: TxReceipt,
}

/// Anything that can be resolved into a single [`CrossChainMessage`]
#[derive(Debug, Clone, PartialEq)]
pub enum MessageLike {
    Message(CrossChainMessage),
    Transaction(TxHash),
    Receipt(TxReceipt),
    BridgeMessage(Erc20BridgeMessage),
}

impl From<CrossChainMessage> for MessageLike {
    fn from(message: CrossChainMessage) -> Self {
        MessageLike::Message(message)
    }
}

impl From<&CrossChainMessage> for MessageLike {
    fn from(message: &CrossChainMessage) -> Self {
        MessageLike::Message(message.clone())
    }
}

impl From<TxHash> for MessageLike {
    fn from(tx_hash: TxHash) -> Self {
        MessageLike::Transaction(tx_hash)
    }
}

impl From<TxReceipt> for MessageLike {
    fn from(receipt: TxReceipt) -> Self {
        MessageLike::Receipt(receipt)
    }
}

impl From<Erc20BridgeMessage> for MessageLike {
    fn from(message: Erc20BridgeMessage) -> Self {
        MessageLike::BridgeMessage(message)
    }
}

// ============================================================================
// Outputs and Proofs
// ============================================================================

/// A published L2 output, read from the L2OutputOracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputData {
    pub output_root: B256,
    pub l1_timestamp: u64,
    pub l2_block_number: u64,
    pub l2_output_index: u64,
}

/// Preimage of an output root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputRootProof {
    pub version: B256,
    pub state_root: B256,
    pub message_passer_storage_root: B256,
    pub latest_blockhash: B256,
}

/// Everything the portal needs to verify a withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessageProof {
    pub l2_output_index: u64,
    pub output_root_proof: OutputRootProof,
    /// Storage proof nodes for the withdrawal slot, root first
    pub withdrawal_proof: Vec<Bytes>,
}

/// Entry of the portal's `provenWithdrawals` mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenWithdrawal {
    pub output_root: B256,
    /// L1 timestamp of the prove transaction, zero if never proven
    pub timestamp: u64,
    pub l2_block_number: u64,
}

impl ProvenWithdrawal {
    pub fn is_proven(&self) -> bool {
        self.timestamp != 0
    }
}
