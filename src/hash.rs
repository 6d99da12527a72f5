//! Hash computation for cross-domain messages and withdrawals
//!
//! These must match the on-chain hashing byte for byte. A mismatch does not
//! fail locally, it produces proofs the portal rejects.
//!
//! - `hash_cross_domain_message`: keccak256 of the versioned relay encoding,
//!   keys `RelayedMessage`/`FailedRelayedMessage` events
//! - `hash_withdrawal`: keccak256 of `abi.encode(nonce, sender, target, value, gasLimit, data)`,
//!   keys the message passer's `sentMessages` and the portal's `provenWithdrawals`
//! - `hash_output_root_proof`: keccak256 of the four `bytes32` output root fields

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolValue;
use tiny_keccak::{Hasher, Keccak};

use crate::encoding::{encode_cross_domain_message, MessageVersion};
use crate::error::Result;
use crate::types::{LowLevelMessage, OutputRootProof};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Hash of a cross-domain message as seen by the destination messenger
pub fn hash_cross_domain_message(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    gas_limit: U256,
    data: &Bytes,
) -> Result<B256> {
    match MessageVersion::from_nonce(nonce)? {
        MessageVersion::V0 => {
            let encoded =
                encode_cross_domain_message(nonce, sender, target, value, gas_limit, data)?;
            Ok(B256::from(keccak256(&encoded)))
        }
    }
}

/// Hash of a withdrawal as stored by the L2ToL1MessagePasser
///
/// ```solidity
/// keccak256(abi.encode(nonce, sender, target, value, gasLimit, data))
/// ```
pub fn hash_withdrawal(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    gas_limit: U256,
    data: &Bytes,
) -> B256 {
    let encoded = (nonce, sender, target, value, gas_limit, data.clone()).abi_encode_params();
    B256::from(keccak256(&encoded))
}

/// Withdrawal hash of a low level message
pub fn hash_low_level_message(message: &LowLevelMessage) -> B256 {
    hash_withdrawal(
        message.message_nonce,
        message.sender,
        message.target,
        message.value,
        message.min_gas_limit,
        &message.message,
    )
}

/// Storage slot of a withdrawal hash in the message passer's `sentMessages` mapping
///
/// `sentMessages` is the first declared mapping, so the slot index is zero.
pub fn hash_message_hash(message_hash: B256) -> B256 {
    let encoded = (message_hash, U256::ZERO).abi_encode_params();
    B256::from(keccak256(&encoded))
}

/// Output root for an output root proof
pub fn hash_output_root_proof(proof: &OutputRootProof) -> B256 {
    let encoded = (
        proof.version,
        proof.state_root,
        proof.message_passer_storage_root,
        proof.latest_blockhash,
    )
        .abi_encode_params();
    B256::from(keccak256(&encoded))
}

/// Convert bytes32 to hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
