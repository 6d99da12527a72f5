//! Merkle-Patricia state proofs for withdrawals

use alloy::primitives::{Address, Bytes, B256, U256};

use crate::error::{MessengerError, Result};
use crate::evm::provider::ChainProvider;

/// Account and storage proof for one storage slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrieProof {
    pub account_proof: Vec<Bytes>,
    pub storage_proof: Vec<Bytes>,
    pub storage_value: U256,
    pub storage_root: B256,
}

/// Prove `slot` of `address` at `block_number`
pub async fn make_state_trie_proof<P: ChainProvider + ?Sized>(
    provider: &P,
    block_number: u64,
    address: Address,
    slot: B256,
) -> Result<StateTrieProof> {
    let proof = provider.get_proof(address, vec![slot], block_number).await?;

    let storage = proof.storage_proof.into_iter().next().ok_or_else(|| {
        MessengerError::Decode(format!(
            "eth_getProof for {} returned no storage proof for slot {}",
            address, slot
        ))
    })?;

    Ok(StateTrieProof {
        account_proof: proof.account_proof,
        storage_proof: storage.proof,
        storage_value: storage.value,
        storage_root: proof.storage_hash,
    })
}
