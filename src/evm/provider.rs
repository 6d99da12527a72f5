//! Chain provider abstraction
//!
//! Everything the messenger and bridges read from or write to a chain goes
//! through [`ChainProvider`]. [`crate::evm::client::AlloyChainProvider`] is the
//! JSON-RPC implementation; tests use `testing::FakeChain`.

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256, U64};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MessengerError, Result};
use crate::types::TxReceipt;

/// Block fields used for status and proof computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde(with = "quantity")]
    pub number: u64,
    pub hash: B256,
    pub state_root: B256,
    #[serde(with = "quantity")]
    pub timestamp: u64,
}

mod quantity {
    use alloy::primitives::U64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        U64::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(U64::deserialize(deserializer)?.to::<u64>())
    }
}

/// One storage slot of an `eth_getProof` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    pub key: B256,
    pub value: U256,
    pub proof: Vec<Bytes>,
}

/// `eth_getProof` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProof {
    pub address: Address,
    pub account_proof: Vec<Bytes>,
    pub balance: U256,
    pub code_hash: B256,
    pub nonce: U64,
    pub storage_hash: B256,
    pub storage_proof: Vec<StorageProof>,
}

/// Log filter for a single contract event
///
/// `topics` holds the optional values of indexed topics 1 through 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    pub topics: [Option<B256>; 3],
    pub from_block: u64,
    pub to_block: Option<u64>,
}

impl LogQuery {
    /// All `event_signature` logs emitted by `address` since genesis
    pub fn new(address: Address, event_signature: B256) -> Self {
        Self {
            address,
            event_signature,
            topics: [None; 3],
            from_block: 0,
            to_block: None,
        }
    }

    pub fn topic1(mut self, topic: B256) -> Self {
        self.topics[0] = Some(topic);
        self
    }

    pub fn topic2(mut self, topic: B256) -> Self {
        self.topics[1] = Some(topic);
        self
    }

    pub fn topic3(mut self, topic: B256) -> Self {
        self.topics[2] = Some(topic);
        self
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = block;
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    /// Convert into an alloy RPC filter
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new()
            .address(self.address)
            .event_signature(self.event_signature)
            .from_block(self.from_block);

        if let Some(to_block) = self.to_block {
            filter = filter.to_block(to_block);
        } else {
            filter = filter.to_block(BlockNumberOrTag::Latest);
        }
        if let Some(topic) = self.topics[0] {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = self.topics[1] {
            filter = filter.topic2(topic);
        }
        if let Some(topic) = self.topics[2] {
            filter = filter.topic3(topic);
        }
        filter
    }

    /// Whether `log` satisfies this query
    pub fn matches(&self, log: &Log) -> bool {
        if log.address() != self.address {
            return false;
        }

        let topics = log.topics();
        if topics.first() != Some(&self.event_signature) {
            return false;
        }

        for (i, expected) in self.topics.iter().enumerate() {
            if let Some(expected) = expected {
                if topics.get(i + 1) != Some(expected) {
                    return false;
                }
            }
        }

        let block = log.block_number.unwrap_or_default();
        block >= self.from_block && self.to_block.map(|to| block <= to).unwrap_or(true)
    }
}

/// Read/write access to one chain
///
/// Contract reads go through [`ChainProvider::call`], which must report
/// reverts as [`crate::error::MessengerError::Reverted`] so callers can tell
/// them apart from transport failures.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn get_chain_id(&self) -> Result<u64>;

    async fn get_block_number(&self) -> Result<u64>;

    /// `None` when the chain does not know the transaction
    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>>;

    async fn get_block(&self, block: BlockNumberOrTag) -> Result<Option<BlockHeader>>;

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>>;

    /// `eth_call` against the latest block
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    /// `eth_getProof` for `address` at `block`
    async fn get_proof(
        &self,
        address: Address,
        keys: Vec<B256>,
        block: u64,
    ) -> Result<AccountProof>;

    /// Sign and broadcast, returning the transaction hash without waiting
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Address transactions are sent from, if the provider can sign
    fn signer_address(&self) -> Option<Address> {
        None
    }
}

/// Unsigned request calling `call` on `to`
pub fn contract_request<C: SolCall>(to: Address, call: &C) -> TransactionRequest {
    TransactionRequest::default()
        .to(to)
        .input(Bytes::from(call.abi_encode()).into())
}

/// `eth_call` a contract view and decode its return values
///
/// Empty output where values were expected is reported as a revert without data.
pub async fn call_contract<P, C>(provider: &P, to: Address, call: &C) -> Result<C::Return>
where
    P: ChainProvider + ?Sized,
    C: SolCall,
{
    let output = provider.call(contract_request(to, call)).await?;
    match C::abi_decode_returns(&output, true) {
        Ok(ret) => Ok(ret),
        // no code at `to`
        Err(_) if output.is_empty() => Err(MessengerError::Reverted {
            reason: None,
            data: None,
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, LogData};

    fn log_at(address: Address, topics: Vec<B256>, block: u64) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address,
                data: LogData::new_unchecked(topics, Bytes::new()),
            },
            block_number: Some(block),
            ..Default::default()
        }
    }

    #[test]
    fn test_log_query_matches() {
        let contract = address!("4200000000000000000000000000000000000004");
        let sig = b256!("4641df4a962071e12719d8c8c8e5ac7fc4d97b927346a3d7a335b1f7517e133c");
        let hash = B256::repeat_byte(0xaa);

        let query = LogQuery::new(contract, sig).topic1(hash);

        assert!(query.matches(&log_at(contract, vec![sig, hash], 5)));
        assert!(!query.matches(&log_at(contract, vec![sig, B256::ZERO], 5)));
        assert!(!query.matches(&log_at(contract, vec![sig], 5)));
        assert!(!query.matches(&log_at(Address::ZERO, vec![sig, hash], 5)));
        assert!(!query.matches(&log_at(contract, vec![B256::ZERO, hash], 5)));
    }

    #[test]
    fn test_log_query_block_range() {
        let contract = Address::repeat_byte(1);
        let sig = B256::repeat_byte(2);
        let query = LogQuery::new(contract, sig).from_block(10).to_block(20);

        assert!(!query.matches(&log_at(contract, vec![sig], 9)));
        assert!(query.matches(&log_at(contract, vec![sig], 10)));
        assert!(query.matches(&log_at(contract, vec![sig], 20)));
        assert!(!query.matches(&log_at(contract, vec![sig], 21)));
    }

    #[test]
    fn test_block_header_deserialize() {
        let json = r#"{
            "number": "0x1b4",
            "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "stateRoot": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "timestamp": "0x64",
            "miner": "0x0000000000000000000000000000000000000000"
        }"#;
        let header: BlockHeader = serde_json::from_str(json).unwrap();
        assert_eq!(header.number, 436);
        assert_eq!(header.timestamp, 100);
        assert_eq!(header.state_root, B256::repeat_byte(0x22));
    }

    #[test]
    fn test_account_proof_deserialize() {
        let json = r#"{
            "address": "0x4200000000000000000000000000000000000003",
            "accountProof": ["0xf8"],
            "balance": "0x0",
            "codeHash": "0x3333333333333333333333333333333333333333333333333333333333333333",
            "nonce": "0x1",
            "storageHash": "0x4444444444444444444444444444444444444444444444444444444444444444",
            "storageProof": [{
                "key": "0x5555555555555555555555555555555555555555555555555555555555555555",
                "value": "0x1",
                "proof": ["0xe2", "0xe3"]
            }]
        }"#;
        let proof: AccountProof = serde_json::from_str(json).unwrap();
        assert_eq!(proof.storage_hash, B256::repeat_byte(0x44));
        assert_eq!(proof.storage_proof.len(), 1);
        assert_eq!(proof.storage_proof[0].value, U256::from(1u64));
        assert_eq!(proof.storage_proof[0].proof.len(), 2);
    }
}
