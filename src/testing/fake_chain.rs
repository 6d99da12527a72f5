//! In-memory chain
//!
//! [`FakeChain`] implements [`ChainProvider`] from a scripted state: receipts,
//! logs, per-selector contract responses, block headers and storage proofs.
//! Every write goes through `&self` so a chain shared through an `Arc` can be
//! advanced while a messenger is waiting on it.

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, B256, U256};
use alloy::rpc::types::{Log, TransactionRequest};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{MessengerError, Result};
use crate::evm::provider::{AccountProof, BlockHeader, ChainProvider, LogQuery};
use crate::types::TxReceipt;

/// Scripted result of an `eth_call`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResponse {
    /// ABI encoded return data
    Return(Bytes),
    /// Revert with an `Error(string)` reason
    Revert(String),
    /// Revert without data
    RevertNoData,
    /// Transport failure
    Error(String),
}

#[derive(Debug, Default)]
struct FakeState {
    block_number: u64,
    timestamp: u64,
    receipts: HashMap<TxHash, TxReceipt>,
    logs: Vec<Log>,
    responses: HashMap<(Address, [u8; 4]), CallResponse>,
    blocks: HashMap<u64, BlockHeader>,
    proofs: HashMap<(Address, u64), AccountProof>,
    gas_estimate: u64,
    calls: Vec<TransactionRequest>,
    estimates: Vec<TransactionRequest>,
    sent: Vec<TransactionRequest>,
    auto_mine: bool,
}

/// Scripted [`ChainProvider`]
#[derive(Debug)]
pub struct FakeChain {
    chain_id: u64,
    signer: Option<Address>,
    state: Mutex<FakeState>,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            signer: None,
            state: Mutex::new(FakeState {
                gas_estimate: 21_000,
                ..Default::default()
            }),
        }
    }

    /// Allow `send_transaction`, with `from` reported as the signer
    pub fn with_signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Include every sent transaction in a new block with a successful receipt
    pub fn with_auto_mine(self) -> Self {
        self.state().auto_mine = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    pub fn set_block_number(&self, block_number: u64) {
        self.state().block_number = block_number;
    }

    /// Advance the head by `blocks`
    pub fn mine(&self, blocks: u64) {
        self.state().block_number += blocks;
    }

    /// Timestamp reported for the latest block
    pub fn set_timestamp(&self, timestamp: u64) {
        self.state().timestamp = timestamp;
    }

    pub fn advance_time(&self, seconds: u64) {
        self.state().timestamp += seconds;
    }

    /// Store a receipt and index its logs
    pub fn add_receipt(&self, receipt: TxReceipt) {
        let mut state = self.state();
        state.logs.extend(receipt.logs.iter().cloned());
        state.receipts.insert(receipt.transaction_hash, receipt);
    }

    pub fn add_log(&self, log: Log) {
        self.state().logs.push(log);
    }

    /// Script the response for calls to `C` on `to`
    pub fn on_call<C: SolCall>(&self, to: Address, response: CallResponse) {
        self.state().responses.insert((to, C::SELECTOR), response);
    }

    /// Script ABI encoded return data for calls to `C` on `to`
    pub fn returns<C: SolCall>(&self, to: Address, data: impl Into<Bytes>) {
        self.on_call::<C>(to, CallResponse::Return(data.into()));
    }

    pub fn add_block(&self, header: BlockHeader) {
        self.state().blocks.insert(header.number, header);
    }

    pub fn add_proof(&self, block: u64, proof: AccountProof) {
        self.state().proofs.insert((proof.address, block), proof);
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state().gas_estimate = gas;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn block_number(&self) -> u64 {
        self.state().block_number
    }

    /// Every transaction passed to `send_transaction`, in order
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state().sent.clone()
    }

    /// Every request passed to `estimate_gas`, in order
    pub fn estimated_transactions(&self) -> Vec<TransactionRequest> {
        self.state().estimates.clone()
    }

    /// Number of `eth_call`s made against `to` with `C`'s selector
    pub fn call_count<C: SolCall>(&self, to: Address) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|tx| call_target(tx) == Some(to) && selector(tx) == Some(C::SELECTOR))
            .count()
    }
}

fn call_target(tx: &TransactionRequest) -> Option<Address> {
    match tx.to {
        Some(TxKind::Call(to)) => Some(to),
        _ => None,
    }
}

fn selector(tx: &TransactionRequest) -> Option<[u8; 4]> {
    let input = tx.input.input()?;
    let bytes: [u8; 4] = input.get(..4)?.try_into().ok()?;
    Some(bytes)
}

/// Deterministic hash for the `n`th transaction sent to a [`FakeChain`]
pub fn sent_tx_hash(n: usize) -> TxHash {
    B256::from(U256::from(0xf00d_0000u64 + n as u64))
}

#[async_trait]
impl ChainProvider for FakeChain {
    async fn get_chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn get_block_number(&self) -> Result<u64> {
        Ok(self.state().block_number)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>> {
        Ok(self.state().receipts.get(&tx_hash).cloned())
    }

    async fn get_block(&self, block: BlockNumberOrTag) -> Result<Option<BlockHeader>> {
        let state = self.state();
        match block {
            BlockNumberOrTag::Number(number) => Ok(state.blocks.get(&number).copied()),
            BlockNumberOrTag::Latest => {
                let number = state.block_number;
                let mut header = state.blocks.get(&number).copied().unwrap_or(BlockHeader {
                    number,
                    hash: B256::from(U256::from(number)),
                    state_root: B256::ZERO,
                    timestamp: 0,
                });
                header.timestamp = state.timestamp;
                Ok(Some(header))
            }
            other => Err(MessengerError::Rpc(format!("unsupported block tag {:?}", other))),
        }
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>> {
        let mut logs: Vec<Log> = self
            .state()
            .logs
            .iter()
            .filter(|log| query.matches(log))
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(logs)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        let mut state = self.state();
        let key = call_target(&tx).zip(selector(&tx));
        state.calls.push(tx);

        let response = key.and_then(|key| state.responses.get(&key).cloned());
        match response {
            Some(CallResponse::Return(data)) => Ok(data),
            Some(CallResponse::Revert(reason)) => Err(MessengerError::Reverted {
                reason: Some(reason),
                data: None,
            }),
            Some(CallResponse::RevertNoData) => Err(MessengerError::Reverted {
                reason: None,
                data: None,
            }),
            Some(CallResponse::Error(message)) => Err(MessengerError::Rpc(message)),
            // no code at the target
            None => Ok(Bytes::new()),
        }
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        let mut state = self.state();
        state.estimates.push(tx.clone());
        Ok(state.gas_estimate)
    }

    async fn get_proof(&self, address: Address, _keys: Vec<B256>, block: u64) -> Result<AccountProof> {
        self.state()
            .proofs
            .get(&(address, block))
            .cloned()
            .ok_or_else(|| MessengerError::Rpc(format!("no proof for {} at block {}", address, block)))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        if self.signer.is_none() {
            return Err(MessengerError::MissingSigner);
        }

        let mut state = self.state();
        state.sent.push(tx);
        let tx_hash = sent_tx_hash(state.sent.len());

        if state.auto_mine {
            state.block_number += 1;
            let receipt = TxReceipt {
                transaction_hash: tx_hash,
                block_number: state.block_number,
                block_hash: None,
                status: true,
                logs: Vec::new(),
            };
            state.receipts.insert(tx_hash, receipt);
        }

        Ok(tx_hash)
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer
    }
}
