//! Cross-domain message tracking
//!
//! [`CrossChainMessenger`] resolves messages from transactions, derives their
//! status from both chains, builds withdrawal proofs and the transactions that
//! move a message through its lifecycle.
//!
//! ## Usage
//!
//! ```ignore
//! let messenger = CrossChainMessenger::connect(&client_config, &messenger_config)?;
//! let status = messenger.get_message_status(withdrawal_tx_hash).await?;
//! if status == MessageStatus::ReadyToProve {
//!     messenger.prove_message(withdrawal_tx_hash).await?;
//! }
//! ```

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::bridge::{with_sender, BridgeOptions, StandardBridge};
use crate::config::{ClientConfig, ContractsConfig, MessengerConfig, WaitOptions};
use crate::encoding::encode_cross_domain_message;
use crate::error::{MessengerError, Result};
use crate::evm::client::HttpChainProvider;
use crate::evm::contracts::{
    CrossDomainMessenger, CrossDomainMessenger::FailedRelayedMessage,
    CrossDomainMessenger::RelayedMessage, KromaPortal, L2OutputOracle,
};
use crate::evm::events::{message_passed_in_receipt, sent_messages_in_receipt};
use crate::evm::proof::make_state_trie_proof;
use crate::evm::provider::{call_contract, contract_request, ChainProvider, LogQuery};
use crate::hash::{hash_cross_domain_message, hash_low_level_message, hash_message_hash};
use crate::types::{
    CrossChainMessage, CrossChainMessageProof, CrossChainMessageRequest, Erc20BridgeMessage,
    LowLevelMessage, MessageDirection, MessageLike, MessageReceipt, MessageReceiptStatus,
    MessageStatus, OutputData, OutputRootProof, ProvenWithdrawal, TxReceipt,
};

/// Revert reason the oracle gives for blocks not yet covered by an output
const OUTPUT_NOT_PROPOSED: &str = "L2OutputOracle: cannot get output";

/// Gas buffer applied to L2 message gas estimates
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 20;

/// Tracks and drives messages between one L1 and one L2
pub struct CrossChainMessenger {
    l1: Arc<dyn ChainProvider>,
    l2: Arc<dyn ChainProvider>,
    l1_chain_id: u64,
    l2_chain_id: u64,
    contracts: ContractsConfig,
    deposit_confirmation_blocks: u64,
    l1_block_time_seconds: u64,
    wait: WaitOptions,
    bridge: StandardBridge,
}

impl CrossChainMessenger {
    /// Build a messenger over existing providers
    pub fn new(
        l1: Arc<dyn ChainProvider>,
        l2: Arc<dyn ChainProvider>,
        config: &MessengerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let contracts = config.resolve_contracts()?;

        let bridge = StandardBridge::new(
            l1.clone(),
            l2.clone(),
            contracts.l1.l1_standard_bridge,
            contracts.l2.l2_standard_bridge,
        );

        info!(
            l1_chain_id = config.l1_chain_id,
            l2_chain_id = config.l2_chain_id,
            portal = %contracts.l1.portal,
            l2_output_oracle = %contracts.l1.l2_output_oracle,
            "Created cross chain messenger"
        );

        Ok(Self {
            l1,
            l2,
            l1_chain_id: config.l1_chain_id,
            l2_chain_id: config.l2_chain_id,
            contracts,
            deposit_confirmation_blocks: config.deposit_confirmation_blocks(),
            l1_block_time_seconds: config.l1_block_time_seconds(),
            wait: config.wait_options(),
            bridge,
        })
    }

    /// Connect to both chains over HTTP
    pub fn connect(client: &ClientConfig, config: &MessengerConfig) -> eyre::Result<Self> {
        client.validate()?;

        let (l1, l2): (Arc<dyn ChainProvider>, Arc<dyn ChainProvider>) = match &client.private_key
        {
            Some(key) => (
                Arc::new(HttpChainProvider::connect_http_with_signer(
                    &client.l1_rpc_url,
                    key,
                )?),
                Arc::new(HttpChainProvider::connect_http_with_signer(
                    &client.l2_rpc_url,
                    key,
                )?),
            ),
            None => (
                Arc::new(HttpChainProvider::connect_http(&client.l1_rpc_url)?),
                Arc::new(HttpChainProvider::connect_http(&client.l2_rpc_url)?),
            ),
        };

        Self::new(l1, l2, config).map_err(eyre::Report::new)
    }

    pub fn l1_provider(&self) -> &Arc<dyn ChainProvider> {
        &self.l1
    }

    pub fn l2_provider(&self) -> &Arc<dyn ChainProvider> {
        &self.l2
    }

    pub fn l1_chain_id(&self) -> u64 {
        self.l1_chain_id
    }

    pub fn l2_chain_id(&self) -> u64 {
        self.l2_chain_id
    }

    pub fn contracts(&self) -> &ContractsConfig {
        &self.contracts
    }

    pub fn bridge(&self) -> &StandardBridge {
        &self.bridge
    }

    /// Wait options from the messenger config
    pub fn wait_options(&self) -> WaitOptions {
        self.wait
    }

    fn origin(&self, direction: MessageDirection) -> &dyn ChainProvider {
        match direction {
            MessageDirection::L1ToL2 => self.l1.as_ref(),
            MessageDirection::L2ToL1 => self.l2.as_ref(),
        }
    }

    fn destination(&self, direction: MessageDirection) -> &dyn ChainProvider {
        match direction {
            MessageDirection::L1ToL2 => self.l2.as_ref(),
            MessageDirection::L2ToL1 => self.l1.as_ref(),
        }
    }

    fn origin_messenger(&self, direction: MessageDirection) -> Address {
        match direction {
            MessageDirection::L1ToL2 => self.contracts.l1.l1_cross_domain_messenger,
            MessageDirection::L2ToL1 => self.contracts.l2.l2_cross_domain_messenger,
        }
    }

    fn destination_messenger(&self, direction: MessageDirection) -> Address {
        match direction {
            MessageDirection::L1ToL2 => self.contracts.l2.l2_cross_domain_messenger,
            MessageDirection::L2ToL1 => self.contracts.l1.l1_cross_domain_messenger,
        }
    }

    // =========================================================================
    // Message Resolution
    // =========================================================================

    /// Messages sent by a transaction, in log order
    ///
    /// Without a direction the transaction must be known to exactly one chain.
    pub async fn get_messages_by_transaction(
        &self,
        tx_hash: TxHash,
        direction: Option<MessageDirection>,
    ) -> Result<Vec<CrossChainMessage>> {
        let missing = MessengerError::AmbiguousOrMissingReceipt { tx_hash };

        let (receipt, direction) = match direction {
            Some(direction) => {
                let receipt = self
                    .origin(direction)
                    .get_transaction_receipt(tx_hash)
                    .await?
                    .ok_or(missing)?;
                (receipt, direction)
            }
            None => {
                let l1 = self.l1.get_transaction_receipt(tx_hash).await?;
                let l2 = self.l2.get_transaction_receipt(tx_hash).await?;
                match (l1, l2) {
                    (Some(receipt), None) => (receipt, MessageDirection::L1ToL2),
                    (None, Some(receipt)) => (receipt, MessageDirection::L2ToL1),
                    _ => return Err(missing),
                }
            }
        };

        Ok(self.get_messages_by_receipt(&receipt, Some(direction)))
    }

    /// Messages sent in a receipt the caller already holds
    ///
    /// Without a direction, logs from either messenger are taken.
    pub fn get_messages_by_receipt(
        &self,
        receipt: &TxReceipt,
        direction: Option<MessageDirection>,
    ) -> Vec<CrossChainMessage> {
        match direction {
            Some(direction) => {
                sent_messages_in_receipt(receipt, self.origin_messenger(direction), direction)
            }
            None => {
                let mut messages = sent_messages_in_receipt(
                    receipt,
                    self.contracts.l1.l1_cross_domain_messenger,
                    MessageDirection::L1ToL2,
                );
                messages.extend(sent_messages_in_receipt(
                    receipt,
                    self.contracts.l2.l2_cross_domain_messenger,
                    MessageDirection::L2ToL1,
                ));
                messages.sort_by_key(|m| m.log_index);
                messages
            }
        }
    }

    /// Resolve anything message-like into exactly one message
    pub async fn to_cross_chain_message(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<CrossChainMessage> {
        let messages = match message.into() {
            MessageLike::Message(message) => return Ok(message),
            MessageLike::Transaction(tx_hash) => {
                self.get_messages_by_transaction(tx_hash, None).await?
            }
            MessageLike::Receipt(receipt) => self.get_messages_by_receipt(&receipt, None),
            // a bridge transfer emits a single SentMessage
            MessageLike::BridgeMessage(Erc20BridgeMessage {
                transaction_hash,
                direction,
                ..
            }) => {
                self.get_messages_by_transaction(transaction_hash, Some(direction))
                    .await?
            }
        };

        exactly_one(messages)
    }

    /// The message as recorded by the L2ToL1MessagePasser
    pub async fn to_low_level_message(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<LowLevelMessage> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(
            &resolved,
            MessageDirection::L2ToL1,
            "convert to low level message",
        )?;

        let tx_hash = resolved.transaction_hash;
        let receipt = self
            .l2
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or(MessengerError::AmbiguousOrMissingReceipt { tx_hash })?;

        // TODO: select the withdrawal matching `resolved` once receipts with several are supported
        let mut withdrawals =
            message_passed_in_receipt(&receipt, self.contracts.l2.l2_to_l1_message_passer);
        let withdrawal = match withdrawals.len() {
            0 => return Err(MessengerError::NoWithdrawalFound { tx_hash }),
            1 => withdrawals.remove(0),
            count => {
                return Err(MessengerError::MultipleWithdrawalsUnsupported { tx_hash, count })
            }
        };

        let message = encode_cross_domain_message(
            resolved.message_nonce,
            resolved.sender,
            resolved.target,
            resolved.value,
            resolved.min_gas_limit,
            &resolved.message,
        )?;

        Ok(LowLevelMessage {
            message_nonce: withdrawal.nonce,
            sender: self.contracts.l2.l2_cross_domain_messenger,
            target: self.contracts.l1.l1_cross_domain_messenger,
            value: resolved.value,
            min_gas_limit: withdrawal.gas_limit,
            message,
        })
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Current lifecycle status of a message
    pub async fn get_message_status(&self, message: impl Into<MessageLike>) -> Result<MessageStatus> {
        let resolved = self.to_cross_chain_message(message).await?;
        let receipt = self.get_message_receipt(&resolved).await?;

        let status = match resolved.direction {
            MessageDirection::L1ToL2 => match receipt {
                None => MessageStatus::UnconfirmedL1ToL2Message,
                Some(r) if r.receipt_status == MessageReceiptStatus::RelayedSucceeded => {
                    MessageStatus::Relayed
                }
                Some(_) => MessageStatus::FailedL1ToL2Message,
            },
            MessageDirection::L2ToL1 => match receipt {
                Some(r) if r.receipt_status == MessageReceiptStatus::RelayedSucceeded => {
                    MessageStatus::Relayed
                }
                // a failed relay can be retried
                Some(_) => MessageStatus::ReadyForRelay,
                None => self.withdrawal_status(&resolved).await?,
            },
        };

        debug!(
            tx_hash = %resolved.transaction_hash,
            direction = %resolved.direction,
            status = %status,
            "Computed message status"
        );

        Ok(status)
    }

    async fn withdrawal_status(&self, resolved: &CrossChainMessage) -> Result<MessageStatus> {
        if self.get_message_output(resolved).await?.is_none() {
            return Ok(MessageStatus::OutputRootNotPublished);
        }

        let withdrawal = self.to_low_level_message(resolved).await?;
        let proven = self
            .get_proven_withdrawal(hash_low_level_message(&withdrawal))
            .await?;
        if !proven.is_proven() {
            return Ok(MessageStatus::ReadyToProve);
        }

        let (period, now) = tokio::try_join!(
            self.get_challenge_period_seconds(),
            self.latest_l1_timestamp()
        )?;

        if proven.timestamp.saturating_add(period) > now {
            Ok(MessageStatus::InChallengePeriod)
        } else {
            Ok(MessageStatus::ReadyForRelay)
        }
    }

    /// Receipt of the transaction that relayed the message, if any
    ///
    /// A successful relay wins over failed attempts; among failed attempts the
    /// latest is returned.
    pub async fn get_message_receipt(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<Option<MessageReceipt>> {
        let resolved = self.to_cross_chain_message(message).await?;
        let message_hash = hash_cross_domain_message(
            resolved.message_nonce,
            resolved.sender,
            resolved.target,
            resolved.value,
            resolved.min_gas_limit,
            &resolved.message,
        )?;

        let destination = self.destination(resolved.direction);
        let messenger = self.destination_messenger(resolved.direction);

        let relayed = destination
            .get_logs(&LogQuery::new(messenger, RelayedMessage::SIGNATURE_HASH).topic1(message_hash))
            .await?;

        let (receipt_status, log) = match relayed.len() {
            0 => {
                let failed = destination
                    .get_logs(
                        &LogQuery::new(messenger, FailedRelayedMessage::SIGNATURE_HASH)
                            .topic1(message_hash),
                    )
                    .await?;
                match failed.last() {
                    Some(log) => (MessageReceiptStatus::RelayedFailed, log.clone()),
                    None => return Ok(None),
                }
            }
            1 => (MessageReceiptStatus::RelayedSucceeded, relayed[0].clone()),
            found => {
                return Err(MessengerError::AmbiguousMessageCount { expected: 1, found });
            }
        };

        let tx_hash = log.transaction_hash.ok_or_else(|| {
            MessengerError::Decode(format!("relay log for {} has no transaction hash", message_hash))
        })?;
        let transaction_receipt = destination
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or(MessengerError::AmbiguousOrMissingReceipt { tx_hash })?;

        Ok(Some(MessageReceipt {
            receipt_status,
            transaction_receipt,
        }))
    }

    /// Poll until the message has a relay receipt at least
    /// `opts.confirmations` blocks deep
    pub async fn wait_for_message_receipt(
        &self,
        message: impl Into<MessageLike>,
        opts: &WaitOptions,
    ) -> Result<MessageReceipt> {
        let resolved = self.to_cross_chain_message(message).await?;
        let start = Instant::now();

        loop {
            if let Some(receipt) = self.get_message_receipt(&resolved).await? {
                if opts.confirmations == 0 {
                    return Ok(receipt);
                }
                let latest = self
                    .destination(resolved.direction)
                    .get_block_number()
                    .await?;
                let depth = latest
                    .saturating_sub(receipt.transaction_receipt.block_number)
                    + 1;
                if depth >= opts.confirmations {
                    return Ok(receipt);
                }
                debug!(
                    tx_hash = %receipt.transaction_receipt.transaction_hash,
                    depth,
                    confirmations = opts.confirmations,
                    "Relay receipt below confirmation depth"
                );
            }

            let progress = self.wait_progress(resolved.direction).await?;
            info!(
                tx_hash = %resolved.transaction_hash,
                l1_block = progress.l1_block,
                l2_block = progress.l2_block,
                output_block = ?progress.output_block,
                elapsed = ?start.elapsed(),
                "Waiting for message receipt"
            );

            if opts.expired(start.elapsed()) {
                break;
            }
            tokio::time::sleep(opts.poll_interval).await;
        }

        Err(MessengerError::Timeout {
            operation: "message receipt",
            elapsed: start.elapsed(),
        })
    }

    /// Poll until the message reaches `target`
    ///
    /// L2 to L1 statuses only move forward, so any later status also satisfies
    /// the wait. For L1 to L2 messages FAILED and RELAYED exclude each other.
    pub async fn wait_for_message_status(
        &self,
        message: impl Into<MessageLike>,
        target: MessageStatus,
        opts: &WaitOptions,
    ) -> Result<()> {
        let resolved = self.to_cross_chain_message(message).await?;
        let start = Instant::now();

        loop {
            let current = self.get_message_status(&resolved).await?;
            if status_reached(resolved.direction, current, target)? {
                return Ok(());
            }

            let progress = self.wait_progress(resolved.direction).await?;
            info!(
                tx_hash = %resolved.transaction_hash,
                l1_block = progress.l1_block,
                l2_block = progress.l2_block,
                output_block = ?progress.output_block,
                status = %current,
                target = %target,
                elapsed = ?start.elapsed(),
                "Waiting for message status"
            );

            if opts.expired(start.elapsed()) {
                break;
            }
            tokio::time::sleep(opts.poll_interval).await;
        }

        Err(MessengerError::Timeout {
            operation: "message status",
            elapsed: start.elapsed(),
        })
    }

    /// Chain heads for wait progress, plus the highest L2 block covered by an
    /// output when the message is a withdrawal
    async fn wait_progress(&self, direction: MessageDirection) -> Result<WaitProgress> {
        let (l1_block, l2_block) =
            tokio::try_join!(self.l1.get_block_number(), self.l2.get_block_number())?;
        let output_block = match direction {
            MessageDirection::L1ToL2 => None,
            // reported only; a failed read does not end the wait
            MessageDirection::L2ToL1 => self.get_latest_block_number().await.ok(),
        };

        Ok(WaitProgress {
            l1_block,
            l2_block,
            output_block,
        })
    }

    // =========================================================================
    // Outputs and Proofs
    // =========================================================================

    /// The first output covering the message's L2 block, `None` until published
    pub async fn get_message_output(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<Option<OutputData>> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(&resolved, MessageDirection::L2ToL1, "get an output root")?;

        let oracle = self.contracts.l1.l2_output_oracle;
        let index = match call_contract(
            self.l1.as_ref(),
            oracle,
            &L2OutputOracle::getL2OutputIndexAfterCall {
                _l2BlockNumber: U256::from(resolved.block_number),
            },
        )
        .await
        {
            Ok(ret) => ret._0,
            Err(e) if e.is_revert_with(OUTPUT_NOT_PROPOSED) => return Ok(None),
            Err(e) => return Err(e),
        };

        let output = call_contract(
            self.l1.as_ref(),
            oracle,
            &L2OutputOracle::getL2OutputCall {
                _l2OutputIndex: index,
            },
        )
        .await?
        ._0;

        Ok(Some(OutputData {
            output_root: output.outputRoot,
            l1_timestamp: u128_to_u64(output.timestamp, "output timestamp")?,
            l2_block_number: u128_to_u64(output.l2BlockNumber, "output L2 block number")?,
            l2_output_index: u256_to_u64(index, "output index")?,
        }))
    }

    /// Everything `proveWithdrawalTransaction` needs besides the withdrawal itself
    pub async fn get_message_proof(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<CrossChainMessageProof> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(&resolved, MessageDirection::L2ToL1, "generate a proof")?;

        let output = self
            .get_message_output(&resolved)
            .await?
            .ok_or(MessengerError::OutputNotPublished {
                l2_block_number: resolved.block_number,
            })?;

        let withdrawal = self.to_low_level_message(&resolved).await?;
        let slot = hash_message_hash(hash_low_level_message(&withdrawal));

        let proof = make_state_trie_proof(
            self.l2.as_ref(),
            output.l2_block_number,
            self.contracts.l2.l2_to_l1_message_passer,
            slot,
        )
        .await?;

        let block = self
            .l2
            .get_block(BlockNumberOrTag::Number(output.l2_block_number))
            .await?
            .ok_or_else(|| {
                MessengerError::Rpc(format!("L2 block {} not found", output.l2_block_number))
            })?;

        Ok(CrossChainMessageProof {
            l2_output_index: output.l2_output_index,
            output_root_proof: OutputRootProof {
                version: B256::ZERO,
                state_root: block.state_root,
                message_passer_storage_root: proof.storage_root,
                latest_blockhash: block.hash,
            },
            withdrawal_proof: proof.storage_proof,
        })
    }

    // =========================================================================
    // Supporting Queries
    // =========================================================================

    /// Finalization period of the L2OutputOracle
    pub async fn get_challenge_period_seconds(&self) -> Result<u64> {
        let period = call_contract(
            self.l1.as_ref(),
            self.contracts.l1.l2_output_oracle,
            &L2OutputOracle::FINALIZATION_PERIOD_SECONDSCall {},
        )
        .await?;
        u256_to_u64(period._0, "finalization period")
    }

    /// Latest L2 block covered by a published output
    pub async fn get_latest_block_number(&self) -> Result<u64> {
        let latest = call_contract(
            self.l1.as_ref(),
            self.contracts.l1.l2_output_oracle,
            &L2OutputOracle::latestBlockNumberCall {},
        )
        .await?;
        u256_to_u64(latest._0, "latest block number")
    }

    pub async fn get_proven_withdrawal(&self, withdrawal_hash: B256) -> Result<ProvenWithdrawal> {
        let proven = call_contract(
            self.l1.as_ref(),
            self.contracts.l1.portal,
            &KromaPortal::provenWithdrawalsCall {
                withdrawalHash: withdrawal_hash,
            },
        )
        .await?;

        Ok(ProvenWithdrawal {
            output_root: proven.outputRoot,
            timestamp: u128_to_u64(proven.timestamp, "proven timestamp")?,
            l2_block_number: u128_to_u64(proven.l2BlockNumber, "proven L2 block number")?,
        })
    }

    async fn latest_l1_timestamp(&self) -> Result<u64> {
        let block = self
            .l1
            .get_block(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| MessengerError::Rpc("latest L1 block not found".to_string()))?;
        Ok(block.timestamp)
    }

    /// Gas limit for executing an L1 to L2 message on L2, with a safety buffer
    pub async fn estimate_l2_message_gas_limit(
        &self,
        request: &CrossChainMessageRequest,
        buffer_percent: Option<u64>,
        from: Option<Address>,
    ) -> Result<u64> {
        if request.direction == MessageDirection::L2ToL1 {
            return Err(MessengerError::WrongDirection {
                operation: "estimate an L2 gas limit",
                direction: request.direction,
            });
        }

        let mut tx = TransactionRequest::default()
            .to(request.target)
            .input(request.message.clone().into());
        if let Some(from) = from {
            tx = tx.from(from);
        }

        let estimate = self.l2.estimate_gas(&tx).await?;
        Ok(apply_gas_buffer(
            estimate,
            buffer_percent.unwrap_or(DEFAULT_GAS_BUFFER_PERCENT),
        ))
    }

    /// Rough number of seconds until the message can make progress
    pub async fn estimate_message_wait_time_seconds(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<u64> {
        let resolved = self.to_cross_chain_message(message).await?;
        let status = self.get_message_status(&resolved).await?;

        match resolved.direction {
            MessageDirection::L1ToL2 => {
                if status.is_terminal() {
                    return Ok(0);
                }

                let tx_hash = resolved.transaction_hash;
                let receipt = self
                    .l1
                    .get_transaction_receipt(tx_hash)
                    .await?
                    .ok_or(MessengerError::AmbiguousOrMissingReceipt { tx_hash })?;
                let latest = self.l1.get_block_number().await?;
                let confirmations = latest.saturating_sub(receipt.block_number) + 1;

                let blocks_left = self
                    .deposit_confirmation_blocks
                    .saturating_sub(confirmations);
                Ok(blocks_left * self.l1_block_time_seconds)
            }
            MessageDirection::L2ToL1 => match status {
                MessageStatus::Relayed | MessageStatus::ReadyForRelay => Ok(0),
                MessageStatus::InChallengePeriod => {
                    let output = self.get_message_output(&resolved).await?.ok_or(
                        MessengerError::OutputNotPublished {
                            l2_block_number: resolved.block_number,
                        },
                    )?;
                    let (period, now) = tokio::try_join!(
                        self.get_challenge_period_seconds(),
                        self.latest_l1_timestamp()
                    )?;
                    let elapsed = now.saturating_sub(output.l1_timestamp);
                    Ok(period.saturating_sub(elapsed))
                }
                // not yet published or not yet proven: the full period is still ahead
                _ => self.get_challenge_period_seconds().await,
            },
        }
    }

    // =========================================================================
    // Message Actions
    // =========================================================================

    /// Transaction sending a new message
    ///
    /// L1 to L2 messages use `l2_gas_limit` or an estimate; the gas limit is
    /// unused for L2 to L1 messages and set to zero.
    pub async fn populate_send_message(
        &self,
        request: &CrossChainMessageRequest,
        l2_gas_limit: Option<u32>,
    ) -> Result<TransactionRequest> {
        let min_gas_limit = match request.direction {
            MessageDirection::L1ToL2 => match l2_gas_limit {
                Some(limit) => limit,
                None => {
                    let estimate = self
                        .estimate_l2_message_gas_limit(request, None, None)
                        .await?;
                    u32::try_from(estimate).unwrap_or(u32::MAX)
                }
            },
            MessageDirection::L2ToL1 => 0,
        };

        let call = CrossDomainMessenger::sendMessageCall {
            _target: request.target,
            _message: request.message.clone(),
            _minGasLimit: min_gas_limit,
        };
        let origin = self.origin(request.direction);
        Ok(with_sender(
            origin,
            contract_request(self.origin_messenger(request.direction), &call),
        ))
    }

    pub async fn estimate_send_message(
        &self,
        request: &CrossChainMessageRequest,
        l2_gas_limit: Option<u32>,
    ) -> Result<u64> {
        let tx = self.populate_send_message(request, l2_gas_limit).await?;
        self.origin(request.direction).estimate_gas(&tx).await
    }

    pub async fn send_message(
        &self,
        request: &CrossChainMessageRequest,
        l2_gas_limit: Option<u32>,
    ) -> Result<TxHash> {
        let tx = self.populate_send_message(request, l2_gas_limit).await?;
        self.origin(request.direction).send_transaction(tx).await
    }

    /// Replay a failed L1 to L2 message on L2 with more gas
    pub async fn populate_resend_message(
        &self,
        message: impl Into<MessageLike>,
        message_gas_limit: u64,
    ) -> Result<TransactionRequest> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(&resolved, MessageDirection::L1ToL2, "resend")?;

        let call = CrossDomainMessenger::relayMessageCall {
            _nonce: resolved.message_nonce,
            _sender: resolved.sender,
            _target: resolved.target,
            _value: resolved.value,
            _minGasLimit: resolved.min_gas_limit,
            _message: resolved.message,
        };
        let mut tx = with_sender(
            self.l2.as_ref(),
            contract_request(self.contracts.l2.l2_cross_domain_messenger, &call),
        );
        tx.gas = Some(message_gas_limit);
        Ok(tx)
    }

    pub async fn estimate_resend_message(
        &self,
        message: impl Into<MessageLike>,
        message_gas_limit: u64,
    ) -> Result<u64> {
        let tx = self
            .populate_resend_message(message, message_gas_limit)
            .await?;
        self.l2.estimate_gas(&tx).await
    }

    pub async fn resend_message(
        &self,
        message: impl Into<MessageLike>,
        message_gas_limit: u64,
    ) -> Result<TxHash> {
        let tx = self
            .populate_resend_message(message, message_gas_limit)
            .await?;
        self.l2.send_transaction(tx).await
    }

    /// `proveWithdrawalTransaction` for a withdrawal whose output is published
    pub async fn populate_prove_message(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<TransactionRequest> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(&resolved, MessageDirection::L2ToL1, "prove")?;

        let withdrawal = self.to_low_level_message(&resolved).await?;
        let proof = self.get_message_proof(&resolved).await?;

        let call = KromaPortal::proveWithdrawalTransactionCall {
            _tx: withdrawal_transaction(withdrawal),
            _l2OutputIndex: U256::from(proof.l2_output_index),
            _outputRootProof: KromaPortal::OutputRootProof {
                version: proof.output_root_proof.version,
                stateRoot: proof.output_root_proof.state_root,
                messagePasserStorageRoot: proof.output_root_proof.message_passer_storage_root,
                latestBlockhash: proof.output_root_proof.latest_blockhash,
            },
            _withdrawalProof: proof.withdrawal_proof,
        };
        Ok(with_sender(
            self.l1.as_ref(),
            contract_request(self.contracts.l1.portal, &call),
        ))
    }

    pub async fn estimate_prove_message(&self, message: impl Into<MessageLike>) -> Result<u64> {
        let tx = self.populate_prove_message(message).await?;
        self.l1.estimate_gas(&tx).await
    }

    pub async fn prove_message(&self, message: impl Into<MessageLike>) -> Result<TxHash> {
        let tx = self.populate_prove_message(message).await?;
        self.l1.send_transaction(tx).await
    }

    /// `finalizeWithdrawalTransaction` for a proven withdrawal
    pub async fn populate_finalize_message(
        &self,
        message: impl Into<MessageLike>,
    ) -> Result<TransactionRequest> {
        let resolved = self.to_cross_chain_message(message).await?;
        require_direction(&resolved, MessageDirection::L2ToL1, "finalize")?;

        let withdrawal = self.to_low_level_message(&resolved).await?;
        let call = KromaPortal::finalizeWithdrawalTransactionCall {
            _tx: withdrawal_transaction(withdrawal),
        };
        Ok(with_sender(
            self.l1.as_ref(),
            contract_request(self.contracts.l1.portal, &call),
        ))
    }

    pub async fn estimate_finalize_message(&self, message: impl Into<MessageLike>) -> Result<u64> {
        let tx = self.populate_finalize_message(message).await?;
        self.l1.estimate_gas(&tx).await
    }

    pub async fn finalize_message(&self, message: impl Into<MessageLike>) -> Result<TxHash> {
        let tx = self.populate_finalize_message(message).await?;
        self.l1.send_transaction(tx).await
    }

    // =========================================================================
    // Bridge Delegation
    // =========================================================================

    pub async fn get_deposits_by_address(
        &self,
        address: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<Erc20BridgeMessage>> {
        self.bridge
            .get_deposits_by_address(address, from_block, to_block)
            .await
    }

    pub async fn get_withdrawals_by_address(
        &self,
        address: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<Erc20BridgeMessage>> {
        self.bridge
            .get_withdrawals_by_address(address, from_block, to_block)
            .await
    }

    pub async fn approval(
        &self,
        l1_token: Address,
        l2_token: Address,
        owner: Address,
    ) -> Result<U256> {
        self.bridge.approval(l1_token, l2_token, owner).await
    }

    pub async fn approve_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> Result<TxHash> {
        self.bridge.approve(l1_token, l2_token, amount).await
    }

    pub async fn deposit_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<TxHash> {
        self.bridge.deposit_eth(amount, opts).await
    }

    pub async fn withdraw_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<TxHash> {
        self.bridge.withdraw_eth(amount, opts).await
    }

    pub async fn deposit_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TxHash> {
        self.bridge
            .deposit_erc20(l1_token, l2_token, amount, opts)
            .await
    }

    pub async fn withdraw_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TxHash> {
        self.bridge
            .withdraw_erc20(l1_token, l2_token, amount, opts)
            .await
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Heights logged on each wait iteration
struct WaitProgress {
    l1_block: u64,
    l2_block: u64,
    output_block: Option<u64>,
}

fn exactly_one(mut messages: Vec<CrossChainMessage>) -> Result<CrossChainMessage> {
    if messages.len() != 1 {
        return Err(MessengerError::AmbiguousMessageCount {
            expected: 1,
            found: messages.len(),
        });
    }
    Ok(messages.remove(0))
}

fn require_direction(
    message: &CrossChainMessage,
    expected: MessageDirection,
    operation: &'static str,
) -> Result<()> {
    if message.direction == expected {
        Ok(())
    } else {
        Err(MessengerError::WrongDirection {
            operation,
            direction: message.direction,
        })
    }
}

/// Whether a wait for `target` is over, given the `current` status
pub(crate) fn status_reached(
    direction: MessageDirection,
    current: MessageStatus,
    target: MessageStatus,
) -> Result<bool> {
    match direction {
        MessageDirection::L1ToL2 => {
            if current == target {
                return Ok(true);
            }
            if target == MessageStatus::UnconfirmedL1ToL2Message && current > target {
                return Ok(true);
            }
            let incompatible = matches!(
                (target, current),
                (MessageStatus::FailedL1ToL2Message, MessageStatus::Relayed)
                    | (MessageStatus::Relayed, MessageStatus::FailedL1ToL2Message)
            );
            if incompatible {
                return Err(MessengerError::IncompatibleStatus {
                    expected: target,
                    current,
                });
            }
            Ok(false)
        }
        MessageDirection::L2ToL1 => Ok(current >= target),
    }
}

pub(crate) fn apply_gas_buffer(estimate: u64, buffer_percent: u64) -> u64 {
    let buffered = estimate as u128 * (100 + buffer_percent as u128) / 100;
    u64::try_from(buffered).unwrap_or(u64::MAX)
}

fn withdrawal_transaction(withdrawal: LowLevelMessage) -> KromaPortal::WithdrawalTransaction {
    KromaPortal::WithdrawalTransaction {
        nonce: withdrawal.message_nonce,
        sender: withdrawal.sender,
        target: withdrawal.target,
        value: withdrawal.value,
        gasLimit: withdrawal.min_gas_limit,
        data: withdrawal.message,
    }
}

fn u256_to_u64(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| MessengerError::Decode(format!("{} overflows u64: {}", field, value)))
}

fn u128_to_u64(value: u128, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| MessengerError::Decode(format!("{} overflows u64: {}", field, value)))
}
