//! Mock Message Helpers
//!
//! Builders for the logs and receipts a message leaves on each chain, so tests
//! can script a [`super::FakeChain`] into any point of a message's lifecycle.

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;

use crate::config::ContractsConfig;
use crate::encoding::encode_cross_domain_message;
use crate::error::Result;
use crate::evm::contracts::{
    CrossDomainMessenger::{FailedRelayedMessage, RelayedMessage, SentMessage},
    L2ToL1MessagePasser::MessagePassed,
    StandardBridge::ERC20BridgeInitiated,
};
use crate::hash::{hash_cross_domain_message, hash_low_level_message};
use crate::types::{CrossChainMessage, LowLevelMessage, MessageDirection, TxReceipt};

/// RPC log for `event` emitted by `emitter`
pub fn event_log<E: SolEvent>(
    emitter: Address,
    event: &E,
    block_number: u64,
    tx_hash: TxHash,
    log_index: u64,
) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: emitter,
            data: event.encode_log_data(),
        },
        block_number: Some(block_number),
        transaction_hash: Some(tx_hash),
        log_index: Some(log_index),
        ..Default::default()
    }
}

/// Successful receipt holding `logs`
pub fn receipt(tx_hash: TxHash, block_number: u64, logs: Vec<Log>) -> TxReceipt {
    TxReceipt {
        transaction_hash: tx_hash,
        block_number,
        block_hash: Some(B256::from(U256::from(block_number))),
        status: true,
        logs,
    }
}

/// `SentMessage` log matching `message`
pub fn sent_message_log(messenger: Address, message: &CrossChainMessage) -> Log {
    let event = SentMessage {
        target: message.target,
        sender: message.sender,
        message: message.message.clone(),
        messageNonce: message.message_nonce,
        value: message.value,
        gasLimit: message.min_gas_limit,
    };
    event_log(
        messenger,
        &event,
        message.block_number,
        message.transaction_hash,
        message.log_index,
    )
}

/// `MessagePassed` log for `withdrawal`, hash included
pub fn message_passed_log(
    message_passer: Address,
    withdrawal: &LowLevelMessage,
    block_number: u64,
    tx_hash: TxHash,
    log_index: u64,
) -> Log {
    let event = MessagePassed {
        nonce: withdrawal.message_nonce,
        sender: withdrawal.sender,
        target: withdrawal.target,
        value: withdrawal.value,
        gasLimit: withdrawal.min_gas_limit,
        data: withdrawal.message.clone(),
        withdrawalHash: hash_low_level_message(withdrawal),
    };
    event_log(message_passer, &event, block_number, tx_hash, log_index)
}

/// `RelayedMessage` or `FailedRelayedMessage` log for `msg_hash`
pub fn relay_log(
    messenger: Address,
    msg_hash: B256,
    succeeded: bool,
    block_number: u64,
    tx_hash: TxHash,
) -> Log {
    if succeeded {
        event_log(
            messenger,
            &RelayedMessage { msgHash: msg_hash },
            block_number,
            tx_hash,
            0,
        )
    } else {
        event_log(
            messenger,
            &FailedRelayedMessage { msgHash: msg_hash },
            block_number,
            tx_hash,
            0,
        )
    }
}

/// `ERC20BridgeInitiated` log as emitted by the origin chain's bridge
#[allow(clippy::too_many_arguments)]
pub fn erc20_bridge_initiated_log(
    bridge: Address,
    local_token: Address,
    remote_token: Address,
    from: Address,
    to: Address,
    amount: U256,
    block_number: u64,
    tx_hash: TxHash,
) -> Log {
    let event = ERC20BridgeInitiated {
        localToken: local_token,
        remoteToken: remote_token,
        from,
        to,
        amount,
        extraData: Bytes::new(),
    };
    event_log(bridge, &event, block_number, tx_hash, 0)
}

/// Destination messenger hash of `message`
pub fn message_hash(message: &CrossChainMessage) -> Result<B256> {
    hash_cross_domain_message(
        message.message_nonce,
        message.sender,
        message.target,
        message.value,
        message.min_gas_limit,
        &message.message,
    )
}

/// Builder for mock cross-domain messages
pub struct MockMessageBuilder {
    direction: MessageDirection,
    sender: Address,
    target: Address,
    message: Bytes,
    message_nonce: U256,
    value: U256,
    min_gas_limit: U256,
    block_number: u64,
    transaction_hash: TxHash,
    log_index: u64,
}

impl MockMessageBuilder {
    pub fn new(direction: MessageDirection) -> Self {
        Self {
            direction,
            sender: Address::repeat_byte(0x11),
            target: Address::repeat_byte(0x22),
            message: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            message_nonce: U256::from(1u64),
            value: U256::ZERO,
            min_gas_limit: U256::from(100_000u64),
            block_number: 100,
            transaction_hash: B256::repeat_byte(0xaa),
            log_index: 0,
        }
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    pub fn target(mut self, target: Address) -> Self {
        self.target = target;
        self
    }

    pub fn message(mut self, message: Bytes) -> Self {
        self.message = message;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.message_nonce = nonce;
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn min_gas_limit(mut self, gas: u64) -> Self {
        self.min_gas_limit = U256::from(gas);
        self
    }

    pub fn block_number(mut self, block: u64) -> Self {
        self.block_number = block;
        self
    }

    pub fn tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.transaction_hash = tx_hash;
        self
    }

    pub fn log_index(mut self, log_index: u64) -> Self {
        self.log_index = log_index;
        self
    }

    pub fn build(self) -> CrossChainMessage {
        CrossChainMessage {
            direction: self.direction,
            sender: self.sender,
            target: self.target,
            message: self.message,
            message_nonce: self.message_nonce,
            value: self.value,
            min_gas_limit: self.min_gas_limit,
            log_index: self.log_index,
            block_number: self.block_number,
            transaction_hash: self.transaction_hash,
        }
    }
}

/// Withdrawal matching `message` as the L2ToL1MessagePasser records it
pub fn withdrawal_for(
    message: &CrossChainMessage,
    contracts: &ContractsConfig,
    passer_nonce: U256,
    passer_gas_limit: U256,
) -> Result<LowLevelMessage> {
    Ok(LowLevelMessage {
        message_nonce: passer_nonce,
        sender: contracts.l2.l2_cross_domain_messenger,
        target: contracts.l1.l1_cross_domain_messenger,
        value: message.value,
        min_gas_limit: passer_gas_limit,
        message: encode_cross_domain_message(
            message.message_nonce,
            message.sender,
            message.target,
            message.value,
            message.min_gas_limit,
            &message.message,
        )?,
    })
}

/// Origin receipt for an L1 to L2 message
pub fn deposit_receipt(message: &CrossChainMessage, contracts: &ContractsConfig) -> TxReceipt {
    receipt(
        message.transaction_hash,
        message.block_number,
        vec![sent_message_log(
            contracts.l1.l1_cross_domain_messenger,
            message,
        )],
    )
}

/// Origin receipt for an L2 to L1 message, with its `MessagePassed` log
pub fn withdrawal_receipt(
    message: &CrossChainMessage,
    withdrawal: &LowLevelMessage,
    contracts: &ContractsConfig,
) -> TxReceipt {
    receipt(
        message.transaction_hash,
        message.block_number,
        vec![
            message_passed_log(
                contracts.l2.l2_to_l1_message_passer,
                withdrawal,
                message.block_number,
                message.transaction_hash,
                message.log_index + 1,
            ),
            sent_message_log(contracts.l2.l2_cross_domain_messenger, message),
        ],
    )
}
