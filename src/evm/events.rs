//! Event parsing
//!
//! Turns raw logs into [`CrossChainMessage`]s, withdrawals recorded by the
//! message passer, and bridge transfers.

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evm::contracts::{
    CrossDomainMessenger::SentMessage, L2ToL1MessagePasser::MessagePassed,
    StandardBridge::ERC20BridgeInitiated,
};
use crate::types::{CrossChainMessage, Erc20BridgeMessage, MessageDirection, TxReceipt};

/// Withdrawal as recorded by a `MessagePassed` log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePassedEvent {
    pub nonce: U256,
    pub sender: Address,
    pub target: Address,
    pub value: U256,
    pub gas_limit: U256,
    pub data: Bytes,
    pub withdrawal_hash: B256,
}

fn is_event<E: SolEvent>(log: &Log, emitter: Address) -> bool {
    log.address() == emitter && log.topics().first() == Some(&E::SIGNATURE_HASH)
}

/// Decode a `SentMessage` log
pub fn parse_sent_message(log: &Log, direction: MessageDirection) -> Option<CrossChainMessage> {
    let decoded = match log.log_decode::<SentMessage>() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, address = %log.address(), "Failed to decode SentMessage log");
            return None;
        }
    };
    let event = &decoded.inner.data;

    Some(CrossChainMessage {
        direction,
        sender: event.sender,
        target: event.target,
        message: event.message.clone(),
        message_nonce: event.messageNonce,
        value: event.value,
        min_gas_limit: event.gasLimit,
        log_index: log.log_index.unwrap_or_default(),
        block_number: log.block_number.unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
    })
}

/// Every `SentMessage` emitted by `messenger` in `receipt`, in log order
pub fn sent_messages_in_receipt(
    receipt: &TxReceipt,
    messenger: Address,
    direction: MessageDirection,
) -> Vec<CrossChainMessage> {
    receipt
        .logs
        .iter()
        .filter(|log| is_event::<SentMessage>(log, messenger))
        .filter_map(|log| parse_sent_message(log, direction))
        .collect()
}

/// Decode a `MessagePassed` log
pub fn parse_message_passed(log: &Log) -> Option<MessagePassedEvent> {
    let decoded = match log.log_decode::<MessagePassed>() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, address = %log.address(), "Failed to decode MessagePassed log");
            return None;
        }
    };
    let event = &decoded.inner.data;

    Some(MessagePassedEvent {
        nonce: event.nonce,
        sender: event.sender,
        target: event.target,
        value: event.value,
        gas_limit: event.gasLimit,
        data: event.data.clone(),
        withdrawal_hash: event.withdrawalHash,
    })
}

/// Every `MessagePassed` emitted by `message_passer` in `receipt`
pub fn message_passed_in_receipt(
    receipt: &TxReceipt,
    message_passer: Address,
) -> Vec<MessagePassedEvent> {
    receipt
        .logs
        .iter()
        .filter(|log| is_event::<MessagePassed>(log, message_passer))
        .filter_map(parse_message_passed)
        .collect()
}

/// Decode an `ERC20BridgeInitiated` log
///
/// The event names tokens relative to the emitting bridge, so for withdrawals
/// the local token is the L2 token.
pub fn parse_erc20_bridge_initiated(
    log: &Log,
    direction: MessageDirection,
) -> Option<Erc20BridgeMessage> {
    let decoded = match log.log_decode::<ERC20BridgeInitiated>() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(
                error = %e,
                address = %log.address(),
                "Failed to decode ERC20BridgeInitiated log"
            );
            return None;
        }
    };
    let event = &decoded.inner.data;

    let (l1_token, l2_token) = match direction {
        MessageDirection::L1ToL2 => (event.localToken, event.remoteToken),
        MessageDirection::L2ToL1 => (event.remoteToken, event.localToken),
    };

    Some(Erc20BridgeMessage {
        direction,
        from: event.from,
        to: event.to,
        l1_token,
        l2_token,
        amount: event.amount,
        data: event.extraData.clone(),
        log_index: log.log_index.unwrap_or_default(),
        block_number: log.block_number.unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or(TxHash::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, bytes};

    fn rpc_log(address: Address, data: alloy::primitives::LogData, index: u64) -> Log {
        Log {
            inner: alloy::primitives::Log { address, data },
            block_number: Some(42),
            transaction_hash: Some(B256::repeat_byte(0x99)),
            log_index: Some(index),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_sent_message() {
        let messenger = address!("6900000000000000000000000000000000000006");
        let event = SentMessage {
            target: address!("2222222222222222222222222222222222222222"),
            sender: address!("1111111111111111111111111111111111111111"),
            message: bytes!("deadbeef"),
            messageNonce: U256::from(7u64),
            value: U256::from(5u64),
            gasLimit: U256::from(100_000u64),
        };
        let log = rpc_log(messenger, event.encode_log_data(), 3);

        let message = parse_sent_message(&log, MessageDirection::L1ToL2).unwrap();
        assert_eq!(message.target, event.target);
        assert_eq!(message.sender, event.sender);
        assert_eq!(message.message, event.message);
        assert_eq!(message.message_nonce, U256::from(7u64));
        assert_eq!(message.min_gas_limit, U256::from(100_000u64));
        assert_eq!(message.log_index, 3);
        assert_eq!(message.block_number, 42);
        assert_eq!(message.transaction_hash, B256::repeat_byte(0x99));
    }

    #[test]
    fn test_sent_messages_in_receipt_filters_by_emitter() {
        let messenger = address!("6900000000000000000000000000000000000006");
        let event = SentMessage {
            target: Address::repeat_byte(2),
            sender: Address::repeat_byte(1),
            message: Bytes::new(),
            messageNonce: U256::ZERO,
            value: U256::ZERO,
            gasLimit: U256::ZERO,
        };
        let receipt = TxReceipt {
            transaction_hash: B256::repeat_byte(0x99),
            block_number: 42,
            block_hash: None,
            status: true,
            logs: vec![
                rpc_log(Address::repeat_byte(0xee), event.encode_log_data(), 0),
                rpc_log(messenger, event.encode_log_data(), 1),
            ],
        };

        let messages = sent_messages_in_receipt(&receipt, messenger, MessageDirection::L1ToL2);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].log_index, 1);
    }

    #[test]
    fn test_parse_erc20_bridge_initiated_swaps_tokens_for_withdrawals() {
        let l1_token = Address::repeat_byte(0x11);
        let l2_token = Address::repeat_byte(0x22);
        let event = ERC20BridgeInitiated {
            localToken: l2_token,
            remoteToken: l1_token,
            from: Address::repeat_byte(0x33),
            to: Address::repeat_byte(0x44),
            amount: U256::from(1000u64),
            extraData: Bytes::new(),
        };
        let log = rpc_log(Address::repeat_byte(0x42), event.encode_log_data(), 0);

        let message = parse_erc20_bridge_initiated(&log, MessageDirection::L2ToL1).unwrap();
        assert_eq!(message.l1_token, l1_token);
        assert_eq!(message.l2_token, l2_token);
        assert_eq!(message.amount, U256::from(1000u64));
    }

    #[test]
    fn test_parse_wrong_event_returns_none() {
        let event = SentMessage {
            target: Address::ZERO,
            sender: Address::ZERO,
            message: Bytes::new(),
            messageNonce: U256::ZERO,
            value: U256::ZERO,
            gasLimit: U256::ZERO,
        };
        let log = rpc_log(Address::ZERO, event.encode_log_data(), 0);
        assert!(parse_message_passed(&log).is_none());
    }
}
