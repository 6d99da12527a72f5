//! Common Test Assertions
//!
//! Assertion helpers returning `eyre` errors, for tests that drive a
//! messenger against scripted or live chains.

use alloy::primitives::TxHash;
use eyre::{eyre, Result};

use crate::messenger::CrossChainMessenger;
use crate::types::{CrossChainMessage, MessageLike, MessageStatus};

/// Assert that a message currently has `expected` status
pub async fn assert_message_status(
    messenger: &CrossChainMessenger,
    message: impl Into<MessageLike>,
    expected: MessageStatus,
) -> Result<()> {
    let actual = messenger.get_message_status(message).await?;
    if actual != expected {
        return Err(eyre!(
            "Message status mismatch: expected {}, got {}",
            expected,
            actual
        ));
    }
    Ok(())
}

/// Assert that a transaction sent exactly `expected` messages
pub async fn assert_message_count(
    messenger: &CrossChainMessenger,
    tx_hash: TxHash,
    expected: usize,
) -> Result<Vec<CrossChainMessage>> {
    let messages = messenger.get_messages_by_transaction(tx_hash, None).await?;
    if messages.len() != expected {
        return Err(eyre!(
            "Message count mismatch for {}: expected {}, got {}",
            tx_hash,
            expected,
            messages.len()
        ));
    }
    Ok(messages)
}

/// Assert that statuses observed over time never move backwards
pub fn assert_status_monotonic(observed: &[MessageStatus]) -> Result<()> {
    for pair in observed.windows(2) {
        if pair[1] < pair[0] {
            return Err(eyre!(
                "Message status went backwards: {} after {}",
                pair[1],
                pair[0]
            ));
        }
    }
    Ok(())
}
