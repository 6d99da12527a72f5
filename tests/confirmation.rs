//! Confirmation Wrapper Integration Test
//!
//! Sends through `ConfirmingSender` on an auto-mining in-memory chain.

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use kroma_sdk::evm::{ConfirmationConfig, ConfirmingSender};
use kroma_sdk::testing::{sent_tx_hash, FakeChain};
use kroma_sdk::{
    CrossChainMessageRequest, CrossChainMessenger, MessageDirection, MessengerConfig,
    MessengerError,
};
use std::sync::Arc;
use std::time::Duration;

fn transfer() -> TransactionRequest {
    TransactionRequest::default()
        .to(Address::repeat_byte(0x22))
        .value(U256::from(1u64))
}

fn fast_config(confirmations: u64, timeout_ms: u64) -> ConfirmationConfig {
    ConfirmationConfig {
        confirmations,
        poll_interval: Duration::from_millis(5),
        timeout: Duration::from_millis(timeout_ms),
        gas_price: None,
    }
}

#[tokio::test]
async fn test_send_returns_once_included() {
    let chain = Arc::new(
        FakeChain::new(900)
            .with_signer(Address::repeat_byte(1))
            .with_auto_mine(),
    );
    let sender = ConfirmingSender::with_config(chain.clone(), fast_config(1, 1_000));

    let receipt = sender.send(transfer()).await.unwrap();
    assert_eq!(receipt.transaction_hash, sent_tx_hash(1));
    assert!(receipt.status);
}

#[tokio::test]
async fn test_send_waits_for_depth() {
    let chain = Arc::new(
        FakeChain::new(900)
            .with_signer(Address::repeat_byte(1))
            .with_auto_mine(),
    );
    let sender = ConfirmingSender::with_config(chain.clone(), fast_config(3, 5_000));

    let miner = chain.clone();
    let mining = tokio::spawn(async move {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            miner.mine(1);
        }
    });

    let receipt = sender.send(transfer()).await.unwrap();
    assert!(chain.block_number() >= receipt.block_number + 2);
    mining.await.unwrap();
}

#[tokio::test]
async fn test_send_times_out() {
    let chain = Arc::new(
        FakeChain::new(900)
            .with_signer(Address::repeat_byte(1))
            .with_auto_mine(),
    );
    let sender = ConfirmingSender::with_config(chain.clone(), fast_config(10, 30));

    let err = sender.send(transfer()).await.unwrap_err();
    assert!(matches!(
        err,
        MessengerError::Timeout {
            operation: "transaction confirmation",
            ..
        }
    ));
}

#[tokio::test]
async fn test_gas_price_override() {
    let chain = Arc::new(
        FakeChain::new(900)
            .with_signer(Address::repeat_byte(1))
            .with_auto_mine(),
    );
    let config = ConfirmationConfig {
        gas_price: Some(7),
        ..fast_config(1, 1_000)
    };
    let sender = ConfirmingSender::with_config(chain.clone(), config);

    sender.send(transfer()).await.unwrap();
    assert_eq!(chain.sent_transactions()[0].gas_price, Some(7));

    // unscripted targets return empty output
    let output = sender.call(transfer()).await.unwrap();
    assert_eq!(output, Bytes::new());
}

#[tokio::test]
async fn test_send_propagates_missing_signer() {
    let chain = Arc::new(FakeChain::new(900));
    let sender = ConfirmingSender::new(chain);

    assert_eq!(sender.config().confirmations, 0);
    let err = sender.send(transfer()).await.unwrap_err();
    assert_eq!(err, MessengerError::MissingSigner);
}

#[tokio::test]
async fn test_populated_message_sent_with_confirmations() {
    let signer = Address::repeat_byte(1);
    let l1 = Arc::new(FakeChain::new(900).with_signer(signer));
    let l2 = Arc::new(FakeChain::new(901).with_signer(signer).with_auto_mine());
    let messenger =
        CrossChainMessenger::new(l1.clone(), l2.clone(), &MessengerConfig::new(900, 901)).unwrap();

    let request = CrossChainMessageRequest {
        direction: MessageDirection::L2ToL1,
        target: Address::repeat_byte(0x22),
        message: Bytes::from_static(&[0xc0, 0xff, 0xee]),
    };
    let tx = messenger.populate_send_message(&request, None).await.unwrap();

    let sender =
        ConfirmingSender::with_config(messenger.l2_provider().clone(), fast_config(2, 5_000));
    let miner = l2.clone();
    let mining = tokio::spawn(async move {
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            miner.mine(1);
        }
    });

    let receipt = sender.send(tx).await.unwrap();
    assert_eq!(receipt.transaction_hash, sent_tx_hash(1));
    assert!(l2.block_number() >= receipt.block_number + 1);
    assert_eq!(
        l2.sent_transactions()[0].to,
        Some(alloy::primitives::TxKind::Call(
            messenger.contracts().l2.l2_cross_domain_messenger
        ))
    );
    assert!(l1.sent_transactions().is_empty());
    mining.await.unwrap();
}
