//! Standard Bridge Integration Test
//!
//! Exercises deposit and withdrawal builders, token pair checks and bridge
//! history queries against scripted in-memory chains.

use alloy::primitives::{address, Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolValue};
use kroma_sdk::bridge::DEFAULT_L2_GAS_LIMIT;
use kroma_sdk::evm::contracts::{KromaMintableERC20, StandardBridge as BridgeContract};
use kroma_sdk::testing::{erc20_bridge_initiated_log, CallResponse, FakeChain};
use kroma_sdk::{BridgeOptions, MessageDirection, MessengerError, StandardBridge};
use std::sync::Arc;

const USER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
const L1_BRIDGE: Address = address!("6900000000000000000000000000000000000007");
const L2_BRIDGE: Address = address!("4200000000000000000000000000000000000009");
const L1_TOKEN: Address = address!("1111111111111111111111111111111111111111");
const L2_TOKEN: Address = address!("2222222222222222222222222222222222222222");

struct TestContext {
    l1: Arc<FakeChain>,
    l2: Arc<FakeChain>,
    bridge: StandardBridge,
}

impl TestContext {
    fn new() -> Self {
        let l1 = Arc::new(FakeChain::new(900).with_signer(USER));
        let l2 = Arc::new(FakeChain::new(901).with_signer(USER));
        let bridge = StandardBridge::new(l1.clone(), l2.clone(), L1_BRIDGE, L2_BRIDGE);
        Self { l1, l2, bridge }
    }

    /// Make `L2_TOKEN` a mintable token for `remote` minted by `minter`
    fn mintable_token(&self, remote: Address, minter: Address) {
        self.l2
            .returns::<KromaMintableERC20::REMOTE_TOKENCall>(L2_TOKEN, remote.abi_encode());
        self.l2
            .returns::<KromaMintableERC20::BRIDGECall>(L2_TOKEN, minter.abi_encode());
    }
}

fn calldata(tx: &TransactionRequest) -> &Bytes {
    tx.input.input().unwrap()
}

#[tokio::test]
async fn test_supports_token_pair() {
    let ctx = TestContext::new();

    // no code at the L2 token
    assert!(!ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());

    ctx.mintable_token(L1_TOKEN, L2_BRIDGE);
    assert!(ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());

    ctx.mintable_token(Address::repeat_byte(0x33), L2_BRIDGE);
    assert!(!ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());

    ctx.mintable_token(L1_TOKEN, Address::repeat_byte(0x44));
    assert!(!ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());
}

#[tokio::test]
async fn test_supports_token_pair_reverts_vs_transport_errors() {
    let ctx = TestContext::new();

    ctx.l2.on_call::<KromaMintableERC20::REMOTE_TOKENCall>(
        L2_TOKEN,
        CallResponse::Revert("function not found".to_string()),
    );
    assert!(!ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());

    ctx.l2
        .on_call::<KromaMintableERC20::REMOTE_TOKENCall>(L2_TOKEN, CallResponse::RevertNoData);
    assert!(!ctx.bridge.supports_token_pair(L1_TOKEN, L2_TOKEN).await.unwrap());

    ctx.l2.on_call::<KromaMintableERC20::REMOTE_TOKENCall>(
        L2_TOKEN,
        CallResponse::Error("503 Service Unavailable".to_string()),
    );
    let err = ctx
        .bridge
        .supports_token_pair(L1_TOKEN, L2_TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err, MessengerError::Rpc("503 Service Unavailable".to_string()));
}

#[tokio::test]
async fn test_erc20_paths_require_supported_pair() {
    let ctx = TestContext::new();
    let expected = MessengerError::UnsupportedTokenPair {
        l1_token: L1_TOKEN,
        l2_token: L2_TOKEN,
    };
    let opts = BridgeOptions::default();

    assert_eq!(
        ctx.bridge
            .deposit_erc20(L1_TOKEN, L2_TOKEN, U256::from(1u64), &opts)
            .await
            .unwrap_err(),
        expected
    );
    assert_eq!(
        ctx.bridge
            .withdraw_erc20(L1_TOKEN, L2_TOKEN, U256::from(1u64), &opts)
            .await
            .unwrap_err(),
        expected
    );
    assert_eq!(
        ctx.bridge
            .approval(L1_TOKEN, L2_TOKEN, USER)
            .await
            .unwrap_err(),
        expected
    );
    assert!(ctx.l1.sent_transactions().is_empty());
    assert!(ctx.l2.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_deposit_eth() {
    let ctx = TestContext::new();
    let amount = U256::from(10u64).pow(U256::from(18u64));

    ctx.bridge
        .deposit_eth(amount, &BridgeOptions::default())
        .await
        .unwrap();
    let sent = ctx.l1.sent_transactions();
    assert_eq!(sent[0].to, Some(TxKind::Call(L1_BRIDGE)));
    assert_eq!(sent[0].value, Some(amount));
    assert_eq!(sent[0].from, Some(USER));
    let call = BridgeContract::bridgeETHCall::abi_decode(calldata(&sent[0]), true).unwrap();
    assert_eq!(call._minGasLimit, DEFAULT_L2_GAS_LIMIT);

    let recipient = Address::repeat_byte(0xaa);
    let opts = BridgeOptions::default()
        .with_recipient(recipient)
        .with_l2_gas_limit(300_000);
    ctx.bridge.deposit_eth(amount, &opts).await.unwrap();
    let sent = ctx.l1.sent_transactions();
    let call = BridgeContract::bridgeETHToCall::abi_decode(calldata(&sent[1]), true).unwrap();
    assert_eq!(call._to, recipient);
    assert_eq!(call._minGasLimit, 300_000);
}

#[tokio::test]
async fn test_withdraw_eth_uses_zero_gas() {
    let ctx = TestContext::new();

    let opts = BridgeOptions::default().with_l2_gas_limit(300_000);
    ctx.bridge
        .withdraw_eth(U256::from(5u64), &opts)
        .await
        .unwrap();
    let sent = ctx.l2.sent_transactions();
    assert_eq!(sent[0].to, Some(TxKind::Call(L2_BRIDGE)));
    let call = BridgeContract::bridgeETHCall::abi_decode(calldata(&sent[0]), true).unwrap();
    assert_eq!(call._minGasLimit, 0);
    assert!(ctx.l1.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_erc20_deposit_and_withdrawal() {
    let ctx = TestContext::new();
    ctx.mintable_token(L1_TOKEN, L2_BRIDGE);
    let amount = U256::from(1_000u64);

    ctx.bridge
        .deposit_erc20(L1_TOKEN, L2_TOKEN, amount, &BridgeOptions::default())
        .await
        .unwrap();
    let sent = ctx.l1.sent_transactions();
    let call = BridgeContract::bridgeERC20Call::abi_decode(calldata(&sent[0]), true).unwrap();
    assert_eq!(call._localToken, L1_TOKEN);
    assert_eq!(call._remoteToken, L2_TOKEN);
    assert_eq!(call._amount, amount);
    assert_eq!(call._minGasLimit, DEFAULT_L2_GAS_LIMIT);

    let recipient = Address::repeat_byte(0xbb);
    ctx.bridge
        .withdraw_erc20(
            L1_TOKEN,
            L2_TOKEN,
            amount,
            &BridgeOptions::default().with_recipient(recipient),
        )
        .await
        .unwrap();
    let sent = ctx.l2.sent_transactions();
    assert_eq!(sent[0].to, Some(TxKind::Call(L2_BRIDGE)));
    let call = BridgeContract::bridgeERC20ToCall::abi_decode(calldata(&sent[0]), true).unwrap();
    assert_eq!(call._localToken, L2_TOKEN);
    assert_eq!(call._remoteToken, L1_TOKEN);
    assert_eq!(call._to, recipient);
    assert_eq!(call._minGasLimit, 0);
}

#[tokio::test]
async fn test_approve_and_approval() {
    let ctx = TestContext::new();
    ctx.mintable_token(L1_TOKEN, L2_BRIDGE);
    ctx.l1.returns::<KromaMintableERC20::allowanceCall>(
        L1_TOKEN,
        U256::from(777u64).abi_encode(),
    );

    assert_eq!(
        ctx.bridge.approval(L1_TOKEN, L2_TOKEN, USER).await.unwrap(),
        U256::from(777u64)
    );

    ctx.bridge
        .approve(L1_TOKEN, L2_TOKEN, U256::from(5u64))
        .await
        .unwrap();
    let sent = ctx.l1.sent_transactions();
    assert_eq!(sent[0].to, Some(TxKind::Call(L1_TOKEN)));
    let call = KromaMintableERC20::approveCall::abi_decode(calldata(&sent[0]), true).unwrap();
    assert_eq!(call.spender, L1_BRIDGE);
    assert_eq!(call.amount, U256::from(5u64));
}

#[tokio::test]
async fn test_estimates_do_not_send() {
    let ctx = TestContext::new();
    ctx.l1.set_gas_estimate(90_000);

    let gas = ctx
        .bridge
        .estimate_deposit_eth(U256::from(1u64), &BridgeOptions::default())
        .await
        .unwrap();
    assert_eq!(gas, 90_000);
    assert!(ctx.l1.sent_transactions().is_empty());
    assert_eq!(ctx.l1.estimated_transactions().len(), 1);
}

#[tokio::test]
async fn test_send_without_signer() {
    let l1 = Arc::new(FakeChain::new(900));
    let l2 = Arc::new(FakeChain::new(901));
    let bridge = StandardBridge::new(l1, l2, L1_BRIDGE, L2_BRIDGE);

    let tx = bridge
        .populate_deposit_eth(U256::from(1u64), &BridgeOptions::default())
        .await
        .unwrap();
    assert_eq!(tx.from, None);

    let err = bridge
        .deposit_eth(U256::from(1u64), &BridgeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, MessengerError::MissingSigner);
}

#[tokio::test]
async fn test_bridge_history_newest_first() {
    let ctx = TestContext::new();
    let other = Address::repeat_byte(0x99);

    for (block, from) in [(10u64, USER), (30, USER), (20, USER), (25, other)] {
        ctx.l1.add_log(erc20_bridge_initiated_log(
            L1_BRIDGE,
            L1_TOKEN,
            L2_TOKEN,
            from,
            from,
            U256::from(block),
            block,
            B256::from(U256::from(block)),
        ));
    }

    let deposits = ctx
        .bridge
        .get_deposits_by_address(USER, None, None)
        .await
        .unwrap();
    let blocks: Vec<u64> = deposits.iter().map(|d| d.block_number).collect();
    assert_eq!(blocks, vec![30, 20, 10]);
    assert!(deposits
        .iter()
        .all(|d| d.direction == MessageDirection::L1ToL2 && d.l1_token == L1_TOKEN));

    let ranged = ctx
        .bridge
        .get_deposits_by_address(USER, Some(15), Some(25))
        .await
        .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].block_number, 20);

    // the L2 bridge names the L2 token as local
    ctx.l2.add_log(erc20_bridge_initiated_log(
        L2_BRIDGE,
        L2_TOKEN,
        L1_TOKEN,
        USER,
        USER,
        U256::from(3u64),
        40,
        B256::repeat_byte(0x40),
    ));
    let withdrawals = ctx
        .bridge
        .get_withdrawals_by_address(USER, None, None)
        .await
        .unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].direction, MessageDirection::L2ToL1);
    assert_eq!(withdrawals[0].l1_token, L1_TOKEN);
    assert_eq!(withdrawals[0].l2_token, L2_TOKEN);
}
