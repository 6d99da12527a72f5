//! Standard bridge adapter
//!
//! Deposits go through the L1StandardBridge, withdrawals through the
//! L2StandardBridge. ERC20 paths check that the L2 token is a
//! `KromaMintableERC20` paired with the given L1 token before building a
//! transaction.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolEvent;
use std::sync::Arc;
use tracing::debug;

use crate::error::{MessengerError, Result};
use crate::evm::contracts::{
    KromaMintableERC20, StandardBridge as StandardBridgeContract,
    StandardBridge::ERC20BridgeInitiated,
};
use crate::evm::events::parse_erc20_bridge_initiated;
use crate::evm::provider::{call_contract, contract_request, ChainProvider, LogQuery};
use crate::types::{Erc20BridgeMessage, MessageDirection};

/// L2 gas limit used for deposits when the caller does not set one
pub const DEFAULT_L2_GAS_LIMIT: u32 = 200_000;

/// Options shared by deposit and withdrawal builders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Send to this address instead of the sender, via the `*To` entry points
    pub recipient: Option<Address>,
    /// Deposits only; withdrawals always use 0
    pub l2_gas_limit: Option<u32>,
}

impl BridgeOptions {
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_l2_gas_limit(mut self, l2_gas_limit: u32) -> Self {
        self.l2_gas_limit = Some(l2_gas_limit);
        self
    }
}

/// Adapter over the L1 and L2 standard bridges
pub struct StandardBridge {
    l1: Arc<dyn ChainProvider>,
    l2: Arc<dyn ChainProvider>,
    l1_bridge: Address,
    l2_bridge: Address,
}

impl StandardBridge {
    pub fn new(
        l1: Arc<dyn ChainProvider>,
        l2: Arc<dyn ChainProvider>,
        l1_bridge: Address,
        l2_bridge: Address,
    ) -> Self {
        Self {
            l1,
            l2,
            l1_bridge,
            l2_bridge,
        }
    }

    pub fn l1_bridge(&self) -> Address {
        self.l1_bridge
    }

    pub fn l2_bridge(&self) -> Address {
        self.l2_bridge
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// ERC20 deposits initiated by `address`, newest block first
    pub async fn get_deposits_by_address(
        &self,
        address: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<Erc20BridgeMessage>> {
        self.bridge_messages(
            self.l1.as_ref(),
            self.l1_bridge,
            address,
            MessageDirection::L1ToL2,
            from_block,
            to_block,
        )
        .await
    }

    /// ERC20 withdrawals initiated by `address`, newest block first
    pub async fn get_withdrawals_by_address(
        &self,
        address: Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<Erc20BridgeMessage>> {
        self.bridge_messages(
            self.l2.as_ref(),
            self.l2_bridge,
            address,
            MessageDirection::L2ToL1,
            from_block,
            to_block,
        )
        .await
    }

    async fn bridge_messages(
        &self,
        provider: &dyn ChainProvider,
        bridge: Address,
        from: Address,
        direction: MessageDirection,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<Erc20BridgeMessage>> {
        let mut query = LogQuery::new(bridge, ERC20BridgeInitiated::SIGNATURE_HASH)
            .topic3(from.into_word())
            .from_block(from_block.unwrap_or(0));
        if let Some(to_block) = to_block {
            query = query.to_block(to_block);
        }

        let logs = provider.get_logs(&query).await?;
        let mut messages: Vec<Erc20BridgeMessage> = logs
            .iter()
            .filter_map(|log| parse_erc20_bridge_initiated(log, direction))
            .collect();

        messages.sort_by(|a, b| b.block_number.cmp(&a.block_number));

        debug!(
            address = %from,
            direction = %direction,
            count = messages.len(),
            "Fetched bridge messages"
        );

        Ok(messages)
    }

    /// Whether the bridge can move `l1_token` to `l2_token`
    ///
    /// A token that reverts on the mintable-token getters is not bridgeable.
    pub async fn supports_token_pair(&self, l1_token: Address, l2_token: Address) -> Result<bool> {
        match self.check_token_pair(l1_token, l2_token).await {
            Ok(supported) => Ok(supported),
            Err(MessengerError::Reverted { reason, .. }) => {
                debug!(
                    l1_token = %l1_token,
                    l2_token = %l2_token,
                    reason = ?reason,
                    "Token pair check reverted"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn check_token_pair(&self, l1_token: Address, l2_token: Address) -> Result<bool> {
        let remote = call_contract(
            self.l2.as_ref(),
            l2_token,
            &KromaMintableERC20::REMOTE_TOKENCall {},
        )
        .await?
        ._0;
        if remote != l1_token {
            return Ok(false);
        }

        let bridge = call_contract(self.l2.as_ref(), l2_token, &KromaMintableERC20::BRIDGECall {})
            .await?
            ._0;
        Ok(bridge == self.l2_bridge)
    }

    async fn require_token_pair(&self, l1_token: Address, l2_token: Address) -> Result<()> {
        if self.supports_token_pair(l1_token, l2_token).await? {
            Ok(())
        } else {
            Err(MessengerError::UnsupportedTokenPair { l1_token, l2_token })
        }
    }

    /// Amount of `l1_token` the L1 bridge may spend on behalf of `owner`
    pub async fn approval(
        &self,
        l1_token: Address,
        l2_token: Address,
        owner: Address,
    ) -> Result<U256> {
        self.require_token_pair(l1_token, l2_token).await?;

        let allowance = call_contract(
            self.l1.as_ref(),
            l1_token,
            &KromaMintableERC20::allowanceCall {
                owner,
                spender: self.l1_bridge,
            },
        )
        .await?;
        Ok(allowance._0)
    }

    // =========================================================================
    // Transaction Builders
    // =========================================================================

    pub async fn populate_approve(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> Result<TransactionRequest> {
        self.require_token_pair(l1_token, l2_token).await?;

        let call = KromaMintableERC20::approveCall {
            spender: self.l1_bridge,
            amount,
        };
        Ok(with_sender(self.l1.as_ref(), contract_request(l1_token, &call)))
    }

    pub async fn populate_deposit_eth(
        &self,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TransactionRequest> {
        let gas = opts.l2_gas_limit.unwrap_or(DEFAULT_L2_GAS_LIMIT);
        let tx = eth_bridge_request(self.l1_bridge, opts.recipient, gas).value(amount);
        Ok(with_sender(self.l1.as_ref(), tx))
    }

    pub async fn populate_deposit_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TransactionRequest> {
        self.require_token_pair(l1_token, l2_token).await?;

        let gas = opts.l2_gas_limit.unwrap_or(DEFAULT_L2_GAS_LIMIT);
        let tx = erc20_bridge_request(
            self.l1_bridge,
            l1_token,
            l2_token,
            opts.recipient,
            amount,
            gas,
        );
        Ok(with_sender(self.l1.as_ref(), tx))
    }

    pub async fn populate_withdraw_eth(
        &self,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TransactionRequest> {
        let tx = eth_bridge_request(self.l2_bridge, opts.recipient, 0).value(amount);
        Ok(with_sender(self.l2.as_ref(), tx))
    }

    pub async fn populate_withdraw_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TransactionRequest> {
        self.require_token_pair(l1_token, l2_token).await?;

        let tx = erc20_bridge_request(
            self.l2_bridge,
            l2_token,
            l1_token,
            opts.recipient,
            amount,
            0,
        );
        Ok(with_sender(self.l2.as_ref(), tx))
    }

    // =========================================================================
    // Gas Estimation
    // =========================================================================

    pub async fn estimate_approve(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> Result<u64> {
        let tx = self.populate_approve(l1_token, l2_token, amount).await?;
        self.l1.estimate_gas(&tx).await
    }

    pub async fn estimate_deposit_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<u64> {
        let tx = self.populate_deposit_eth(amount, opts).await?;
        self.l1.estimate_gas(&tx).await
    }

    pub async fn estimate_deposit_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<u64> {
        let tx = self
            .populate_deposit_erc20(l1_token, l2_token, amount, opts)
            .await?;
        self.l1.estimate_gas(&tx).await
    }

    pub async fn estimate_withdraw_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<u64> {
        let tx = self.populate_withdraw_eth(amount, opts).await?;
        self.l2.estimate_gas(&tx).await
    }

    pub async fn estimate_withdraw_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<u64> {
        let tx = self
            .populate_withdraw_erc20(l1_token, l2_token, amount, opts)
            .await?;
        self.l2.estimate_gas(&tx).await
    }

    // =========================================================================
    // Transaction Sending
    // =========================================================================

    pub async fn approve(&self, l1_token: Address, l2_token: Address, amount: U256) -> Result<TxHash> {
        let tx = self.populate_approve(l1_token, l2_token, amount).await?;
        self.l1.send_transaction(tx).await
    }

    pub async fn deposit_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<TxHash> {
        let tx = self.populate_deposit_eth(amount, opts).await?;
        self.l1.send_transaction(tx).await
    }

    pub async fn deposit_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TxHash> {
        let tx = self
            .populate_deposit_erc20(l1_token, l2_token, amount, opts)
            .await?;
        self.l1.send_transaction(tx).await
    }

    pub async fn withdraw_eth(&self, amount: U256, opts: &BridgeOptions) -> Result<TxHash> {
        let tx = self.populate_withdraw_eth(amount, opts).await?;
        self.l2.send_transaction(tx).await
    }

    pub async fn withdraw_erc20(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
        opts: &BridgeOptions,
    ) -> Result<TxHash> {
        let tx = self
            .populate_withdraw_erc20(l1_token, l2_token, amount, opts)
            .await?;
        self.l2.send_transaction(tx).await
    }
}

/// Set `from` to the provider's signer when it has one
pub(crate) fn with_sender(provider: &dyn ChainProvider, tx: TransactionRequest) -> TransactionRequest {
    match provider.signer_address() {
        Some(from) => tx.from(from),
        None => tx,
    }
}

fn eth_bridge_request(bridge: Address, recipient: Option<Address>, gas: u32) -> TransactionRequest {
    match recipient {
        None => contract_request(
            bridge,
            &StandardBridgeContract::bridgeETHCall {
                _minGasLimit: gas,
                _extraData: Bytes::new(),
            },
        ),
        Some(to) => contract_request(
            bridge,
            &StandardBridgeContract::bridgeETHToCall {
                _to: to,
                _minGasLimit: gas,
                _extraData: Bytes::new(),
            },
        ),
    }
}

fn erc20_bridge_request(
    bridge: Address,
    local_token: Address,
    remote_token: Address,
    recipient: Option<Address>,
    amount: U256,
    gas: u32,
) -> TransactionRequest {
    match recipient {
        None => contract_request(
            bridge,
            &StandardBridgeContract::bridgeERC20Call {
                _localToken: local_token,
                _remoteToken: remote_token,
                _amount: amount,
                _minGasLimit: gas,
                _extraData: Bytes::new(),
            },
        ),
        Some(to) => contract_request(
            bridge,
            &StandardBridgeContract::bridgeERC20ToCall {
                _localToken: local_token,
                _remoteToken: remote_token,
                _to: to,
                _amount: amount,
                _minGasLimit: gas,
                _extraData: Bytes::new(),
            },
        ),
    }
}
