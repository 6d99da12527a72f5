//! Send transactions and wait for a confirmation depth
//!
//! The send forms on `CrossChainMessenger` and `StandardBridge` return as soon
//! as the node accepts the transaction. To wait for depth, build the request
//! with the matching `populate_*` form and submit it through a
//! [`ConfirmingSender`] over the chain it targets:
//!
//! ```ignore
//! let tx = messenger.populate_finalize_message(&message).await?;
//! let sender = ConfirmingSender::with_config(messenger.l1_provider().clone(), config);
//! let receipt = sender.send(tx).await?;
//! ```

use alloy::primitives::Bytes;
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{MessengerError, Result};
use crate::evm::provider::ChainProvider;
use crate::types::TxReceipt;

/// Confirmation wrapper configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationConfig {
    /// Blocks on top of the inclusion block, counting it, before a send returns
    pub confirmations: u64,
    pub poll_interval: Duration,
    /// Wall-clock bound on the whole wait
    pub timeout: Duration,
    /// Gas price applied to every sent transaction, provider default if unset
    pub gas_price: Option<u128>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            confirmations: 0,
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
            gas_price: None,
        }
    }
}

/// Wraps a provider so sends only return once confirmed
pub struct ConfirmingSender {
    provider: Arc<dyn ChainProvider>,
    config: ConfirmationConfig,
}

impl ConfirmingSender {
    pub fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self::with_config(provider, ConfirmationConfig::default())
    }

    pub fn with_config(provider: Arc<dyn ChainProvider>, config: ConfirmationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    /// `eth_call` with a zero gas price
    pub async fn call(&self, mut tx: TransactionRequest) -> Result<Bytes> {
        tx.gas_price = Some(0);
        self.provider.call(tx).await
    }

    /// Submit `tx` and wait until it reaches the configured depth
    pub async fn send(&self, mut tx: TransactionRequest) -> Result<TxReceipt> {
        if let Some(gas_price) = self.config.gas_price {
            tx.gas_price = Some(gas_price);
        }

        let tx_hash = self.provider.send_transaction(tx).await?;
        let start = Instant::now();

        while start.elapsed() < self.config.timeout {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                let latest = self.provider.get_block_number().await?;
                let depth = latest.saturating_sub(receipt.block_number) + 1;

                if depth >= self.config.confirmations {
                    info!(
                        tx_hash = %tx_hash,
                        block = receipt.block_number,
                        confirmations = depth,
                        "Transaction confirmed"
                    );
                    return Ok(receipt);
                }

                debug!(
                    tx_hash = %tx_hash,
                    confirmations = depth,
                    required = self.config.confirmations,
                    "Waiting for confirmations"
                );
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(MessengerError::Timeout {
            operation: "transaction confirmation",
            elapsed: start.elapsed(),
        })
    }
}
