//! JSON-RPC chain provider
//!
//! Adapts an alloy [`Provider`] over HTTP to [`ChainProvider`].

use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::{Address, Bytes, TxHash, B256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Log, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::decode_revert_reason,
    transports::{
        http::{Client, Http},
        TransportError,
    },
};
use async_trait::async_trait;
use eyre::{eyre, Result as EyreResult};
use tracing::{debug, info};

use crate::error::{MessengerError, Result};
use crate::evm::provider::{AccountProof, BlockHeader, ChainProvider, LogQuery};
use crate::types::TxReceipt;

/// [`ChainProvider`] backed by an alloy HTTP provider
pub struct AlloyChainProvider<P> {
    provider: P,
    signer_address: Option<Address>,
}

/// Read-only provider over HTTP
pub type HttpChainProvider = AlloyChainProvider<RootProvider<Http<Client>>>;

impl HttpChainProvider {
    /// Read-only provider for `rpc_url`
    pub fn connect_http(rpc_url: &str) -> EyreResult<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        info!(rpc_url = %rpc_url, "Created read-only chain provider");

        Ok(Self {
            provider,
            signer_address: None,
        })
    }

    /// Provider that signs with `private_key` and fills nonce, gas and fees
    pub fn connect_http_with_signer(
        rpc_url: &str,
        private_key: &str,
    ) -> EyreResult<AlloyChainProvider<impl Provider<Http<Client>> + Clone>> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(
                rpc_url
                    .parse()
                    .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
            );

        info!(
            rpc_url = %rpc_url,
            address = %address,
            "Created chain provider with signer"
        );

        Ok(AlloyChainProvider {
            provider,
            signer_address: Some(address),
        })
    }
}

impl<P> AlloyChainProvider<P> {
    /// Wrap an already configured alloy provider
    pub fn new(provider: P, signer_address: Option<Address>) -> Self {
        Self {
            provider,
            signer_address,
        }
    }

    pub fn inner(&self) -> &P {
        &self.provider
    }
}

/// Separate contract reverts from transport failures
///
/// Nodes report reverts as JSON-RPC error responses carrying the revert data.
/// Some only include the reason in the message, in node-specific wording, so
/// the whole message is kept when it has no geth-style prefix.
pub(crate) fn classify_rpc_error(err: TransportError) -> MessengerError {
    if let Some(payload) = err.as_error_resp() {
        if let Some(data) = payload.as_revert_data() {
            let reason = decode_revert_reason(&data);
            return MessengerError::Reverted {
                reason,
                data: Some(data),
            };
        }

        let message = payload.message.to_string();
        if message.contains("revert") {
            let reason = message
                .strip_prefix("execution reverted: ")
                .map(str::to_string)
                .unwrap_or(message);
            return MessengerError::Reverted {
                reason: Some(reason),
                data: None,
            };
        }
    }

    MessengerError::Rpc(err.to_string())
}

fn rpc_error(err: TransportError) -> MessengerError {
    MessengerError::Rpc(err.to_string())
}

#[async_trait]
impl<P> ChainProvider for AlloyChainProvider<P>
where
    P: Provider<Http<Client>> + Send + Sync,
{
    async fn get_chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }

    async fn get_block_number(&self) -> Result<u64> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_error)?;
        Ok(receipt.as_ref().map(TxReceipt::from))
    }

    async fn get_block(&self, block: BlockNumberOrTag) -> Result<Option<BlockHeader>> {
        self.provider
            .raw_request::<_, Option<BlockHeader>>("eth_getBlockByNumber".into(), (block, false))
            .await
            .map_err(rpc_error)
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>> {
        let logs = self
            .provider
            .get_logs(&query.to_filter())
            .await
            .map_err(rpc_error)?;

        debug!(
            address = %query.address,
            from = query.from_block,
            count = logs.len(),
            "Fetched logs"
        );

        Ok(logs)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.provider.call(&tx).await.map_err(classify_rpc_error)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(tx)
            .await
            .map_err(classify_rpc_error)
    }

    async fn get_proof(
        &self,
        address: Address,
        keys: Vec<B256>,
        block: u64,
    ) -> Result<AccountProof> {
        self.provider
            .raw_request::<_, AccountProof>(
                "eth_getProof".into(),
                (address, keys, BlockNumberOrTag::Number(block)),
            )
            .await
            .map_err(rpc_error)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        if self.signer_address.is_none() {
            return Err(MessengerError::MissingSigner);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify_rpc_error)?;
        let tx_hash = *pending.tx_hash();

        info!(tx_hash = %tx_hash, "Transaction sent");

        Ok(tx_hash)
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::sol_types::{Revert, SolError};

    fn error_response(message: &str, data: Option<serde_json::Value>) -> TransportError {
        let payload = ErrorPayload {
            code: 3,
            message: message.to_string().into(),
            data: data.map(|d| serde_json::value::to_raw_value(&d).unwrap()),
        };
        TransportError::ErrorResp(payload)
    }

    #[test]
    fn test_classify_revert_with_reason() {
        let revert = Revert {
            reason: "KromaPortal: withdrawal has already been proven".to_string(),
        };
        let data = Bytes::from(revert.abi_encode());
        let err = classify_rpc_error(error_response(
            "execution reverted",
            Some(serde_json::Value::String(data.to_string())),
        ));

        assert!(err.is_revert());
        assert!(err.is_revert_with("already been proven"));
    }

    #[test]
    fn test_classify_revert_from_message() {
        let err = classify_rpc_error(error_response(
            "execution reverted: StandardBridge: wrong remote token",
            None,
        ));
        assert!(err.is_revert_with("wrong remote token"));
    }

    #[test]
    fn test_classify_revert_from_other_node_wording() {
        let err = classify_rpc_error(error_response(
            "VM Exception while processing transaction: revert L2OutputOracle: cannot get output for a block that has not been proposed",
            None,
        ));
        assert!(err.is_revert());
        assert!(err.is_revert_with("L2OutputOracle: cannot get output"));
    }

    #[test]
    fn test_classify_other_errors() {
        let err = classify_rpc_error(error_response("header not found", None));
        assert!(matches!(err, MessengerError::Rpc(_)));
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(HttpChainProvider::connect_http("not a url").is_err());
        let provider = HttpChainProvider::connect_http("http://localhost:8545").unwrap();
        assert_eq!(provider.signer_address(), None);
    }

    #[test]
    fn test_connect_with_signer_exposes_address() {
        let provider = HttpChainProvider::connect_http_with_signer(
            "http://localhost:8545",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            provider.signer_address(),
            Some(alloy::primitives::address!(
                "f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            ))
        );
        assert!(
            HttpChainProvider::connect_http_with_signer("http://localhost:8545", "zz").is_err()
        );
    }
}
