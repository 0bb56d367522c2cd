use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::pubsub::Subscription;
use alloy::rpc::types::eth::{Block, Header};

use crate::error::PeekError;

/// One connection to the configured endpoint, shared by the one-shot report
/// and the new-heads subscriber. The report completes before the subscriber
/// starts, so the handle never has two active call sites.
#[derive(Debug)]
pub struct EvmClient {
    provider: DynProvider,
}

impl EvmClient {
    /// Connects once, fail-fast. WebSocket URLs get a pubsub-capable
    /// provider; anything else is treated as HTTP.
    pub async fn connect(url: &str) -> Result<Self, PeekError> {
        if url.starts_with("ws://") || url.starts_with("wss://") {
            let ws_connect = WsConnect::new(url);
            let ws_provider = ProviderBuilder::new()
                .connect_ws(ws_connect)
                .await
                .map_err(|err| PeekError::connection(url, err))?;
            Ok(Self {
                provider: ws_provider.erased(),
            })
        } else {
            let http_url = url
                .parse()
                .map_err(|err| PeekError::connection(url, err))?;
            let http_provider = ProviderBuilder::new().connect_http(http_url);
            Ok(Self {
                provider: http_provider.erased(),
            })
        }
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub async fn latest_block_number(&self) -> Result<u64, PeekError> {
        self.provider
            .get_block_number()
            .await
            .map_err(PeekError::query("eth_blockNumber"))
    }

    pub async fn block_by_number(&self, number: u64) -> Result<Option<Block>, PeekError> {
        self.provider
            .get_block_by_number(number.into())
            .full()
            .await
            .map_err(PeekError::query("eth_getBlockByNumber"))
    }

    /// Resolves the sender of the transaction at `index` of the block with
    /// `block_hash` via a dedicated lookup round trip.
    pub async fn transaction_sender(
        &self,
        block_hash: B256,
        index: usize,
    ) -> Result<Option<Address>, PeekError> {
        let tx = self
            .provider
            .get_transaction_by_block_hash_and_index(block_hash, index)
            .await
            .map_err(PeekError::query("eth_getTransactionByBlockHashAndIndex"))?;
        Ok(tx.map(|tx| tx.inner.signer()))
    }

    pub async fn gas_price(&self) -> Result<u128, PeekError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(PeekError::query("eth_gasPrice"))
    }

    pub async fn network_id(&self) -> Result<u64, PeekError> {
        self.provider
            .get_net_version()
            .await
            .map_err(PeekError::query("net_version"))
    }

    pub async fn client_version(&self) -> Result<String, PeekError> {
        self.provider
            .get_client_version()
            .await
            .map_err(PeekError::query("web3_clientVersion"))
    }

    /// Balance at the latest state.
    pub async fn balance_of(&self, address: Address) -> Result<U256, PeekError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(PeekError::query("eth_getBalance"))
    }

    pub async fn subscribe_new_heads(&self) -> Result<Subscription<Header>, PeekError> {
        self.provider
            .subscribe_blocks()
            .await
            .map_err(PeekError::SubscriptionSetup)
    }
}
