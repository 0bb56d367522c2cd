use alloy::primitives::B256;
use alloy::transports::TransportError;
use thiserror::Error;

/// Every failure mode of the client. All of them are fatal: the binary
/// converts the first one it sees into its exit diagnostic and terminates.
#[derive(Debug, Error)]
pub enum PeekError {
    #[error("configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("failed to connect to {url}")]
    Connection {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{call} failed")]
    Query {
        call: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("transaction {index} of block {block} not found")]
    TransactionNotFound { block: B256, index: usize },

    #[error("failed to subscribe to new heads")]
    SubscriptionSetup(#[source] TransportError),

    #[error("new-heads subscription ended: {0}")]
    Stream(String),

    #[error("failed to write report output")]
    Output(#[from] std::io::Error),
}

impl PeekError {
    pub fn connection(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn query(call: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| Self::Query { call, source }
    }
}
