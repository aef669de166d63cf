use async_trait::async_trait;
use common::models::OptionChain;

use crate::error::FetchError;

pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, FetchError>;
}

/// A single fetch attempt against an option-chain provider.
#[async_trait]
pub trait OptionChainSource: Send + Sync {
    async fn fetch_chain(&self, symbol: &str) -> Result<OptionChain, FetchError>;
}
