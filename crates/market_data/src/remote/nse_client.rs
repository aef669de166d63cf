use std::time::Duration;

use async_trait::async_trait;
use common::models::OptionChain;
use reqwest::{
    Client, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use tracing::{debug, info, warn};

use super::{get_nse_base_url, nse_symbol, option_chain_response::OptionChainResponse};
use crate::{error::FetchError, traits::{OptionChainSource, RemoteResponse}};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Option-chain client for the NSE website.
///
/// Every call builds a fresh cookie session: the API only answers requests that
/// carry the cookies handed out by the homepage.
#[derive(Clone)]
pub struct NseClient {
    base_url: String,
    bootstrap_timeout: Duration,
    request_timeout: Duration,
}

impl NseClient {
    pub fn new() -> Self {
        Self::with_base_url(get_nse_base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bootstrap_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn chain_url(&self) -> String {
        format!("{}/api/option-chain-indices", self.base_url)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers
    }

    fn build_session(&self) -> Result<Client, FetchError> {
        let client = Client::builder()
            .default_headers(Self::default_headers())
            .cookie_store(true)
            .build()?;
        Ok(client)
    }

    async fn bootstrap_session(&self, session: &Client) {
        match session
            .get(&self.base_url)
            .timeout(self.bootstrap_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => debug!("NSE session established"),
            Ok(resp) => warn!("NSE homepage returned status: {}", resp.status()),
            Err(e) => warn!("Could not establish NSE session: {}", e),
        }
    }

    fn check_status(status: StatusCode) -> Result<(), FetchError> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::Blocked(status.as_u16())),
            s => Err(FetchError::Status {
                status: s.as_u16(),
                reason: s.canonical_reason().unwrap_or("unknown").to_string(),
            }),
        }
    }
}

impl Default for NseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OptionChainSource for NseClient {
    async fn fetch_chain(&self, symbol: &str) -> Result<OptionChain, FetchError> {
        let session = self.build_session()?;
        self.bootstrap_session(&session).await;

        let symbol = nse_symbol(symbol);
        let resp = session
            .get(self.chain_url())
            .query(&[("symbol", symbol.as_str())])
            .timeout(self.request_timeout)
            .send()
            .await?;

        Self::check_status(resp.status())?;

        let body = resp.text().await?;
        let chain = OptionChainResponse::parse(&body)?.to_model()?;
        info!(
            "Fetched {} option chain records for {}, underlying {}",
            chain.entries.len(),
            symbol,
            chain.underlying
        );
        Ok(chain)
    }
}
