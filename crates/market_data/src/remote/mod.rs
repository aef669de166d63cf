use std::env;

pub mod chain_poller;
pub mod nse_client;
pub mod option_chain_response;

pub use chain_poller::{ChainPoller, RetryPolicy};
pub use nse_client::NseClient;
pub use option_chain_response::OptionChainResponse;

pub fn get_nse_base_url() -> String {
    env::var("NSE_BASE_URL").unwrap_or_else(|_| "https://www.nseindia.com".to_string())
}

/// Maps a configured symbol onto the index name the option-chain API expects.
pub fn nse_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match upper.as_str() {
        "NIFTY" | "NIFTY50" | "NIFTY 50" => "NIFTY".to_string(),
        "BANKNIFTY" | "NIFTYBANK" | "NIFTY BANK" => "BANKNIFTY".to_string(),
        "FINNIFTY" => "FINNIFTY".to_string(),
        _ => upper,
    }
}
