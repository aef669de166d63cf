use common::{models::OptionChain, parsing::parse_numeric};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::FetchError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct OptionChainResponse {
    pub records: Option<ChainRecords>,
}

#[derive(Debug, Deserialize)]
pub struct ChainRecords {
    pub data: Option<Vec<Value>>,
    #[serde(rename(deserialize = "underlyingValue"))]
    pub underlying_value: Option<Value>,
}

impl OptionChainResponse {
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::MalformedPayload(e.to_string()))
    }
}

impl RemoteResponse<OptionChain> for OptionChainResponse {
    fn to_model(&self) -> Result<OptionChain, FetchError> {
        let records = self
            .records
            .as_ref()
            .ok_or_else(|| FetchError::MalformedPayload("missing `records`".to_string()))?;

        let entries = records
            .data
            .clone()
            .ok_or_else(|| FetchError::MalformedPayload("missing `records.data`".to_string()))?;

        let underlying = records
            .underlying_value
            .as_ref()
            .and_then(parse_numeric::<f64>)
            .ok_or_else(|| {
                FetchError::MalformedPayload("missing or non-numeric `records.underlyingValue`".to_string())
            })?;

        Ok(OptionChain {
            underlying,
            entries,
        })
    }
}
