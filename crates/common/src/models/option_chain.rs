use serde_json::Value;

/// Raw option chain as delivered by a market-data source, before normalization.
#[derive(Debug, Clone)]
pub struct OptionChain {
    pub underlying: f64,
    pub entries: Vec<Value>,
}
