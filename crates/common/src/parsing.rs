use serde_json::Value;

/// Numeric types that a loosely typed feed value can be coerced into.
pub trait FromNumeric: Copy + Default {
    fn from_f64(raw: f64) -> Option<Self>;
}

impl FromNumeric for i64 {
    fn from_f64(raw: f64) -> Option<Self> {
        raw.is_finite().then(|| raw.trunc() as i64)
    }
}

impl FromNumeric for f64 {
    fn from_f64(raw: f64) -> Option<Self> {
        raw.is_finite().then_some(raw)
    }
}

pub fn parse_numeric_str<T: FromNumeric>(raw: &str) -> Option<T> {
    raw.trim().parse::<f64>().ok().and_then(T::from_f64)
}

pub fn parse_numeric<T: FromNumeric>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => n.as_f64().and_then(T::from_f64),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

/// Coerces a feed field, yielding `T::default()` when it is absent, null or not numeric.
pub fn parse_numeric_or_default<T: FromNumeric>(value: Option<&Value>) -> T {
    value.and_then(parse_numeric).unwrap_or_default()
}

pub fn parse_str_or_default<T: FromNumeric>(raw: &str) -> T {
    parse_numeric_str(raw).unwrap_or_default()
}

pub fn parse_boolish(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
