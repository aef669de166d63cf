use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Call,
    Put,
}

impl Side {
    /// Exchange code used in column names and alert rows.
    pub fn code(&self) -> &'static str {
        match self {
            Side::Call => "CE",
            Side::Put => "PE",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideQuote {
    pub open_interest: i64,
    pub change_in_open_interest: i64,
    pub implied_volatility: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrikeRecord {
    pub strike: i64,
    pub call: SideQuote,
    pub put: SideQuote,
}

impl StrikeRecord {
    pub fn side(&self, side: Side) -> &SideQuote {
        match side {
            Side::Call => &self.call,
            Side::Put => &self.put,
        }
    }
}
