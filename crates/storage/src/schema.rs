pub const HISTORY_TABLE: &str = "history";
pub const ALERTS_TABLE: &str = "alerts";
pub const EXECUTION_LOG_TABLE: &str = "execution_log";

pub const HISTORY_HEADER: [&str; 10] = [
    "timestamp",
    "symbol",
    "underlying",
    "strike",
    "CE_OI",
    "CE_COI",
    "CE_IV",
    "PE_OI",
    "PE_COI",
    "PE_IV",
];

pub const ALERTS_HEADER: [&str; 9] = [
    "timestamp",
    "symbol",
    "underlying",
    "event_rank",
    "event_type",
    "strike",
    "side",
    "pct_coi",
    "details",
];

pub const EXECUTION_LOG_HEADER: [&str; 3] = ["timestamp_utc", "status", "details"];
