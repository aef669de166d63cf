pub mod differencer;
pub mod neighborhood;
pub mod normalizer;
pub mod ranker;
pub mod services;

pub use differencer::{MIN_PREV_OI_DENOM, SideDiffs, diff_snapshots, pct_coi};
pub use neighborhood::select_neighborhood;
pub use normalizer::normalize_records;
pub use ranker::{AlertContext, RankParams, build_alerts, rank_side};
pub use services::strategy_service::StrategyService;
