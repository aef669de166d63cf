pub mod execution;
pub mod option_chain;
pub mod signal;
pub mod snapshot;
pub mod strike;

pub use execution::{ExecutionEvent, ExecutionStatus};
pub use option_chain::OptionChain;
pub use signal::{AlertRow, DiffRow};
pub use snapshot::Snapshot;
pub use strike::{Side, SideQuote, StrikeRecord};
