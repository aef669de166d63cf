pub mod error;
pub mod fallback;
pub mod remote;
pub mod traits;

pub use error::{FallbackError, FetchError};
pub use remote::{ChainPoller, NseClient, RetryPolicy};
pub use traits::OptionChainSource;
