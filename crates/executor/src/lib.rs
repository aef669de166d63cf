pub mod actors;
pub mod services;

pub use actors::supervisor::{RunExit, RunSupervisor};
pub use services::execution_service::ExecutionService;
pub use services::run_service::{RunError, RunOutcome, RunService};
