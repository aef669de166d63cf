pub mod execution_service;
pub mod run_service;
