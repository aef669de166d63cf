pub mod alerts_repo;
pub mod execution_log_repo;
pub mod history_repo;

pub use alerts_repo::AlertsRepository;
pub use execution_log_repo::ExecutionLogRepository;
pub use history_repo::HistoryRepository;
