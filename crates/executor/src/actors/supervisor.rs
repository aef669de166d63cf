use std::{future::Future, process::ExitCode};

use common::models::ExecutionStatus;
use tokio::pin;
use tracing::{error, info, warn};

use crate::services::{
    execution_service::ExecutionService,
    run_service::{RunError, RunOutcome},
};

/// How a supervised run ended, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Success,
    PersistenceFailed,
    Failed,
    Interrupted,
}

impl RunExit {
    pub fn code(&self) -> u8 {
        match self {
            RunExit::Success => 0,
            RunExit::PersistenceFailed => 1,
            RunExit::Failed => 2,
            RunExit::Interrupted => 130,
        }
    }
}

impl From<RunExit> for ExitCode {
    fn from(exit: RunExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Wraps a single run with execution-log bookkeeping and interrupt handling.
pub struct RunSupervisor {
    execution: ExecutionService,
}

impl RunSupervisor {
    pub fn new(execution: ExecutionService) -> Self {
        Self { execution }
    }

    pub async fn supervise<R, I>(&self, label: &str, run: R, interrupt: I) -> RunExit
    where
        R: Future<Output = Result<RunOutcome, RunError>>,
        I: Future<Output = ()>,
    {
        self.execution
            .record(ExecutionStatus::Started, format!("{label} started"))
            .await;

        pin!(run);
        pin!(interrupt);

        let result = tokio::select! {
            result = &mut run => result,
            _ = &mut interrupt => {
                warn!("Interrupted by user");
                self.execution
                    .record(ExecutionStatus::Failed, format!("{label} interrupted by user"))
                    .await;
                return RunExit::Interrupted;
            }
        };

        match result {
            Ok(outcome) => {
                let summary = format!("{label} {}", outcome.summary());
                self.execution.record(outcome.status(), summary).await;

                if outcome.persistence_failed() {
                    error!("Run finished with persistence errors");
                    RunExit::PersistenceFailed
                } else {
                    info!("Run finished");
                    RunExit::Success
                }
            }
            Err(e) => {
                error!("Run failed: {}", e);
                self.execution
                    .record(ExecutionStatus::Failed, format!("{label} failed: {e}"))
                    .await;
                RunExit::Failed
            }
        }
    }
}
