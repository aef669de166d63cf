use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use common::{RunConfig, config::DEFAULT_LOG_LEVEL, logger};
use executor::{ExecutionService, RunExit, RunService, RunSupervisor};
use market_data::{ChainPoller, NseClient, RetryPolicy};
use storage::{DataManager, SqliteTableStore, TableStore};

async fn bootstrap(config: &RunConfig) -> anyhow::Result<(RunService, RunSupervisor)> {
    let store = SqliteTableStore::open(&config.db_path)
        .await
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;
    let data_manager = Arc::new(DataManager::new(Arc::new(store) as Arc<dyn TableStore>));

    let execution = if config.execution_log {
        data_manager
            .ensure_schema(true)
            .await
            .context("preparing execution log")?;
        ExecutionService::new(Some(data_manager.clone()))
    } else {
        ExecutionService::disabled()
    };

    let poller = ChainPoller::new(
        Box::new(NseClient::new()),
        RetryPolicy::new(config.fetch_retries),
    )
    .with_verbose(config.verbose_fetch);

    let service = RunService::new(config.clone(), poller, data_manager);
    Ok((service, RunSupervisor::new(execution)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::setup_logger(DEFAULT_LOG_LEVEL);
            error!("Invalid configuration: {}", e);
            return RunExit::Failed.into();
        }
    };
    logger::setup_logger(&config.log_level);
    debug!("Loaded configuration: {:?}", config);

    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id, symbol = %config.symbol);

    async {
        let (service, supervisor) = match bootstrap(&config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return RunExit::Failed;
            }
        };

        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        supervisor
            .supervise(&format!("run {run_id}"), service.run(), interrupt)
            .await
    }
    .instrument(span)
    .await
    .into()
}
