//! Process entry: parse arguments, bring up logging and the runtime,
//! dispatch the requested phase.
use std::sync::Arc;

use clap::Parser;

use crate::app;
use crate::args::{Phase, RunnerArgs};
use crate::config::RunnerConfig;
use crate::error::AppResult;
use crate::logger;
use crate::store::{GraphQlStore, ResultStore};

/// # Errors
///
/// Returns any error the selected phase produced; `main` turns it into
/// a non-zero exit code.
pub fn run() -> AppResult<()> {
    let args = RunnerArgs::try_parse()?;
    logger::init_logging(args.verbose, args.no_color);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_phase(args))
}

async fn run_phase(args: RunnerArgs) -> AppResult<()> {
    let config = RunnerConfig::from_args(&args)?;
    let store: Arc<dyn ResultStore> = Arc::new(GraphQlStore::new(&config));
    match args.phase {
        Phase::PreStart => app::stage::run(&config, store.as_ref(), "pre_start").await,
        Phase::PostStop => app::stage::run(&config, store.as_ref(), "post_stop").await,
        Phase::LoadTests => app::load::run(&config, store).await,
        Phase::Monitoring(monitoring) => app::monitoring::run(&config, store, &monitoring).await,
    }
}
