//! Validated runtime configuration derived from CLI/env arguments.
use std::time::Duration;

use url::Url;

use crate::args::{RunnerArgs, WorkerRole};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub execution_id: String,
    pub store_url: Url,
    pub store_token: Option<String>,
    pub role: WorkerRole,
    pub window_interval: Duration,
    pub supervisor_interval: Duration,
    pub ready_wait_deadline: Duration,
    pub ready_wait_interval: Duration,
    pub user_decay: f64,
    pub flush_wait: Duration,
    pub worker_id: String,
}

impl RunnerConfig {
    /// Builds a validated configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the store URL does not parse, the
    /// execution id is empty, or the decay factor is out of range.
    pub fn from_args(args: &RunnerArgs) -> Result<Self, ConfigError> {
        if args.execution_id.trim().is_empty() {
            return Err(ConfigError::EmptyExecutionId);
        }
        let store_url =
            Url::parse(&args.store_url).map_err(|source| ConfigError::InvalidStoreUrl {
                value: args.store_url.clone(),
                source,
            })?;
        if !(args.user_decay > 0.0 && args.user_decay <= 1.0) {
            return Err(ConfigError::DecayOutOfRange {
                value: args.user_decay,
            });
        }

        let worker_id = args
            .worker_id
            .clone()
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));

        Ok(Self {
            execution_id: args.execution_id.trim().to_owned(),
            store_url,
            store_token: args.store_token.clone(),
            role: args.role,
            window_interval: Duration::from_secs(args.window_interval_secs),
            supervisor_interval: Duration::from_secs(args.supervisor_interval_secs),
            ready_wait_deadline: Duration::from_secs(args.ready_wait_deadline_secs),
            ready_wait_interval: Duration::from_secs(args.ready_wait_interval_secs),
            user_decay: args.user_decay,
            flush_wait: Duration::from_millis(args.flush_wait_ms),
            worker_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::error::{AppError, AppResult};

    fn args(extra: &[&str]) -> AppResult<RunnerArgs> {
        let mut argv = vec![
            "loadlink",
            "--execution-id",
            "exec-1",
            "--store-url",
            "http://store.local/graphql",
        ];
        argv.extend_from_slice(extra);
        argv.push("load_tests");
        Ok(RunnerArgs::try_parse_from(argv)?)
    }

    #[test]
    fn builds_config_from_defaults() -> AppResult<()> {
        let config = RunnerConfig::from_args(&args(&[])?)?;
        if config.window_interval != Duration::from_secs(2) {
            return Err(AppError::config("Unexpected window interval"));
        }
        if config.store_url.as_str() != "http://store.local/graphql" {
            return Err(AppError::config(config.store_url.to_string()));
        }
        Ok(())
    }

    #[test]
    fn rejects_invalid_store_url() -> AppResult<()> {
        let mut parsed = args(&[])?;
        parsed.store_url = "not a url".to_owned();
        match RunnerConfig::from_args(&parsed) {
            Err(ConfigError::InvalidStoreUrl { .. }) => Ok(()),
            Ok(_) | Err(_) => Err(AppError::config("Expected InvalidStoreUrl")),
        }
    }

    #[test]
    fn rejects_decay_out_of_range() -> AppResult<()> {
        let mut parsed = args(&[])?;
        parsed.user_decay = 1.5;
        match RunnerConfig::from_args(&parsed) {
            Err(ConfigError::DecayOutOfRange { .. }) => Ok(()),
            Ok(_) | Err(_) => Err(AppError::config("Expected DecayOutOfRange")),
        }
    }

    #[test]
    fn rejects_blank_execution_id() -> AppResult<()> {
        let mut parsed = args(&[])?;
        parsed.execution_id = "   ".to_owned();
        match RunnerConfig::from_args(&parsed) {
            Err(ConfigError::EmptyExecutionId) => Ok(()),
            Ok(_) | Err(_) => Err(AppError::config("Expected EmptyExecutionId")),
        }
    }
}
