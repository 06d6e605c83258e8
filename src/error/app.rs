use thiserror::Error;

use super::{ConfigError, LifecycleError, MetricsError, MonitorError, StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("Monitoring error: {0}")]
    Monitor(#[from] MonitorError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    #[must_use]
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    #[must_use]
    pub fn store<E>(error: E) -> Self
    where
        E: Into<StoreError>,
    {
        error.into().into()
    }

    #[must_use]
    pub fn metrics<E>(error: E) -> Self
    where
        E: Into<MetricsError>,
    {
        error.into().into()
    }

    #[must_use]
    pub fn lifecycle<E>(error: E) -> Self
    where
        E: Into<LifecycleError>,
    {
        error.into().into()
    }

    #[must_use]
    pub fn monitor<E>(error: E) -> Self
    where
        E: Into<MonitorError>,
    {
        error.into().into()
    }
}
