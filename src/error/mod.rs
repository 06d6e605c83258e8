mod app;
mod config;
mod lifecycle;
mod metrics;
mod monitor;
mod store;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use lifecycle::LifecycleError;
pub use metrics::MetricsError;
pub use monitor::MonitorError;
pub use store::StoreError;
