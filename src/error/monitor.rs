use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Probe failed: {source}")]
    Probe {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("During-test task is no longer alive.")]
    DuringTestDead,
    #[error("Probe command exited with status {status}.")]
    ProbeCommandStatus { status: i32 },
    #[error("Probe command produced invalid JSON: {source}")]
    ProbeCommandOutput {
        #[source]
        source: serde_json::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
