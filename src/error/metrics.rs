use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Event channel closed before {context}.")]
    ChannelClosed { context: &'static str },
    #[error("Final flush did not finish within {wait_ms} ms ({pending} records pending).")]
    FlushDeadline { wait_ms: u64, pending: usize },
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
