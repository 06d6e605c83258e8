use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid store URL '{value}': {source}")]
    InvalidStoreUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Execution id cannot be empty.")]
    EmptyExecutionId,
    #[error("User decay factor must be within (0, 1], got {value}.")]
    DecayOutOfRange { value: f64 },
    #[error("Monitoring phase requires --probe-cmd.")]
    MissingProbeCommand,
    #[error("--during-test-cmd requires --during-test-interval.")]
    MissingDuringTestInterval,
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
