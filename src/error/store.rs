use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport error during {context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Store responded with HTTP {status} during {context}.")]
    Status { context: &'static str, status: u16 },
    #[error("Store rejected {context}: {message}")]
    Rejected {
        context: &'static str,
        message: String,
    },
    #[error("Malformed store response during {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Store response missing data for {context}.")]
    MissingData { context: &'static str },
    #[cfg(test)]
    #[error("Scripted failure: {context}")]
    Scripted { context: &'static str },
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
