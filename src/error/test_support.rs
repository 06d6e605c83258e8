use super::{ConfigError, LifecycleError, MetricsError, MonitorError, StoreError};

impl From<&'static str> for ConfigError {
    fn from(message: &'static str) -> Self {
        ConfigError::TestExpectation { message }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        ConfigError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for StoreError {
    fn from(message: &'static str) -> Self {
        StoreError::TestExpectation { message }
    }
}

impl From<String> for StoreError {
    fn from(value: String) -> Self {
        StoreError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for MetricsError {
    fn from(message: &'static str) -> Self {
        MetricsError::TestExpectation { message }
    }
}

impl From<String> for MetricsError {
    fn from(value: String) -> Self {
        MetricsError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for LifecycleError {
    fn from(message: &'static str) -> Self {
        LifecycleError::TestExpectation { message }
    }
}

impl From<String> for LifecycleError {
    fn from(value: String) -> Self {
        LifecycleError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for MonitorError {
    fn from(message: &'static str) -> Self {
        MonitorError::TestExpectation { message }
    }
}

impl From<String> for MonitorError {
    fn from(value: String) -> Self {
        MonitorError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
