use thiserror::Error;

use crate::lifecycle::state::{ExecutionState, InstanceType};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot transition out of terminal state {current:?} (requested {requested:?}).")]
    TerminalState {
        current: ExecutionState,
        requested: ExecutionState,
    },
    #[error("Transition {current:?} -> {requested:?} is not allowed.")]
    InvalidTransition {
        current: ExecutionState,
        requested: ExecutionState,
    },
    #[error("Timed out after {waited_secs} s waiting for {instance_type} instance to report READY.")]
    ReadyWaitExpired {
        instance_type: InstanceType,
        waited_secs: u64,
    },
    #[error("Execution turned {state:?} while waiting for {instance_type} instance.")]
    FailedWhileWaiting {
        instance_type: InstanceType,
        state: ExecutionState,
    },
    #[error("Execution configuration is missing required field '{field}'.")]
    ConfigurationMissing { field: &'static str },
    #[error("Run aborted by supervisor.")]
    Aborted,
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
