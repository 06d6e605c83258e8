use serde::{Deserialize, Serialize};

/// Remote-owned execution status. The local process only pushes
/// explicit transitions; terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Pending,
    Running,
    Monitoring,
    Succeeded,
    Finished,
    Failed,
    Error,
    Terminated,
}

impl ExecutionState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Finished | Self::Failed | Self::Error | Self::Terminated
        )
    }

    /// Terminal states set by an external actor on abnormal completion.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::Terminated)
    }

    /// One-way transition table: never backward, never out of a
    /// terminal state. FAILED/ERROR/TERMINATED are reachable from any
    /// non-terminal state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Running
                    | Self::Monitoring
                    | Self::Failed
                    | Self::Error
                    | Self::Terminated
            ),
            Self::Running | Self::Monitoring => matches!(
                next,
                Self::Succeeded
                    | Self::Finished
                    | Self::Failed
                    | Self::Error
                    | Self::Terminated
            ),
            Self::Succeeded
            | Self::Finished
            | Self::Failed
            | Self::Error
            | Self::Terminated => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Ready,
    Succeeded,
    Failed,
}

/// Named sub-role of an execution with its own READY handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    LoadTests,
    Monitoring,
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadTests => f.write_str("load_tests"),
            Self::Monitoring => f.write_str("monitoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};

    const ALL: [ExecutionState; 8] = [
        ExecutionState::Pending,
        ExecutionState::Running,
        ExecutionState::Monitoring,
        ExecutionState::Succeeded,
        ExecutionState::Finished,
        ExecutionState::Failed,
        ExecutionState::Error,
        ExecutionState::Terminated,
    ];

    #[test]
    fn terminal_states_allow_no_transitions() -> AppResult<()> {
        for current in ALL {
            if !current.is_terminal() {
                continue;
            }
            for next in ALL {
                if current.can_transition_to(next) {
                    return Err(AppError::lifecycle(format!(
                        "{:?} -> {:?} should be rejected",
                        current, next
                    )));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn pending_starts_running_or_monitoring() -> AppResult<()> {
        if !ExecutionState::Pending.can_transition_to(ExecutionState::Running) {
            return Err(AppError::lifecycle("PENDING -> RUNNING should be allowed"));
        }
        if !ExecutionState::Pending.can_transition_to(ExecutionState::Monitoring) {
            return Err(AppError::lifecycle(
                "PENDING -> MONITORING should be allowed",
            ));
        }
        if ExecutionState::Pending.can_transition_to(ExecutionState::Finished) {
            return Err(AppError::lifecycle("PENDING -> FINISHED should be rejected"));
        }
        Ok(())
    }

    #[test]
    fn running_never_goes_backward() -> AppResult<()> {
        if ExecutionState::Running.can_transition_to(ExecutionState::Pending) {
            return Err(AppError::lifecycle("RUNNING -> PENDING should be rejected"));
        }
        if !ExecutionState::Running.can_transition_to(ExecutionState::Finished) {
            return Err(AppError::lifecycle("RUNNING -> FINISHED should be allowed"));
        }
        Ok(())
    }

    #[test]
    fn failed_family_is_reachable_from_any_non_terminal() -> AppResult<()> {
        for current in ALL {
            if current.is_terminal() {
                continue;
            }
            for next in [
                ExecutionState::Failed,
                ExecutionState::Error,
                ExecutionState::Terminated,
            ] {
                if !current.can_transition_to(next) {
                    return Err(AppError::lifecycle(format!(
                        "{:?} -> {:?} should be allowed",
                        current, next
                    )));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn serde_names_match_store_vocabulary() -> AppResult<()> {
        let encoded = serde_json::to_string(&ExecutionState::Terminated)?;
        if encoded != "\"TERMINATED\"" {
            return Err(AppError::lifecycle(encoded));
        }
        let decoded: ExecutionState = serde_json::from_str("\"MONITORING\"")?;
        if decoded != ExecutionState::Monitoring {
            return Err(AppError::lifecycle("Expected MONITORING to decode"));
        }
        let instance = serde_json::to_string(&InstanceType::LoadTests)?;
        if instance != "\"load_tests\"" {
            return Err(AppError::lifecycle(instance));
        }
        Ok(())
    }
}
