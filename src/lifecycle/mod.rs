//! Execution/instance lifecycle: the remote-owned state machine, the
//! local tracker pushing one-way transitions, and the supervisor that
//! aborts the run when the execution is failed externally.
pub mod instance;
pub mod state;
pub mod supervisor;
pub mod tracker;

pub use state::{ExecutionState, InstanceState, InstanceType};
pub use supervisor::spawn_supervisor;
pub use tracker::LifecycleTracker;
