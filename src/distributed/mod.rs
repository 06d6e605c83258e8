//! Worker/coordinator split: workers pre-reduce their own event stream
//! into per-window partial aggregates; the coordinator buckets arriving
//! partials by arrival time and merges them into store records.
pub mod coordinator;
pub mod wire;
pub mod worker;

pub use coordinator::spawn_coordinator;
pub use wire::WorkerReport;
pub use worker::spawn_worker;
