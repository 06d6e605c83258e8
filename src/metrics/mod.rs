//! Windowed telemetry aggregation: interval buckets over the raw event
//! stream, per-window reduction, error deduplication and the retry-safe
//! delivery queue feeding the result store.
pub mod collector;
pub mod delivery;
pub mod ledger;
pub mod reduce;
pub mod types;
pub mod window;

pub use collector::{spawn_collector, CollectorReport};
pub use ledger::ErrorLedger;
pub use reduce::{UserGauge, WindowReducer};
pub use types::{AggregateRecord, ErrorEntry, Event, Outcome, PartialAggregate, WorkerError};
pub use window::{Window, WindowBuffer};
