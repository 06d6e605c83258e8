//! Phase orchestration: wires config, store, channels and tasks
//! together for each subcommand.
pub mod load;
pub mod monitoring;
pub mod stage;
