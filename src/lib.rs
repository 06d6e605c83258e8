//! Core library for the `loadlink` CLI.
//!
//! This crate provides the internal building blocks used by the binary:
//! CLI argument types, runtime configuration, the windowed telemetry
//! aggregation pipeline, worker-to-coordinator merge logic, the remote
//! result store client, and the execution lifecycle machinery. The
//! primary user-facing interface is the `loadlink` command-line
//! application; library APIs may evolve as the CLI grows.
pub mod app;
pub mod args;
pub mod config;
pub mod distributed;
pub mod entry;
pub mod error;
pub mod ingest;
pub mod lifecycle;
pub mod logger;
pub mod metrics;
pub mod monitor;
pub mod shutdown;
pub mod store;
