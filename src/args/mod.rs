//! CLI argument types and parsing helpers.
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Subcommand, Clone)]
#[command(rename_all = "snake_case")]
pub enum Phase {
    /// Record the pre-start stage and exit
    PreStart,
    /// Record the post-stop stage and exit
    PostStop,
    /// Run the load-test telemetry pipeline for this execution
    LoadTests,
    /// Run the monitoring probe loop for this execution
    Monitoring(MonitoringArgs),
}

#[derive(Debug, Args, Clone)]
pub struct MonitoringArgs {
    /// Command invoked on every monitoring tick; must print a JSON payload on stdout
    #[arg(long = "probe-cmd", env = "LOADLINK_PROBE_CMD")]
    pub probe_cmd: Option<String>,

    /// Optional command invoked on its own timer while the test is running
    #[arg(long = "during-test-cmd", env = "LOADLINK_DURING_TEST_CMD")]
    pub during_test_cmd: Option<String>,

    /// Interval in seconds for the during-test command
    #[arg(
        long = "during-test-interval",
        env = "LOADLINK_DURING_TEST_INTERVAL_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub during_test_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkerRole {
    /// Single node: ingest events, reduce, deliver
    Standalone,
    /// Merge partial aggregates from workers and deliver
    Coordinator,
    /// Reduce local events into partials and ship them to the coordinator
    Worker,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Telemetry coordinator for distributed load-test executions - windowed aggregation, worker merge, retry-safe delivery, lifecycle supervision."
)]
pub struct RunnerArgs {
    #[command(subcommand)]
    pub phase: Phase,

    /// Execution id assigned by the orchestration layer
    #[arg(long = "execution-id", env = "LOADLINK_EXECUTION_ID")]
    pub execution_id: String,

    /// Remote result store endpoint (GraphQL over HTTP)
    #[arg(long = "store-url", env = "LOADLINK_STORE_URL")]
    pub store_url: String,

    /// Bearer token presented to the result store
    #[arg(long = "store-token", env = "LOADLINK_STORE_TOKEN")]
    pub store_token: Option<String>,

    /// Role of this node within the execution
    #[arg(
        long,
        env = "LOADLINK_WORKER_ROLE",
        value_enum,
        default_value_t = WorkerRole::Standalone,
        ignore_case = true
    )]
    pub role: WorkerRole,

    /// Aggregation window length in seconds
    #[arg(
        long = "window-interval",
        env = "LOADLINK_WINDOW_INTERVAL_SECS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_interval_secs: u64,

    /// Supervisor poll interval in seconds
    #[arg(
        long = "supervisor-interval",
        env = "LOADLINK_SUPERVISOR_INTERVAL_SECS",
        default_value_t = 7,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub supervisor_interval_secs: u64,

    /// Deadline in seconds for waiting on the load_tests READY handshake
    #[arg(
        long = "ready-wait-deadline",
        env = "LOADLINK_READY_WAIT_DEADLINE_SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub ready_wait_deadline_secs: u64,

    /// Poll interval in seconds for the READY handshake
    #[arg(
        long = "ready-wait-interval",
        env = "LOADLINK_READY_WAIT_INTERVAL_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub ready_wait_interval_secs: u64,

    /// Decay factor applied to the previous window's user count when the
    /// live gauge is unavailable
    #[arg(long = "user-decay", env = "LOADLINK_USER_DECAY", default_value_t = 0.60)]
    pub user_decay: f64,

    /// Bounded wait in milliseconds for the final flush at shutdown
    #[arg(
        long = "flush-wait-ms",
        env = "LOADLINK_FLUSH_WAIT_MS",
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub flush_wait_ms: u64,

    /// Stable identifier reported with worker partials
    #[arg(long = "worker-id", env = "LOADLINK_WORKER_ID")]
    pub worker_id: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
