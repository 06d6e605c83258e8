use tokio::sync::broadcast;

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Raised only by the supervisor when the remote execution turns
/// failed/terminated. Preempts graceful shutdown.
pub type AbortSender = broadcast::Sender<()>;
pub type AbortReceiver = broadcast::Receiver<()>;
