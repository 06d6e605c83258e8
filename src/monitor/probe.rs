use async_trait::async_trait;

use crate::error::MonitorError;

/// Source of monitoring samples. A `Null` payload means the probe had
/// nothing to report this tick.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Takes one sample.
    ///
    /// # Errors
    ///
    /// Implementation-defined; any error ends the monitoring loop.
    async fn sample(
        &self,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// Runs a shell command and parses its stdout as JSON. Non-zero exit
/// and unparsable output are both probe failures.
pub struct CommandProbe {
    command: String,
}

impl CommandProbe {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Probe for CommandProbe {
    async fn sample(
        &self,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await?;
        if !output.status.success() {
            return Err(Box::new(MonitorError::ProbeCommandStatus {
                status: output.status.code().unwrap_or(-1),
            }));
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        let value = serde_json::from_slice(&output.stdout)
            .map_err(|source| MonitorError::ProbeCommandOutput { source })?;
        Ok(value)
    }
}
