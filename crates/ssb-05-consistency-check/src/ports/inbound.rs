//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::errors::FsckError;
use crate::domain::report::{ConsistencyReport, FsckMode};

/// Read-only audit of the stored log. Nothing is repaired.
#[async_trait]
pub trait ConsistencyCheckApi: Send + Sync {
    /// Run one mode. Flipping `cancel` to true aborts with
    /// [`FsckError::Cancelled`].
    async fn check(
        &self,
        mode: FsckMode,
        cancel: watch::Receiver<bool>,
    ) -> Result<ConsistencyReport, FsckError>;

    /// Run both modes and merge the reports.
    async fn check_all(&self, cancel: watch::Receiver<bool>) -> Result<ConsistencyReport, FsckError> {
        let mut report = self.check(FsckMode::Length, cancel.clone()).await?;
        report.merge(self.check(FsckMode::Sequences, cancel).await?);
        Ok(report)
    }
}
