//! # Inbound Ports (Driving Ports / API)

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::FeedId;

use crate::domain::errors::{AuthorizationError, GraphError};
use crate::domain::replication::ReplicationSet;

/// Replication want-list API.
///
/// Mutations take effect immediately for later authorization checks.
#[async_trait]
pub trait ReplicationApi: Send + Sync {
    fn replicate(&self, id: FeedId);

    fn dont_replicate(&self, id: FeedId);

    fn block(&self, id: FeedId);

    fn unblock(&self, id: FeedId);

    /// True iff `remote` is wanted and not blocked.
    fn authorize(&self, remote: &FeedId) -> bool;

    /// [`ReplicationApi::authorize`] with the reason for a refusal.
    fn check_authorized(&self, remote: &FeedId) -> Result<(), AuthorizationError>;

    /// Current snapshot of the want-list.
    fn replication_set(&self) -> Arc<ReplicationSet>;

    /// Catch up on contacts and refresh the hop-derived part of the want-list.
    async fn recompute(&self) -> Result<Arc<ReplicationSet>, GraphError>;
}
