//! Seam for recently-used project bookkeeping.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::compile::ProjectId;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity tracking unavailable: {message}")]
    Unavailable { message: String },
}

/// Marks a project as just accessed after a compile was dispatched.
///
/// Persistent bookkeeping belongs to the storage layer; implementations here
/// only need to absorb the notification. The orchestrator fires this
/// detached from the response path, so a failing implementation can never
/// fail a compile.
#[async_trait]
pub trait ProjectActivity: Send + Sync {
    async fn mark_project_accessed(&self, project_id: &ProjectId) -> Result<(), ActivityError>;
}
