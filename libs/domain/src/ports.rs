//! Collaborator ports.
//!
//! The engine talks to storage and the task queue through these traits.
//! Production wires them to Postgres-backed stores; tests use the in-memory
//! fakes from `marquee-testing`.

use async_trait::async_trait;
use marquee_id::{EventId, TaskId, UserId};

use crate::{LookupKey, ResourceKind, ResourceOwner, Role, StoreError, TaskKind, UserRecord};

/// Resolves sub-resources and slugs to their owning event.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// Looks up an event by its unique slug.
    async fn find_event_by_slug(&self, identifier: &str)
        -> Result<Option<EventId>, StoreError>;

    /// Reports who owns the sub-resource with the given key.
    async fn owning_event(
        &self,
        kind: ResourceKind,
        key: &LookupKey,
    ) -> Result<ResourceOwner, StoreError>;
}

/// Reads user accounts and their event role assignments.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// True when the user holds any of the given roles on the event.
    async fn holds_any(
        &self,
        user_id: UserId,
        event_id: EventId,
        roles: &[Role],
    ) -> Result<bool, StoreError>;
}

/// Enqueues background tasks.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(
        &self,
        kind: TaskKind,
        event_id: EventId,
        args: serde_json::Value,
    ) -> Result<TaskId, StoreError>;
}

/// Tracks schedule-export jobs and their published artifacts.
#[async_trait]
pub trait ExportArtifacts: Send + Sync {
    /// Records that an export task was submitted for the event.
    async fn record_job(&self, task: TaskId, event_id: EventId) -> Result<(), StoreError>;

    /// Clears the event's published export URLs.
    async fn clear_urls(&self, event_id: EventId) -> Result<(), StoreError>;
}
