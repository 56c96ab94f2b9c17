//! # marquee-testing
//!
//! In-memory fakes for the domain ports, plus fixture builders. Everything
//! here is test support; the fakes hold state behind plain mutexes and never
//! touch a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marquee_domain::{
    Capabilities, Event, EventPrivacy, EventState, ExportArtifacts, JobSubmitter, LookupKey,
    OwnerDirectory, ResourceKind, ResourceOwner, Role, RoleDirectory, StoreError, TaskKind,
    UserRecord,
};
use marquee_id::{EventId, TaskId, UserId};

// ============================================================================
// Owner Directory
// ============================================================================

/// In-memory [`OwnerDirectory`].
///
/// Sub-resources are registered as `(kind, key) -> Option<EventId>`; a `None`
/// owner models a row whose event reference is null.
#[derive(Default)]
pub struct InMemoryDirectory {
    events_by_slug: Mutex<HashMap<String, EventId>>,
    resources: Mutex<HashMap<(ResourceKind, String), Option<EventId>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_slug(&self, identifier: impl Into<String>, event_id: EventId) {
        self.events_by_slug
            .lock()
            .expect("slug map poisoned")
            .insert(identifier.into(), event_id);
    }

    /// Registers a sub-resource owned by `event_id`.
    pub fn add_resource(&self, kind: ResourceKind, key: impl Into<String>, event_id: EventId) {
        self.resources
            .lock()
            .expect("resource map poisoned")
            .insert((kind, key.into()), Some(event_id));
    }

    /// Registers a sub-resource whose event reference is null.
    pub fn add_detached_resource(&self, kind: ResourceKind, key: impl Into<String>) {
        self.resources
            .lock()
            .expect("resource map poisoned")
            .insert((kind, key.into()), None);
    }
}

#[async_trait]
impl OwnerDirectory for InMemoryDirectory {
    async fn find_event_by_slug(
        &self,
        identifier: &str,
    ) -> Result<Option<EventId>, StoreError> {
        Ok(self
            .events_by_slug
            .lock()
            .expect("slug map poisoned")
            .get(identifier)
            .copied())
    }

    async fn owning_event(
        &self,
        kind: ResourceKind,
        key: &LookupKey,
    ) -> Result<ResourceOwner, StoreError> {
        let resources = self.resources.lock().expect("resource map poisoned");
        match resources.get(&(kind, key.value().to_string())) {
            None => Ok(ResourceOwner::Missing),
            Some(None) => Ok(ResourceOwner::Detached),
            Some(Some(event_id)) => Ok(ResourceOwner::Owned(*event_id)),
        }
    }
}

// ============================================================================
// Role Directory
// ============================================================================

/// In-memory [`RoleDirectory`].
#[derive(Default)]
pub struct InMemoryRoles {
    users: Mutex<HashMap<UserId, UserRecord>>,
    assignments: Mutex<Vec<(UserId, EventId, Role)>>,
}

impl InMemoryRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserRecord) {
        self.users
            .lock()
            .expect("user map poisoned")
            .insert(user.id, user);
    }

    pub fn assign(&self, user_id: UserId, event_id: EventId, role: Role) {
        self.assignments
            .lock()
            .expect("assignments poisoned")
            .push((user_id, event_id, role));
    }

    /// Direct assignment check, usable from synchronous test code.
    pub fn holds(&self, user_id: UserId, event_id: EventId, role: Role) -> bool {
        self.assignments
            .lock()
            .expect("assignments poisoned")
            .iter()
            .any(|(u, e, r)| *u == user_id && *e == event_id && *r == role)
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoles {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .lock()
            .expect("user map poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn holds_any(
        &self,
        user_id: UserId,
        event_id: EventId,
        roles: &[Role],
    ) -> Result<bool, StoreError> {
        let assignments = self.assignments.lock().expect("assignments poisoned");
        Ok(assignments
            .iter()
            .any(|(u, e, r)| *u == user_id && *e == event_id && roles.contains(r)))
    }
}

// ============================================================================
// Job Queue
// ============================================================================

/// [`JobSubmitter`] that records every submission.
#[derive(Default)]
pub struct RecordingJobQueue {
    submissions: Mutex<Vec<(TaskKind, EventId, serde_json::Value)>>,
}

impl RecordingJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<(TaskKind, EventId, serde_json::Value)> {
        self.submissions
            .lock()
            .expect("submissions poisoned")
            .clone()
    }
}

#[async_trait]
impl JobSubmitter for RecordingJobQueue {
    async fn submit(
        &self,
        kind: TaskKind,
        event_id: EventId,
        args: serde_json::Value,
    ) -> Result<TaskId, StoreError> {
        self.submissions
            .lock()
            .expect("submissions poisoned")
            .push((kind, event_id, args));
        Ok(TaskId::new())
    }
}

// ============================================================================
// Export Artifacts
// ============================================================================

/// [`ExportArtifacts`] that records jobs and URL clears.
#[derive(Default)]
pub struct InMemoryArtifacts {
    jobs: Mutex<Vec<(TaskId, EventId)>>,
    cleared: Mutex<Vec<EventId>>,
}

impl InMemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_jobs(&self) -> Vec<(TaskId, EventId)> {
        self.jobs.lock().expect("jobs poisoned").clone()
    }

    pub fn cleared_events(&self) -> Vec<EventId> {
        self.cleared.lock().expect("cleared poisoned").clone()
    }
}

#[async_trait]
impl ExportArtifacts for InMemoryArtifacts {
    async fn record_job(&self, task: TaskId, event_id: EventId) -> Result<(), StoreError> {
        self.jobs
            .lock()
            .expect("jobs poisoned")
            .push((task, event_id));
        Ok(())
    }

    async fn clear_urls(&self, event_id: EventId) -> Result<(), StoreError> {
        self.cleared.lock().expect("cleared poisoned").push(event_id);
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Builder for event fixtures.
///
/// Defaults to a published public event starting a week from now and running
/// for two days.
pub struct EventFixture {
    event: Event,
}

impl EventFixture {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            event: Event {
                id: EventId::new(),
                identifier: "test-event".to_string(),
                name: "Test Event".to_string(),
                state: EventState::Published,
                privacy: EventPrivacy::Public,
                starts_at: now + Duration::days(7),
                ends_at: now + Duration::days(9),
                deleted_at: None,
                original_image_url: None,
                logo_url: None,
                ical_url: None,
                xcal_url: None,
                pentabarf_url: None,
                schedule_published_on: None,
                is_promoted: false,
                event_type_id: None,
                event_topic_id: None,
                event_sub_topic_id: None,
                discount_code_id: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn id(mut self, id: EventId) -> Self {
        self.event.id = id;
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.event.identifier = identifier.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.event.name = name.into();
        self
    }

    pub fn draft(mut self) -> Self {
        self.event.state = EventState::Draft;
        self
    }

    pub fn published(mut self) -> Self {
        self.event.state = EventState::Published;
        self
    }

    pub fn private(mut self) -> Self {
        self.event.privacy = EventPrivacy::Private;
        self
    }

    pub fn starts_at(mut self, at: DateTime<Utc>) -> Self {
        self.event.starts_at = at;
        self
    }

    pub fn ends_at(mut self, at: DateTime<Utc>) -> Self {
        self.event.ends_at = at;
        self
    }

    pub fn deleted_at(mut self, at: DateTime<Utc>) -> Self {
        self.event.deleted_at = Some(at);
        self
    }

    pub fn schedule_published_on(mut self, at: DateTime<Utc>) -> Self {
        self.event.schedule_published_on = Some(at);
        self
    }

    pub fn original_image_url(mut self, url: impl Into<String>) -> Self {
        self.event.original_image_url = Some(url.into());
        self
    }

    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.event.logo_url = Some(url.into());
        self
    }

    pub fn promoted(mut self) -> Self {
        self.event.is_promoted = true;
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}

impl Default for EventFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A verified, non-staff user record.
pub fn verified_user() -> UserRecord {
    UserRecord {
        id: UserId::new(),
        email: "user@example.org".to_string(),
        capabilities: Capabilities::from_flags(true, false, false),
    }
}

/// An unverified, non-staff user record.
pub fn unverified_user() -> UserRecord {
    UserRecord {
        id: UserId::new(),
        email: "new@example.org".to_string(),
        capabilities: Capabilities::from_flags(false, false, false),
    }
}

/// An admin user record.
pub fn admin_user() -> UserRecord {
    UserRecord {
        id: UserId::new(),
        email: "admin@example.org".to_string(),
        capabilities: Capabilities::from_flags(true, true, false),
    }
}

/// A super-admin user record.
pub fn super_admin_user() -> UserRecord {
    UserRecord {
        id: UserId::new(),
        email: "root@example.org".to_string(),
        capabilities: Capabilities::from_flags(true, true, true),
    }
}
