//! End-to-end flows over the owner-resolution and publication machinery,
//! driven through in-memory directories instead of Postgres.

use chrono::{Duration, Utc};
use marquee_api::jobs::{plan_create, plan_update, Dispatcher, SideEffect};
use marquee_api::lifecycle::{
    check_date_window, check_deletion, check_write_authorization, detect_triggers, DateDecision,
};
use marquee_api::scoping::resolve_owner;
use marquee_api::visibility::{EventFilter, UpcomingFilter};
use marquee_domain::{
    Caller, DomainError, EventPatch, EventState, OwnerResolution, ResourceKind, Role, RoleScoping,
    ScopeMap, TaskKind,
};
use marquee_id::{EventId, UserId};
use marquee_testing::{
    admin_user, unverified_user, verified_user, EventFixture, InMemoryArtifacts,
    InMemoryDirectory, InMemoryRoles, RecordingJobQueue,
};

// ============================================================================
// Owner Resolution
// ============================================================================

#[tokio::test]
async fn later_scope_parameters_override_earlier_ones() {
    let directory = InMemoryDirectory::new();
    let track_event = EventId::new();
    let order_event = EventId::new();
    directory.add_resource(ResourceKind::Track, "trk_1", track_event);
    directory.add_resource(ResourceKind::Order, "ord-2026-0001", order_event);

    let mut scope = ScopeMap::new();
    scope.insert("track_id", "trk_1");
    scope.insert("order_identifier", "ord-2026-0001");

    // The order rule sits after the track rule, so its event wins.
    let resolution = resolve_owner(&directory, &scope).await.unwrap();
    assert_eq!(resolution, OwnerResolution::Event(order_event));
}

#[tokio::test]
async fn missing_resource_reports_parameter_and_label() {
    let directory = InMemoryDirectory::new();
    let scope = ScopeMap::from_param("speaker_id", "spk_missing");

    let err = resolve_owner(&directory, &scope).await.unwrap_err();
    match err {
        DomainError::NotFound { parameter, message } => {
            assert_eq!(parameter, "speaker_id");
            assert_eq!(message, "speaker not found: spk_missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn detached_resource_resolves_to_orphaned() {
    let directory = InMemoryDirectory::new();
    directory.add_detached_resource(ResourceKind::DiscountCode, "disc_loose");

    let scope = ScopeMap::from_param("discount_code_id", "disc_loose");
    let resolution = resolve_owner(&directory, &scope).await.unwrap();
    assert_eq!(resolution, OwnerResolution::Orphaned);
}

// ============================================================================
// Create Flow
// ============================================================================

#[tokio::test]
async fn publishing_create_submits_exports_then_resize() {
    let now = Utc::now();
    let event = EventFixture::new()
        .published()
        .starts_at(now + Duration::days(30))
        .ends_at(now + Duration::days(32))
        .schedule_published_on(now)
        .original_image_url("https://cdn.example.com/banner.png")
        .build();

    // The full gate sequence a create runs through.
    let caps = verified_user().capabilities;
    let gate = EventPatch {
        name: Some(event.name.clone()),
        state: Some(EventState::Published),
        ..Default::default()
    };
    check_write_authorization(&caps, &gate).unwrap();
    let dates = EventPatch {
        starts_at: Some(event.starts_at),
        ends_at: Some(event.ends_at),
        ..Default::default()
    };
    assert_eq!(check_date_window(None, &dates, now), DateDecision::Accept);

    let queue = RecordingJobQueue::new();
    let artifacts = InMemoryArtifacts::new();
    let submitted = Dispatcher::new(&queue, &artifacts)
        .dispatch(&plan_create(&event))
        .await
        .unwrap();

    let kinds: Vec<TaskKind> = submitted.iter().map(|job| job.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TaskKind::ExportXcal,
            TaskKind::ExportIcal,
            TaskKind::ExportPentabarf,
            TaskKind::ResizeEventImages,
        ]
    );

    // Each export submission carries temp=false and lands in the export log.
    let submissions = queue.submissions();
    for (kind, _, args) in &submissions[..3] {
        assert!(matches!(
            kind,
            TaskKind::ExportXcal | TaskKind::ExportIcal | TaskKind::ExportPentabarf
        ));
        assert_eq!(args["temp"], serde_json::json!(false));
    }
    assert_eq!(artifacts.recorded_jobs().len(), 3);
    assert_eq!(
        submissions[3].2["original_image_url"],
        serde_json::json!("https://cdn.example.com/banner.png")
    );
}

#[tokio::test]
async fn unverified_account_cannot_create_at_all() {
    let caps = unverified_user().capabilities;
    let err = check_write_authorization(&caps, &EventPatch::default()).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

// ============================================================================
// Update Flow
// ============================================================================

#[tokio::test]
async fn unpublishing_clears_export_artifacts() {
    let before = EventFixture::new()
        .published()
        .schedule_published_on(Utc::now())
        .build();

    let patch = EventPatch {
        state: Some(EventState::Draft),
        ..Default::default()
    };
    let mut after = before.clone();
    after.state = EventState::Draft;

    let effects = plan_update(&before, &after, &patch);
    assert_eq!(effects, vec![SideEffect::ClearExportArtifacts(after.id)]);

    let queue = RecordingJobQueue::new();
    let artifacts = InMemoryArtifacts::new();
    Dispatcher::new(&queue, &artifacts)
        .dispatch(&effects)
        .await
        .unwrap();

    assert!(queue.submissions().is_empty());
    assert_eq!(artifacts.cleared_events(), vec![after.id]);
}

#[tokio::test]
async fn restoring_a_started_event_comes_back_as_draft() {
    let now = Utc::now();
    let deleted = EventFixture::new()
        .published()
        .starts_at(now - Duration::days(3))
        .ends_at(now + Duration::days(1))
        .deleted_at(now - Duration::days(1))
        .build();

    let mut patch: EventPatch = serde_json::from_str(r#"{"deleted_at": null}"#).unwrap();

    let triggers = detect_triggers(&deleted, &patch);
    assert!(triggers.restored);

    // The handler coerces the patch exactly like this on CoerceDraft.
    match check_date_window(Some(&deleted), &patch, now) {
        DateDecision::CoerceDraft => patch.state = Some(EventState::Draft),
        other => panic!("expected CoerceDraft, got {other:?}"),
    }
    assert_eq!(patch.state, Some(EventState::Draft));
}

#[tokio::test]
async fn moving_dates_into_the_past_is_rejected() {
    let now = Utc::now();
    let event = EventFixture::new()
        .starts_at(now + Duration::days(5))
        .ends_at(now + Duration::days(6))
        .build();

    let patch = EventPatch {
        starts_at: Some(now - Duration::hours(1)),
        ..Default::default()
    };
    assert!(detect_triggers(&event, &patch).dates_changed);
    assert!(matches!(
        check_date_window(Some(&event), &patch, now),
        DateDecision::Reject { field: "starts_at", .. }
    ));
}

#[tokio::test]
async fn deletion_guard_blocks_admins_when_orders_exist() {
    assert!(check_deletion(&admin_user().capabilities, 1).is_err());
    assert!(check_deletion(&admin_user().capabilities, 0).is_ok());
}

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
async fn managed_drafts_are_visible_only_to_their_managers() {
    let roles = InMemoryRoles::new();
    let manager = verified_user();
    let stranger = verified_user();
    roles.add_user(manager.clone());
    roles.add_user(stranger.clone());

    let draft = EventFixture::new().draft().build();
    roles.assign(manager.id, draft.id, Role::Coorganizer);

    let holds = |user_id: UserId, event: &marquee_domain::Event, scoping: RoleScoping| {
        let role = match scoping {
            RoleScoping::Exactly(role) => role,
            RoleScoping::AnyOrganizing => {
                return roles.holds(user_id, event.id, Role::Owner)
                    || roles.holds(user_id, event.id, Role::Organizer)
                    || roles.holds(user_id, event.id, Role::Coorganizer);
            }
        };
        roles.holds(user_id, event.id, role)
    };

    let manager_filter = EventFilter::for_caller(&Caller::authenticated(manager));
    assert!(manager_filter.matches(&draft, holds));

    let stranger_filter = EventFilter::for_caller(&Caller::authenticated(stranger));
    assert!(!stranger_filter.matches(&draft, holds));

    let anonymous_filter = EventFilter::for_caller(&Caller::anonymous());
    assert_eq!(anonymous_filter, EventFilter::Published);
    assert!(!anonymous_filter.matches(&draft, holds));
}

#[tokio::test]
async fn upcoming_needs_promotion_or_a_complete_listing() {
    let now = Utc::now();
    let filter = UpcomingFilter::new(now);

    let promoted = EventFixture::new()
        .published()
        .promoted()
        .starts_at(now + Duration::days(2))
        .ends_at(now + Duration::days(3))
        .build();
    assert!(filter.matches(&promoted, false, false));

    // Unpromoted events need imagery, classification, a live ticket, and a
    // twitter link; the fixture has no classification set.
    let plain = EventFixture::new()
        .published()
        .starts_at(now + Duration::days(2))
        .ends_at(now + Duration::days(3))
        .original_image_url("https://cdn.example.com/a.png")
        .logo_url("https://cdn.example.com/l.png")
        .build();
    assert!(!filter.matches(&plain, true, true));

    let private = EventFixture::new()
        .published()
        .private()
        .promoted()
        .starts_at(now + Duration::days(2))
        .ends_at(now + Duration::days(3))
        .build();
    assert!(!filter.matches(&private, true, true));
}
