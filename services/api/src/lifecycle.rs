//! Publication state machine checks.
//!
//! Every rule here is a pure function over the submitted patch, the stored
//! event, and the clock. Handlers run them in a fixed order: write
//! authorization, then the date window when a trigger demands it, then the
//! deletion guard when the patch touches `deleted_at`.

use chrono::{DateTime, Utc};
use marquee_domain::{Capabilities, DomainError, Event, EventPatch, EventState};

// ============================================================================
// Write Authorization
// ============================================================================

/// Gate a create or update payload on account capabilities.
///
/// Publication checks are payload-scoped: they fire when the submitted patch
/// itself carries `state: published`, and publishing requires the payload to
/// carry a non-empty name.
pub fn check_write_authorization(
    capabilities: &Capabilities,
    patch: &EventPatch,
) -> Result<(), DomainError> {
    if !capabilities.can_create_event {
        return Err(DomainError::forbidden("Please verify your Email"));
    }

    if patch.state == Some(EventState::Published) {
        if !capabilities.can_publish_event {
            return Err(DomainError::forbidden(
                "Only verified accounts can publish events",
            ));
        }
        if patch.name.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::conflict(
                "name",
                "Event Name is required to publish the event",
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Date Window
// ============================================================================

/// Outcome of validating the event's date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateDecision {
    /// Dates are acceptable as submitted.
    Accept,
    /// Dates are in the past but the patch restores a deleted event; the
    /// event must come back as a draft.
    CoerceDraft,
    /// Dates are invalid; reject with this field and message.
    Reject {
        field: &'static str,
        message: String,
    },
}

/// Validate the effective date window of a create or update.
///
/// Submitted dates win; absent ones fall back to the stored event. A window
/// that already started is tolerated twice: restoring a deleted event
/// (coerced back to draft) and soft-deleting a live one.
pub fn check_date_window(
    existing: Option<&Event>,
    patch: &EventPatch,
    now: DateTime<Utc>,
) -> DateDecision {
    let starts_at = patch.starts_at.or(existing.map(|e| e.starts_at));
    let ends_at = patch.ends_at.or(existing.map(|e| e.ends_at));

    let (Some(starts_at), Some(ends_at)) = (starts_at, ends_at) else {
        return DateDecision::Reject {
            field: "date",
            message: "enter required fields starts_at/ends_at".to_string(),
        };
    };

    if starts_at >= ends_at {
        return DateDecision::Reject {
            field: "ends_at",
            message: "ends_at should be after starts_at".to_string(),
        };
    }

    if starts_at <= now {
        let restoring = existing.is_some_and(Event::is_deleted) && patch.requests_restore();
        if restoring {
            return DateDecision::CoerceDraft;
        }

        let deleting = existing.is_some_and(|e| !e.is_deleted()) && patch.requests_deletion();
        if deleting {
            return DateDecision::Accept;
        }

        return DateDecision::Reject {
            field: "starts_at",
            message: "starts_at should be after current date-time".to_string(),
        };
    }

    DateDecision::Accept
}

// ============================================================================
// Update Triggers
// ============================================================================

/// Which update conditions force a date re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTriggers {
    /// A submitted date differs from the stored one.
    pub dates_changed: bool,
    /// The patch publishes a draft.
    pub draft_published: bool,
    /// The patch restores a deleted event.
    pub restored: bool,
}

impl UpdateTriggers {
    pub fn any(&self) -> bool {
        self.dates_changed || self.draft_published || self.restored
    }
}

/// Detect which re-validation triggers an update patch pulls.
pub fn detect_triggers(existing: &Event, patch: &EventPatch) -> UpdateTriggers {
    let dates_changed = patch.starts_at.is_some_and(|at| at != existing.starts_at)
        || patch.ends_at.is_some_and(|at| at != existing.ends_at);
    let draft_published =
        existing.state == EventState::Draft && patch.state == Some(EventState::Published);
    let restored = existing.is_deleted() && patch.requests_restore();

    UpdateTriggers {
        dates_changed,
        draft_published,
        restored,
    }
}

// ============================================================================
// Deletion Guard
// ============================================================================

/// Gate event deletion on its order history.
///
/// Events with orders can only be deleted by a super admin.
pub fn check_deletion(capabilities: &Capabilities, order_count: i64) -> Result<(), DomainError> {
    if order_count > 0 && !capabilities.is_super_admin {
        return Err(DomainError::forbidden(
            "Event associated with orders cannot be deleted",
        ));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marquee_testing::{
        admin_user, super_admin_user, unverified_user, verified_user, EventFixture,
    };
    use rstest::rstest;

    fn publish_patch(name: Option<&str>) -> EventPatch {
        EventPatch {
            name: name.map(str::to_string),
            state: Some(EventState::Published),
            ..Default::default()
        }
    }

    #[test]
    fn unverified_account_cannot_write() {
        let caps = unverified_user().capabilities;
        let err = check_write_authorization(&caps, &EventPatch::default()).unwrap_err();
        match err {
            DomainError::Forbidden(message) => assert_eq!(message, "Please verify your Email"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn publishing_requires_publish_capability() {
        let mut caps = verified_user().capabilities;
        caps.can_publish_event = false;

        let err = check_write_authorization(&caps, &publish_patch(Some("FOSS Summit")))
            .unwrap_err();
        match err {
            DomainError::Forbidden(message) => {
                assert_eq!(message, "Only verified accounts can publish events");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn publishing_requires_a_name(#[case] name: Option<&str>) {
        let caps = verified_user().capabilities;
        let err = check_write_authorization(&caps, &publish_patch(name)).unwrap_err();
        match err {
            DomainError::Conflict { field, .. } => assert_eq!(field, "name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn verified_account_can_publish_with_name() {
        let caps = verified_user().capabilities;
        check_write_authorization(&caps, &publish_patch(Some("FOSS Summit"))).unwrap();
    }

    #[test]
    fn draft_patch_skips_publication_checks() {
        let mut caps = verified_user().capabilities;
        caps.can_publish_event = false;

        let patch = EventPatch {
            state: Some(EventState::Draft),
            ..Default::default()
        };
        check_write_authorization(&caps, &patch).unwrap();
    }

    #[rstest]
    // Future window with both dates supplied is fine.
    #[case(Some(7), Some(9), DateDecision::Accept)]
    // Start after end is rejected on the end field.
    #[case(Some(9), Some(7), DateDecision::Reject { field: "ends_at", message: "ends_at should be after starts_at".to_string() })]
    // Equal start and end is rejected the same way.
    #[case(Some(7), Some(7), DateDecision::Reject { field: "ends_at", message: "ends_at should be after starts_at".to_string() })]
    // Past start on a plain update is rejected on the start field.
    #[case(Some(-1), Some(9), DateDecision::Reject { field: "starts_at", message: "starts_at should be after current date-time".to_string() })]
    fn date_window_for_creates(
        #[case] starts_days: Option<i64>,
        #[case] ends_days: Option<i64>,
        #[case] expected: DateDecision,
    ) {
        let now = Utc::now();
        let patch = EventPatch {
            starts_at: starts_days.map(|d| now + Duration::days(d)),
            ends_at: ends_days.map(|d| now + Duration::days(d)),
            ..Default::default()
        };
        assert_eq!(check_date_window(None, &patch, now), expected);
    }

    #[test]
    fn missing_dates_without_fallback_are_rejected() {
        let now = Utc::now();
        let patch = EventPatch {
            starts_at: Some(now + Duration::days(1)),
            ..Default::default()
        };
        let decision = check_date_window(None, &patch, now);
        assert_eq!(
            decision,
            DateDecision::Reject {
                field: "date",
                message: "enter required fields starts_at/ends_at".to_string(),
            }
        );
    }

    #[test]
    fn absent_dates_fall_back_to_stored_event() {
        let now = Utc::now();
        let event = EventFixture::new()
            .starts_at(now + Duration::days(3))
            .ends_at(now + Duration::days(4))
            .build();

        // Patch touches nothing date-related; stored window passes.
        let decision = check_date_window(Some(&event), &EventPatch::default(), now);
        assert_eq!(decision, DateDecision::Accept);

        // Moving only the end before the stored start fails.
        let patch = EventPatch {
            ends_at: Some(now + Duration::days(2)),
            ..Default::default()
        };
        assert!(matches!(
            check_date_window(Some(&event), &patch, now),
            DateDecision::Reject { field: "ends_at", .. }
        ));
    }

    #[test]
    fn restoring_a_started_event_coerces_draft() {
        let now = Utc::now();
        let event = EventFixture::new()
            .starts_at(now - Duration::days(2))
            .ends_at(now + Duration::days(1))
            .deleted_at(now - Duration::days(1))
            .build();

        let patch: EventPatch = serde_json::from_str(r#"{"deleted_at": null}"#).unwrap();
        assert_eq!(
            check_date_window(Some(&event), &patch, now),
            DateDecision::CoerceDraft
        );
    }

    #[test]
    fn soft_deleting_a_started_event_is_allowed() {
        let now = Utc::now();
        let event = EventFixture::new()
            .starts_at(now - Duration::days(2))
            .ends_at(now + Duration::days(1))
            .build();

        let patch = EventPatch {
            deleted_at: Some(Some(now)),
            ..Default::default()
        };
        assert_eq!(
            check_date_window(Some(&event), &patch, now),
            DateDecision::Accept
        );
    }

    #[test]
    fn triggers_fire_on_changed_dates_only() {
        let now = Utc::now();
        let event = EventFixture::new()
            .starts_at(now + Duration::days(3))
            .ends_at(now + Duration::days(4))
            .build();

        let unchanged = EventPatch {
            starts_at: Some(event.starts_at),
            ends_at: Some(event.ends_at),
            ..Default::default()
        };
        assert!(!detect_triggers(&event, &unchanged).any());

        let moved = EventPatch {
            starts_at: Some(now + Duration::days(5)),
            ..Default::default()
        };
        let triggers = detect_triggers(&event, &moved);
        assert!(triggers.dates_changed);
        assert!(triggers.any());
    }

    #[test]
    fn triggers_fire_on_publication_and_restore() {
        let now = Utc::now();
        let draft = EventFixture::new().draft().build();
        let publish = EventPatch {
            state: Some(EventState::Published),
            ..Default::default()
        };
        assert!(detect_triggers(&draft, &publish).draft_published);

        let deleted = EventFixture::new().deleted_at(now).build();
        let restore: EventPatch = serde_json::from_str(r#"{"deleted_at": null}"#).unwrap();
        assert!(detect_triggers(&deleted, &restore).restored);

        // Publishing an already-published event is not a trigger.
        let published = EventFixture::new().published().build();
        assert!(!detect_triggers(&published, &publish).any());
    }

    #[test]
    fn deletion_with_orders_needs_super_admin() {
        let err = check_deletion(&admin_user().capabilities, 3).unwrap_err();
        match err {
            DomainError::Forbidden(message) => {
                assert_eq!(message, "Event associated with orders cannot be deleted");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        check_deletion(&super_admin_user().capabilities, 3).unwrap();
        check_deletion(&verified_user().capabilities, 0).unwrap();
    }
}
