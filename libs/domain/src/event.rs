//! Event entity, publication state, and update patch.

use chrono::{DateTime, Utc};
use marquee_id::{
    DiscountCodeId, EventId, EventSubTopicId, EventTopicId, EventTypeId,
};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Publication State
// ============================================================================

/// Publication state of an event.
///
/// Events begin as drafts, visible only to their organizing team, and become
/// publicly listable once published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    #[default]
    Draft,
    Published,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Draft => "draft",
            EventState::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(EventState::Draft),
            "published" => Some(EventState::Published),
            _ => None,
        }
    }
}

/// Listing privacy of an event.
///
/// Private events never appear in public discovery listings, even when
/// published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPrivacy {
    #[default]
    Public,
    Private,
}

impl EventPrivacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPrivacy::Public => "public",
            EventPrivacy::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(EventPrivacy::Public),
            "private" => Some(EventPrivacy::Private),
            _ => None,
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// An event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Human-friendly unique slug, usable anywhere the id is.
    pub identifier: String,
    pub name: String,
    pub state: EventState,
    pub privacy: EventPrivacy,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Soft-deletion timestamp. Deleted events stay in storage but drop out
    /// of every listing and lookup.
    pub deleted_at: Option<DateTime<Utc>>,
    pub original_image_url: Option<String>,
    pub logo_url: Option<String>,
    pub ical_url: Option<String>,
    pub xcal_url: Option<String>,
    pub pentabarf_url: Option<String>,
    /// When set on a published event, schedule exports are kept current.
    pub schedule_published_on: Option<DateTime<Utc>>,
    pub is_promoted: bool,
    pub event_type_id: Option<EventTypeId>,
    pub event_topic_id: Option<EventTopicId>,
    pub event_sub_topic_id: Option<EventSubTopicId>,
    pub discount_code_id: Option<DiscountCodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_published(&self) -> bool {
        self.state == EventState::Published
    }
}

// ============================================================================
// Event Patch
// ============================================================================

/// Captures an explicit `null` separately from an absent field.
///
/// The outer `Option` is `None` when the key was absent from the payload and
/// `Some(None)` when the client sent `null`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Partial update to an event.
///
/// Plain fields are `Option<T>`: absent means "leave unchanged". Fields that
/// can be cleared are `Option<Option<T>>` so an explicit `null` (clear) is
/// distinguishable from omission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<EventState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<EventPrivacy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_promoted: Option<bool>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_image_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub logo_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule_published_on: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type_id: Option<Option<EventTypeId>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_topic_id: Option<Option<EventTopicId>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_sub_topic_id: Option<Option<EventSubTopicId>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_code_id: Option<Option<DiscountCodeId>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.state.is_none()
            && self.privacy.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.is_promoted.is_none()
            && self.deleted_at.is_none()
            && self.original_image_url.is_none()
            && self.logo_url.is_none()
            && self.schedule_published_on.is_none()
            && self.event_type_id.is_none()
            && self.event_topic_id.is_none()
            && self.event_sub_topic_id.is_none()
            && self.discount_code_id.is_none()
    }

    /// True when the patch sets `deleted_at` to a concrete timestamp.
    pub fn requests_deletion(&self) -> bool {
        matches!(self.deleted_at, Some(Some(_)))
    }

    /// True when the patch clears `deleted_at` with an explicit `null`.
    pub fn requests_restore(&self) -> bool {
        matches!(self.deleted_at, Some(None))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_roundtrips_through_str() {
        for state in [EventState::Draft, EventState::Published] {
            assert_eq!(EventState::parse(state.as_str()), Some(state));
        }
        assert_eq!(EventState::parse("archived"), None);
    }

    #[test]
    fn privacy_roundtrips_through_str() {
        for privacy in [EventPrivacy::Public, EventPrivacy::Private] {
            assert_eq!(EventPrivacy::parse(privacy.as_str()), Some(privacy));
        }
        assert_eq!(EventPrivacy::parse("unlisted"), None);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: EventPatch = serde_json::from_str(r#"{"name": "FOSS Summit"}"#)
            .unwrap();
        assert_eq!(patch.name.as_deref(), Some("FOSS Summit"));
        assert_eq!(patch.deleted_at, None);

        let patch: EventPatch = serde_json::from_str(r#"{"deleted_at": null}"#)
            .unwrap();
        assert_eq!(patch.deleted_at, Some(None));
        assert!(patch.requests_restore());
        assert!(!patch.requests_deletion());

        let patch: EventPatch =
            serde_json::from_str(r#"{"deleted_at": "2026-03-01T12:00:00Z"}"#)
                .unwrap();
        assert!(matches!(patch.deleted_at, Some(Some(_))));
        assert!(patch.requests_deletion());
    }

    #[test]
    fn patch_serializes_without_absent_fields() {
        let patch = EventPatch {
            name: Some("Rustconf".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Rustconf"}));
    }

    #[test]
    fn empty_patch_reports_empty() {
        let patch: EventPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let patch: EventPatch = serde_json::from_str(r#"{"is_promoted": true}"#)
            .unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn clearing_classification_parses_as_explicit_null() {
        let patch: EventPatch =
            serde_json::from_str(r#"{"event_type_id": null}"#).unwrap();
        assert_eq!(patch.event_type_id, Some(None));
    }
}
