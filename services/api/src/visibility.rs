//! Visibility filters for event listings.
//!
//! A filter is the complete access predicate of one listing. Handlers pick
//! the default for the caller, then role, classification, and discount-code
//! routes swap in their own filter; scoped filters replace the default
//! outright rather than narrowing it.
//!
//! Each filter renders to a SQL predicate for the store and also evaluates
//! in memory for tests.

use chrono::{DateTime, Utc};
use marquee_domain::{Caller, Event, EventPrivacy, RoleScoping, MANAGING_ROLES};
use marquee_id::{DiscountCodeId, EventSubTopicId, EventTopicId, EventTypeId, UserId};
use sqlx::{Postgres, QueryBuilder};

// ============================================================================
// Event Filter
// ============================================================================

/// Access predicate for the main event listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Every live event. Staff only.
    All,
    /// Published events only. The anonymous default.
    Published,
    /// Published events plus drafts the user manages.
    PublishedOrManagedBy(UserId),
    /// Events where the user holds a matching role assignment.
    HeldRole {
        user_id: UserId,
        scoping: RoleScoping,
    },
    /// Events with this event type.
    EventType(EventTypeId),
    /// Events with this topic.
    EventTopic(EventTopicId),
    /// Events with this sub-topic.
    EventSubTopic(EventSubTopicId),
    /// Events linked to this discount code.
    DiscountCode(DiscountCodeId),
}

impl EventFilter {
    /// The default filter for a caller on the unscoped listing.
    ///
    /// Staff see everything, authenticated users see published events plus
    /// the drafts they manage, everyone else sees published events only.
    pub fn for_caller(caller: &Caller) -> Self {
        if caller.is_staff() {
            return EventFilter::All;
        }
        match caller.user_id() {
            Some(user_id) => EventFilter::PublishedOrManagedBy(user_id),
            None => EventFilter::Published,
        }
    }

    /// Append this filter as a parenthesized SQL predicate.
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            EventFilter::All => {
                builder.push("TRUE");
            }
            EventFilter::Published => {
                builder.push("events.state = 'published'");
            }
            EventFilter::PublishedOrManagedBy(user_id) => {
                builder.push(
                    "(events.state = 'published' OR EXISTS (\
                     SELECT 1 FROM role_assignments ra \
                     WHERE ra.event_id = events.id AND ra.user_id = ",
                );
                builder.push_bind(user_id.to_string());
                builder.push(" AND ra.role IN ('owner', 'organizer', 'coorganizer')))");
            }
            EventFilter::HeldRole { user_id, scoping } => {
                builder.push(
                    "EXISTS (SELECT 1 FROM role_assignments ra \
                     WHERE ra.event_id = events.id AND ra.user_id = ",
                );
                builder.push_bind(user_id.to_string());
                match scoping {
                    RoleScoping::AnyOrganizing => {
                        builder.push(" AND ra.role <> 'attendee')");
                    }
                    RoleScoping::Exactly(role) => {
                        builder.push(" AND ra.role = ");
                        builder.push_bind(role.as_str());
                        builder.push(")");
                    }
                }
            }
            EventFilter::EventType(id) => {
                builder.push("events.event_type_id = ");
                builder.push_bind(id.to_string());
            }
            EventFilter::EventTopic(id) => {
                builder.push("events.event_topic_id = ");
                builder.push_bind(id.to_string());
            }
            EventFilter::EventSubTopic(id) => {
                builder.push("events.event_sub_topic_id = ");
                builder.push_bind(id.to_string());
            }
            EventFilter::DiscountCode(id) => {
                builder.push("events.discount_code_id = ");
                builder.push_bind(id.to_string());
            }
        }
    }

    /// Evaluate this filter against a live event.
    ///
    /// `holds_role` answers role assignment checks; soft-deleted events are
    /// excluded by the store and must not reach this.
    pub fn matches<F>(&self, event: &Event, holds_role: F) -> bool
    where
        F: Fn(UserId, &Event, RoleScoping) -> bool,
    {
        match self {
            EventFilter::All => true,
            EventFilter::Published => event.is_published(),
            EventFilter::PublishedOrManagedBy(user_id) => {
                event.is_published()
                    || MANAGING_ROLES
                        .iter()
                        .any(|role| holds_role(*user_id, event, RoleScoping::Exactly(*role)))
            }
            EventFilter::HeldRole { user_id, scoping } => holds_role(*user_id, event, *scoping),
            EventFilter::EventType(id) => event.event_type_id == Some(*id),
            EventFilter::EventTopic(id) => event.event_topic_id == Some(*id),
            EventFilter::EventSubTopic(id) => event.event_sub_topic_id == Some(*id),
            EventFilter::DiscountCode(id) => event.discount_code_id == Some(*id),
        }
    }
}

// ============================================================================
// Upcoming Filter
// ============================================================================

/// Predicate for the public upcoming-events listing.
///
/// Only published, public, still-running events qualify, and of those only
/// promoted ones or ones complete enough to present: imagery, full
/// classification, a live ticket, and a twitter link.
#[derive(Debug, Clone, Copy)]
pub struct UpcomingFilter {
    now: DateTime<Utc>,
}

impl UpcomingFilter {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Append the upcoming predicate as parenthesized SQL.
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push("(events.starts_at > ");
        builder.push_bind(self.now);
        builder.push(" AND events.ends_at > ");
        builder.push_bind(self.now);
        builder.push(
            " AND events.state = 'published' AND events.privacy = 'public' \
             AND (events.is_promoted OR (\
             events.original_image_url IS NOT NULL \
             AND events.logo_url IS NOT NULL \
             AND events.event_type_id IS NOT NULL \
             AND events.event_topic_id IS NOT NULL \
             AND events.event_sub_topic_id IS NOT NULL \
             AND EXISTS (SELECT 1 FROM tickets t \
             WHERE t.event_id = events.id AND t.deleted_at IS NULL \
             AND NOT t.is_hidden AND t.sales_ends_at > ",
        );
        builder.push_bind(self.now);
        builder.push(
            ") AND EXISTS (SELECT 1 FROM social_links sl \
             WHERE sl.event_id = events.id AND sl.name = 'twitter'))))",
        );
    }

    /// Evaluate the upcoming predicate against a live event.
    pub fn matches(&self, event: &Event, has_live_ticket: bool, has_twitter_link: bool) -> bool {
        if event.starts_at <= self.now || event.ends_at <= self.now {
            return false;
        }
        if !event.is_published() || event.privacy != EventPrivacy::Public {
            return false;
        }
        if event.is_promoted {
            return true;
        }
        event.original_image_url.is_some()
            && event.logo_url.is_some()
            && event.event_type_id.is_some()
            && event.event_topic_id.is_some()
            && event.event_sub_topic_id.is_some()
            && has_live_ticket
            && has_twitter_link
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marquee_domain::Role;
    use marquee_testing::{admin_user, verified_user, EventFixture};

    fn no_roles(_: UserId, _: &Event, _: RoleScoping) -> bool {
        false
    }

    #[test]
    fn anonymous_default_is_published_only() {
        let filter = EventFilter::for_caller(&Caller::anonymous());
        assert_eq!(filter, EventFilter::Published);

        let published = EventFixture::new().published().build();
        let draft = EventFixture::new().draft().build();
        assert!(filter.matches(&published, no_roles));
        assert!(!filter.matches(&draft, no_roles));
    }

    #[test]
    fn staff_default_sees_everything() {
        let filter = EventFilter::for_caller(&Caller::authenticated(admin_user()));
        assert_eq!(filter, EventFilter::All);

        let draft = EventFixture::new().draft().build();
        assert!(filter.matches(&draft, no_roles));
    }

    #[test]
    fn authenticated_default_adds_managed_drafts() {
        let user = verified_user();
        let filter = EventFilter::for_caller(&Caller::authenticated(user.clone()));

        let draft = EventFixture::new().draft().build();
        let managed_id = draft.id;

        // Without a managing role the draft stays hidden.
        assert!(!filter.matches(&draft, no_roles));

        // A coorganizer assignment makes it visible.
        let holds = |user_id: UserId, event: &Event, scoping: RoleScoping| {
            user_id == user.id
                && event.id == managed_id
                && scoping == RoleScoping::Exactly(Role::Coorganizer)
        };
        assert!(filter.matches(&draft, holds));

        // Published events are visible regardless of roles.
        let published = EventFixture::new().published().build();
        assert!(filter.matches(&published, no_roles));
    }

    #[test]
    fn held_role_filter_ignores_publication_state() {
        let user = verified_user();
        let filter = EventFilter::HeldRole {
            user_id: user.id,
            scoping: RoleScoping::Exactly(Role::Registrar),
        };

        let draft = EventFixture::new().draft().build();
        let holds = |_: UserId, _: &Event, scoping: RoleScoping| {
            scoping == RoleScoping::Exactly(Role::Registrar)
        };
        assert!(filter.matches(&draft, holds));
        assert!(!filter.matches(&draft, no_roles));
    }

    #[test]
    fn classification_filters_match_on_column() {
        let type_id = EventTypeId::new();
        let event = {
            let mut event = EventFixture::new().build();
            event.event_type_id = Some(type_id);
            event
        };

        assert!(EventFilter::EventType(type_id).matches(&event, no_roles));
        assert!(!EventFilter::EventType(EventTypeId::new()).matches(&event, no_roles));
        assert!(!EventFilter::EventTopic(EventTopicId::new()).matches(&event, no_roles));
    }

    #[test]
    fn predicate_sql_shapes() {
        let mut builder = QueryBuilder::new("");
        EventFilter::Published.push_predicate(&mut builder);
        assert_eq!(builder.sql(), "events.state = 'published'");

        let mut builder = QueryBuilder::new("");
        EventFilter::HeldRole {
            user_id: UserId::new(),
            scoping: RoleScoping::AnyOrganizing,
        }
        .push_predicate(&mut builder);
        assert!(builder.sql().contains("ra.role <> 'attendee'"));

        let mut builder = QueryBuilder::new("");
        EventFilter::PublishedOrManagedBy(UserId::new()).push_predicate(&mut builder);
        assert!(builder
            .sql()
            .contains("ra.role IN ('owner', 'organizer', 'coorganizer')"));
    }

    #[test]
    fn upcoming_requires_future_and_published_public() {
        let now = Utc::now();
        let filter = UpcomingFilter::new(now);

        let past = EventFixture::new()
            .starts_at(now - Duration::days(2))
            .ends_at(now - Duration::days(1))
            .promoted()
            .build();
        assert!(!filter.matches(&past, true, true));

        let running = EventFixture::new()
            .starts_at(now - Duration::hours(1))
            .ends_at(now + Duration::hours(5))
            .promoted()
            .build();
        assert!(!filter.matches(&running, true, true), "already started");

        let draft = EventFixture::new().draft().promoted().build();
        assert!(!filter.matches(&draft, true, true));

        let private = EventFixture::new().private().promoted().build();
        assert!(!filter.matches(&private, true, true));
    }

    #[test]
    fn upcoming_promoted_skips_completeness_checks() {
        let filter = UpcomingFilter::new(Utc::now());
        let promoted = EventFixture::new().promoted().build();
        assert!(filter.matches(&promoted, false, false));
    }

    #[test]
    fn upcoming_unpromoted_needs_full_presentation() {
        let filter = UpcomingFilter::new(Utc::now());

        let mut complete = EventFixture::new()
            .original_image_url("https://cdn.example.org/banner.png")
            .logo_url("https://cdn.example.org/logo.png")
            .build();
        complete.event_type_id = Some(EventTypeId::new());
        complete.event_topic_id = Some(EventTopicId::new());
        complete.event_sub_topic_id = Some(EventSubTopicId::new());

        assert!(filter.matches(&complete, true, true));
        assert!(!filter.matches(&complete, false, true), "no live ticket");
        assert!(!filter.matches(&complete, true, false), "no twitter link");

        let mut missing_topic = complete.clone();
        missing_topic.event_topic_id = None;
        assert!(!filter.matches(&missing_topic, true, true));

        let bare = EventFixture::new().build();
        assert!(!filter.matches(&bare, true, true));
    }
}
