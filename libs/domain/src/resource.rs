//! Sub-resource kinds, lookup keys, and owner-resolution outcomes.

use std::collections::HashMap;

use marquee_id::EventId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Resource Kinds
// ============================================================================

/// Kinds of sub-resources that belong to an event.
///
/// Every kind here can occur as a URL scope parameter and be resolved back to
/// its owning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Sponsor,
    UserFavouriteEvent,
    EventCopyright,
    Track,
    SessionType,
    FaqType,
    EventInvoice,
    DiscountCode,
    Session,
    SocialLink,
    Tax,
    StripeAuthorization,
    SpeakersCall,
    Ticket,
    TicketTag,
    RoleInvite,
    RoleAssignment,
    AccessCode,
    Speaker,
    EmailNotification,
    Microlocation,
    Attendee,
    CustomForm,
    Faq,
    Order,
    Feedback,
}

impl ResourceKind {
    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Sponsor => "sponsor",
            ResourceKind::UserFavouriteEvent => "favourite event",
            ResourceKind::EventCopyright => "event copyright",
            ResourceKind::Track => "track",
            ResourceKind::SessionType => "session type",
            ResourceKind::FaqType => "faq type",
            ResourceKind::EventInvoice => "event invoice",
            ResourceKind::DiscountCode => "discount code",
            ResourceKind::Session => "session",
            ResourceKind::SocialLink => "social link",
            ResourceKind::Tax => "tax",
            ResourceKind::StripeAuthorization => "stripe authorization",
            ResourceKind::SpeakersCall => "speakers call",
            ResourceKind::Ticket => "ticket",
            ResourceKind::TicketTag => "ticket tag",
            ResourceKind::RoleInvite => "role invite",
            ResourceKind::RoleAssignment => "role assignment",
            ResourceKind::AccessCode => "access code",
            ResourceKind::Speaker => "speaker",
            ResourceKind::EmailNotification => "email notification",
            ResourceKind::Microlocation => "microlocation",
            ResourceKind::Attendee => "attendee",
            ResourceKind::CustomForm => "custom form",
            ResourceKind::Faq => "faq",
            ResourceKind::Order => "order",
            ResourceKind::Feedback => "feedback",
        }
    }
}

// ============================================================================
// Lookup Keys
// ============================================================================

/// How a sub-resource is addressed in a scope parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// Primary-key lookup.
    Id(String),
    /// Lookup by a secondary unique identifier column.
    Identifier(String),
}

impl LookupKey {
    pub fn value(&self) -> &str {
        match self {
            LookupKey::Id(v) | LookupKey::Identifier(v) => v,
        }
    }
}

// ============================================================================
// Resolution Outcomes
// ============================================================================

/// What the owner directory found for a single sub-resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOwner {
    /// No row with that key exists.
    Missing,
    /// The row exists but its event reference is null.
    Detached,
    /// The row belongs to this event.
    Owned(EventId),
}

/// Outcome of resolving a full set of scope parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerResolution {
    /// No scope parameter applied; the listing stays unscoped.
    Unscoped,
    /// The winning parameter resolved to this event.
    Event(EventId),
    /// The winning parameter's resource exists but points at no event.
    /// Listings scoped this way are empty rather than an error.
    Orphaned,
}

// ============================================================================
// Scope Map
// ============================================================================

/// The URL scope parameters of a request, by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMap(HashMap<String, String>);

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, param: impl Into<String>, value: impl Into<String>) {
        self.0.insert(param.into(), value.into());
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.0.get(param).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A map holding a single parameter.
    pub fn from_param(param: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(param, value);
        map
    }
}

impl From<HashMap<String, String>> for ScopeMap {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Tests
// ============================================================================
