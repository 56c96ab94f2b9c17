//! Caller identity, capabilities, and event roles.

use marquee_id::UserId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Roles
// ============================================================================

/// Role a user holds on a specific event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Organizer,
    Coorganizer,
    TrackOrganizer,
    Moderator,
    Attendee,
    Registrar,
    Marketer,
    SalesAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Organizer => "organizer",
            Role::Coorganizer => "coorganizer",
            Role::TrackOrganizer => "track_organizer",
            Role::Moderator => "moderator",
            Role::Attendee => "attendee",
            Role::Registrar => "registrar",
            Role::Marketer => "marketer",
            Role::SalesAdmin => "sales_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Role::Owner),
            "organizer" => Some(Role::Organizer),
            "coorganizer" => Some(Role::Coorganizer),
            "track_organizer" => Some(Role::TrackOrganizer),
            "moderator" => Some(Role::Moderator),
            "attendee" => Some(Role::Attendee),
            "registrar" => Some(Role::Registrar),
            "marketer" => Some(Role::Marketer),
            "sales_admin" => Some(Role::SalesAdmin),
            _ => None,
        }
    }
}

/// Roles that grant management access to an event.
///
/// Holding any of these makes the event visible to its holder while still a
/// draft and unlocks write operations.
pub const MANAGING_ROLES: [Role; 3] = [Role::Owner, Role::Organizer, Role::Coorganizer];

/// How a role-scoped listing matches assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScoping {
    /// Any role other than attendee.
    AnyOrganizing,
    /// Exactly the named role.
    Exactly(Role),
}

// ============================================================================
// Capabilities
// ============================================================================

/// Account-level capability flags for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_create_event: bool,
    pub can_publish_event: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl Capabilities {
    /// Derives capabilities from stored account flags.
    ///
    /// Staff accounts can always create and publish; everyone else needs a
    /// verified email first.
    pub fn from_flags(is_verified: bool, is_admin: bool, is_super_admin: bool) -> Self {
        let staff = is_admin || is_super_admin;
        Self {
            can_create_event: is_verified || staff,
            can_publish_event: is_verified || staff,
            is_admin,
            is_super_admin,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.is_admin || self.is_super_admin
    }
}

// ============================================================================
// Caller
// ============================================================================

/// A user account as the role directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub capabilities: Capabilities,
}

/// The identity a request runs under.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    user: Option<UserRecord>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: UserRecord) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Capabilities of the caller, or the empty set when anonymous.
    pub fn capabilities(&self) -> Capabilities {
        self.user
            .as_ref()
            .map(|u| u.capabilities)
            .unwrap_or_default()
    }

    pub fn is_staff(&self) -> bool {
        self.capabilities().is_staff()
    }
}

// ============================================================================
// Tests
// ============================================================================
