//! Typed ID definitions for every platform resource.
//!
//! Each type carries its own prefix, so an `EventId` can never stand in for
//! a `UserId` even though both are ULIDs underneath.

use crate::define_id;

// ============================================================================
// Accounts
// ============================================================================

define_id!(UserId, "usr");

// ============================================================================
// Events and classification
// ============================================================================

define_id!(EventId, "evt");
define_id!(EventTypeId, "etype");
define_id!(EventTopicId, "etop");
define_id!(EventSubTopicId, "esub");

// ============================================================================
// Roles
// ============================================================================

define_id!(RoleAssignmentId, "ra");
define_id!(RoleInviteId, "rinv");

// ============================================================================
// Commerce
// ============================================================================

define_id!(DiscountCodeId, "disc");
define_id!(TicketId, "tkt");
define_id!(OrderId, "ord");

// ============================================================================
// Background work and requests
// ============================================================================

define_id!(TaskId, "task");
define_id!(ExportJobId, "exp");
define_id!(RequestId, "req");

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::IdError;

    use super::*;

    const ULID: &str = "01HV4Z2WQXKJNM8GPQY6VBKC3D";

    #[test]
    fn canonical_form_roundtrips() {
        let id = EventId::new();
        assert_eq!(EventId::parse(&id.to_string()), Ok(id));
        assert!(id.to_string().starts_with("evt_"));
    }

    #[test]
    fn rejects_the_wrong_resource_prefix() {
        let err = EventId::parse(&format!("usr_{ULID}")).unwrap_err();
        assert_eq!(
            err,
            IdError::InvalidPrefix {
                expected: "evt",
                actual: "usr".to_string(),
            }
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(EventId::parse(""), Err(IdError::Empty));
        assert_eq!(
            EventId::parse(&format!("evt{ULID}")),
            Err(IdError::MissingSeparator)
        );
        assert!(matches!(
            EventId::parse("evt_not-a-ulid"),
            Err(IdError::InvalidUlid(_))
        ));
    }

    #[test]
    fn serializes_as_a_json_string() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<UserId>(&json).unwrap(), id);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = TaskId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = TaskId::new();
        assert!(first < second);
    }

    #[test]
    fn prefixes_are_unique_across_types() {
        let prefixes = [
            UserId::PREFIX,
            EventId::PREFIX,
            EventTypeId::PREFIX,
            EventTopicId::PREFIX,
            EventSubTopicId::PREFIX,
            RoleAssignmentId::PREFIX,
            RoleInviteId::PREFIX,
            DiscountCodeId::PREFIX,
            TicketId::PREFIX,
            OrderId::PREFIX,
            TaskId::PREFIX,
            ExportJobId::PREFIX,
            RequestId::PREFIX,
        ];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(unique.len(), prefixes.len());
    }
}
