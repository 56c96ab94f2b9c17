//! Owner resolution for scoped listings.
//!
//! Event sub-resources hang off listing URLs as scope parameters
//! (`track_id`, `order_identifier`, ...). Resolution walks a fixed rule
//! table: every parameter present in the request is resolved in table order,
//! and the last matching rule wins. A missing resource is an error naming
//! the parameter; a resource whose event reference is null scopes the
//! listing to nothing instead of failing.

use marquee_domain::{
    DomainError, LookupKey, OwnerDirectory, OwnerResolution, ResourceKind, ResourceOwner, ScopeMap,
};

// ============================================================================
// Rule Table
// ============================================================================

/// How a scope parameter's value is matched against its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    Id,
    Identifier,
}

/// What a scope parameter resolves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    /// The event's own slug.
    EventSlug,
    /// A sub-resource row that carries an event reference.
    Resource { kind: ResourceKind, by: KeyColumn },
    /// The discount code named by the companion `discount_code_id`
    /// parameter. The `user_id` parameter itself carries no lookup value.
    DiscountCodeForUser,
}

/// One entry of the resolution table.
#[derive(Debug, Clone, Copy)]
pub struct ScopeRule {
    pub param: &'static str,
    pub target: RuleTarget,
}

const fn by_id(param: &'static str, kind: ResourceKind) -> ScopeRule {
    ScopeRule {
        param,
        target: RuleTarget::Resource {
            kind,
            by: KeyColumn::Id,
        },
    }
}

const fn by_identifier(param: &'static str, kind: ResourceKind) -> ScopeRule {
    ScopeRule {
        param,
        target: RuleTarget::Resource {
            kind,
            by: KeyColumn::Identifier,
        },
    }
}

/// The resolution table. Order is load-bearing: when a request carries
/// several scope parameters, the last entry here that matches wins.
pub const SCOPE_RULES: [ScopeRule; 29] = [
    ScopeRule {
        param: "identifier",
        target: RuleTarget::EventSlug,
    },
    by_id("sponsor_id", ResourceKind::Sponsor),
    by_id("user_favourite_event_id", ResourceKind::UserFavouriteEvent),
    by_id("copyright_id", ResourceKind::EventCopyright),
    by_id("track_id", ResourceKind::Track),
    by_id("session_type_id", ResourceKind::SessionType),
    by_id("faq_type_id", ResourceKind::FaqType),
    by_id("event_invoice_id", ResourceKind::EventInvoice),
    by_identifier("event_invoice_identifier", ResourceKind::EventInvoice),
    by_id("discount_code_id", ResourceKind::DiscountCode),
    by_id("session_id", ResourceKind::Session),
    by_id("social_link_id", ResourceKind::SocialLink),
    by_id("tax_id", ResourceKind::Tax),
    by_id("stripe_authorization_id", ResourceKind::StripeAuthorization),
    ScopeRule {
        param: "user_id",
        target: RuleTarget::DiscountCodeForUser,
    },
    by_id("speakers_call_id", ResourceKind::SpeakersCall),
    by_id("ticket_id", ResourceKind::Ticket),
    by_id("ticket_tag_id", ResourceKind::TicketTag),
    by_id("role_invite_id", ResourceKind::RoleInvite),
    by_id("users_events_role_id", ResourceKind::RoleAssignment),
    by_id("access_code_id", ResourceKind::AccessCode),
    by_id("speaker_id", ResourceKind::Speaker),
    by_id("email_notification_id", ResourceKind::EmailNotification),
    by_id("microlocation_id", ResourceKind::Microlocation),
    by_id("attendee_id", ResourceKind::Attendee),
    by_id("custom_form_id", ResourceKind::CustomForm),
    by_id("faq_id", ResourceKind::Faq),
    by_identifier("order_identifier", ResourceKind::Order),
    by_id("feedback_id", ResourceKind::Feedback),
];

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a request's scope parameters to their owning event.
pub async fn resolve_owner(
    directory: &dyn OwnerDirectory,
    scope: &ScopeMap,
) -> Result<OwnerResolution, DomainError> {
    let mut resolution = OwnerResolution::Unscoped;

    for rule in &SCOPE_RULES {
        let Some(raw) = scope.get(rule.param) else {
            continue;
        };
        resolution = apply_rule(directory, rule, raw, scope).await?;
    }

    Ok(resolution)
}

async fn apply_rule(
    directory: &dyn OwnerDirectory,
    rule: &ScopeRule,
    raw: &str,
    scope: &ScopeMap,
) -> Result<OwnerResolution, DomainError> {
    match rule.target {
        RuleTarget::EventSlug => match directory.find_event_by_slug(raw).await? {
            Some(event_id) => Ok(OwnerResolution::Event(event_id)),
            None => Err(DomainError::not_found(
                rule.param,
                format!("event not found: {raw}"),
            )),
        },
        RuleTarget::Resource { kind, by } => {
            let key = match by {
                KeyColumn::Id => LookupKey::Id(raw.to_string()),
                KeyColumn::Identifier => LookupKey::Identifier(raw.to_string()),
            };
            resolve_resource(directory, rule.param, kind, &key).await
        }
        RuleTarget::DiscountCodeForUser => {
            let Some(code) = scope.get("discount_code_id") else {
                return Err(DomainError::not_found(
                    "discount_code_id",
                    "discount code not found",
                ));
            };
            let key = LookupKey::Id(code.to_string());
            resolve_resource(directory, "discount_code_id", ResourceKind::DiscountCode, &key).await
        }
    }
}

async fn resolve_resource(
    directory: &dyn OwnerDirectory,
    param: &'static str,
    kind: ResourceKind,
    key: &LookupKey,
) -> Result<OwnerResolution, DomainError> {
    match directory.owning_event(kind, key).await? {
        ResourceOwner::Missing => Err(DomainError::not_found(
            param,
            format!("{} not found: {}", kind.label(), key.value()),
        )),
        ResourceOwner::Detached => Ok(OwnerResolution::Orphaned),
        ResourceOwner::Owned(event_id) => Ok(OwnerResolution::Event(event_id)),
    }
}

// ============================================================================
// Tests
// ============================================================================
