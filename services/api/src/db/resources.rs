//! Sub-resource owner lookups.

use async_trait::async_trait;
use marquee_domain::{LookupKey, OwnerDirectory, ResourceKind, ResourceOwner, StoreError};
use marquee_id::EventId;
use sqlx::postgres::PgPool;

/// Postgres-backed [`OwnerDirectory`].
///
/// Every sub-resource table carries a nullable `event_id` column, so owner
/// lookup is one narrow query per kind.
#[derive(Clone)]
pub struct ResourceDirectory {
    pool: PgPool,
}

impl ResourceDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Sponsor => "sponsors",
        ResourceKind::UserFavouriteEvent => "user_favourite_events",
        ResourceKind::EventCopyright => "event_copyrights",
        ResourceKind::Track => "tracks",
        ResourceKind::SessionType => "session_types",
        ResourceKind::FaqType => "faq_types",
        ResourceKind::EventInvoice => "event_invoices",
        ResourceKind::DiscountCode => "discount_codes",
        ResourceKind::Session => "sessions",
        ResourceKind::SocialLink => "social_links",
        ResourceKind::Tax => "taxes",
        ResourceKind::StripeAuthorization => "stripe_authorizations",
        ResourceKind::SpeakersCall => "speakers_calls",
        ResourceKind::Ticket => "tickets",
        ResourceKind::TicketTag => "ticket_tags",
        ResourceKind::RoleInvite => "role_invites",
        ResourceKind::RoleAssignment => "role_assignments",
        ResourceKind::AccessCode => "access_codes",
        ResourceKind::Speaker => "speakers",
        ResourceKind::EmailNotification => "email_notifications",
        ResourceKind::Microlocation => "microlocations",
        ResourceKind::Attendee => "attendees",
        ResourceKind::CustomForm => "custom_forms",
        ResourceKind::Faq => "faqs",
        ResourceKind::Order => "orders",
        ResourceKind::Feedback => "feedback",
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    StoreError::new(e.to_string())
}

#[async_trait]
impl OwnerDirectory for ResourceDirectory {
    async fn find_event_by_slug(
        &self,
        identifier: &str,
    ) -> Result<Option<EventId>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM events WHERE identifier = $1 AND deleted_at IS NULL")
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        row.map(|(id,)| {
            id.parse::<EventId>()
                .map_err(|e| StoreError::new(format!("bad event id in events: {e}")))
        })
        .transpose()
    }

    async fn owning_event(
        &self,
        kind: ResourceKind,
        key: &LookupKey,
    ) -> Result<ResourceOwner, StoreError> {
        let column = match key {
            LookupKey::Id(_) => "id",
            LookupKey::Identifier(_) => "identifier",
        };
        let sql = format!("SELECT event_id FROM {} WHERE {} = $1", table(kind), column);

        let row: Option<(Option<String>,)> = sqlx::query_as(&sql)
            .bind(key.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            None => Ok(ResourceOwner::Missing),
            Some((None,)) => Ok(ResourceOwner::Detached),
            Some((Some(raw),)) => {
                let event_id = raw.parse::<EventId>().map_err(|e| {
                    StoreError::new(format!("bad event reference in {}: {e}", table(kind)))
                })?;
                Ok(ResourceOwner::Owned(event_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_table() {
        let kinds = [
            ResourceKind::Sponsor,
            ResourceKind::UserFavouriteEvent,
            ResourceKind::EventCopyright,
            ResourceKind::Track,
            ResourceKind::SessionType,
            ResourceKind::FaqType,
            ResourceKind::EventInvoice,
            ResourceKind::DiscountCode,
            ResourceKind::Session,
            ResourceKind::SocialLink,
            ResourceKind::Tax,
            ResourceKind::StripeAuthorization,
            ResourceKind::SpeakersCall,
            ResourceKind::Ticket,
            ResourceKind::TicketTag,
            ResourceKind::RoleInvite,
            ResourceKind::RoleAssignment,
            ResourceKind::AccessCode,
            ResourceKind::Speaker,
            ResourceKind::EmailNotification,
            ResourceKind::Microlocation,
            ResourceKind::Attendee,
            ResourceKind::CustomForm,
            ResourceKind::Faq,
            ResourceKind::Order,
            ResourceKind::Feedback,
        ];

        let mut tables: Vec<&str> = kinds.iter().map(|k| table(*k)).collect();
        assert_eq!(tables.len(), 26);
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), 26, "table names must be distinct");
    }
}
