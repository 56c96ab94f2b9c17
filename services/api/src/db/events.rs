//! Event storage.
//!
//! The event store provides:
//! - Event creation with owner role bootstrap (single transaction)
//! - Fetch by id or slug, partial update, soft-delete
//! - Visibility-filtered listings with cursor pagination
//! - Order counts for the deletion guard

use chrono::{DateTime, Utc};
use marquee_domain::{Event, EventPatch, EventPrivacy, EventState, Role, UserRecord};
use marquee_id::{
    DiscountCodeId, EventId, EventSubTopicId, EventTopicId, EventTypeId, RoleAssignmentId,
    RoleInviteId,
};
use sqlx::{
    postgres::{PgPool, PgRow},
    QueryBuilder, Row,
};

use super::DbError;
use crate::visibility::{EventFilter, UpcomingFilter};

const EVENT_COLUMNS: &str = "id, identifier, name, state, privacy, starts_at, ends_at, \
     deleted_at, original_image_url, logo_url, ical_url, xcal_url, pentabarf_url, \
     schedule_published_on, is_promoted, event_type_id, event_topic_id, event_sub_topic_id, \
     discount_code_id, created_at, updated_at";

/// One page of a scoped listing.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<String>,
}

/// A decoded row from the events table.
struct EventRow(Event);

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        row.0
    }
}

fn parse_column<T>(column: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> sqlx::FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let state: String = row.try_get("state")?;
        let privacy: String = row.try_get("privacy")?;

        let state = EventState::parse(&state).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "state".to_string(),
            source: format!("unknown event state: {state}").into(),
        })?;
        let privacy = EventPrivacy::parse(&privacy).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "privacy".to_string(),
            source: format!("unknown event privacy: {privacy}").into(),
        })?;

        let event_type_id = row
            .try_get::<Option<String>, _>("event_type_id")?
            .map(|raw| parse_column::<EventTypeId>("event_type_id", &raw))
            .transpose()?;
        let event_topic_id = row
            .try_get::<Option<String>, _>("event_topic_id")?
            .map(|raw| parse_column::<EventTopicId>("event_topic_id", &raw))
            .transpose()?;
        let event_sub_topic_id = row
            .try_get::<Option<String>, _>("event_sub_topic_id")?
            .map(|raw| parse_column::<EventSubTopicId>("event_sub_topic_id", &raw))
            .transpose()?;
        let discount_code_id = row
            .try_get::<Option<String>, _>("discount_code_id")?
            .map(|raw| parse_column::<DiscountCodeId>("discount_code_id", &raw))
            .transpose()?;

        Ok(Self(Event {
            id: parse_column("id", &id)?,
            identifier: row.try_get("identifier")?,
            name: row.try_get("name")?,
            state,
            privacy,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            deleted_at: row.try_get("deleted_at")?,
            original_image_url: row.try_get("original_image_url")?,
            logo_url: row.try_get("logo_url")?,
            ical_url: row.try_get("ical_url")?,
            xcal_url: row.try_get("xcal_url")?,
            pentabarf_url: row.try_get("pentabarf_url")?,
            schedule_published_on: row.try_get("schedule_published_on")?,
            is_promoted: row.try_get("is_promoted")?,
            event_type_id,
            event_topic_id,
            event_sub_topic_id,
            discount_code_id,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

/// Store for event records.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a new event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event and bootstrap its owner in one transaction.
    ///
    /// The creator gets an owner role assignment plus an accepted owner
    /// invite, so ownership stays traceable through the invite history.
    pub async fn insert_with_owner(
        &self,
        event: &Event,
        owner: &UserRecord,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        sqlx::query(
            r#"
            INSERT INTO events (
                id,
                identifier,
                name,
                state,
                privacy,
                starts_at,
                ends_at,
                deleted_at,
                original_image_url,
                logo_url,
                ical_url,
                xcal_url,
                pentabarf_url,
                schedule_published_on,
                is_promoted,
                event_type_id,
                event_topic_id,
                event_sub_topic_id,
                discount_code_id,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.identifier)
        .bind(&event.name)
        .bind(event.state.as_str())
        .bind(event.privacy.as_str())
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.deleted_at)
        .bind(&event.original_image_url)
        .bind(&event.logo_url)
        .bind(&event.ical_url)
        .bind(&event.xcal_url)
        .bind(&event.pentabarf_url)
        .bind(event.schedule_published_on)
        .bind(event.is_promoted)
        .bind(event.event_type_id.map(|id| id.to_string()))
        .bind(event.event_topic_id.map(|id| id.to_string()))
        .bind(event.event_sub_topic_id.map(|id| id.to_string()))
        .bind(event.discount_code_id.map(|id| id.to_string()))
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        sqlx::query(
            "INSERT INTO role_assignments (id, user_id, event_id, role) VALUES ($1, $2, $3, $4)",
        )
        .bind(RoleAssignmentId::new().to_string())
        .bind(owner.id.to_string())
        .bind(event.id.to_string())
        .bind(Role::Owner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        sqlx::query(
            "INSERT INTO role_invites (id, email, role, event_id, status) VALUES ($1, $2, $3, $4, 'accepted')",
        )
        .bind(RoleInviteId::new().to_string())
        .bind(&owner.email)
        .bind(Role::Owner.as_str())
        .bind(event.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        tx.commit().await.map_err(DbError::Query)?;
        Ok(())
    }

    /// Fetch an event by id, including soft-deleted rows.
    ///
    /// Callers decide whether a deleted row is visible to the requester.
    pub async fn fetch(&self, event_id: EventId) -> Result<Option<Event>, DbError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.map(Event::from))
    }

    /// Fetch an event by its unique slug, including soft-deleted rows.
    pub async fn fetch_by_identifier(&self, identifier: &str) -> Result<Option<Event>, DbError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE identifier = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.map(Event::from))
    }

    /// Apply a partial update and return the updated row.
    ///
    /// Returns `None` when the event does not exist.
    pub async fn update(
        &self,
        event_id: EventId,
        patch: &EventPatch,
    ) -> Result<Option<Event>, DbError> {
        if patch.is_empty() {
            return self.fetch(event_id).await;
        }

        let mut builder = QueryBuilder::new("UPDATE events SET updated_at = now()");

        if let Some(name) = &patch.name {
            builder.push(", name = ");
            builder.push_bind(name.clone());
        }
        if let Some(state) = patch.state {
            builder.push(", state = ");
            builder.push_bind(state.as_str());
        }
        if let Some(privacy) = patch.privacy {
            builder.push(", privacy = ");
            builder.push_bind(privacy.as_str());
        }
        if let Some(starts_at) = patch.starts_at {
            builder.push(", starts_at = ");
            builder.push_bind(starts_at);
        }
        if let Some(ends_at) = patch.ends_at {
            builder.push(", ends_at = ");
            builder.push_bind(ends_at);
        }
        if let Some(is_promoted) = patch.is_promoted {
            builder.push(", is_promoted = ");
            builder.push_bind(is_promoted);
        }
        if let Some(deleted_at) = patch.deleted_at {
            builder.push(", deleted_at = ");
            builder.push_bind(deleted_at);
        }
        if let Some(url) = &patch.original_image_url {
            builder.push(", original_image_url = ");
            builder.push_bind(url.clone());
        }
        if let Some(url) = &patch.logo_url {
            builder.push(", logo_url = ");
            builder.push_bind(url.clone());
        }
        if let Some(at) = patch.schedule_published_on {
            builder.push(", schedule_published_on = ");
            builder.push_bind(at);
        }
        if let Some(id) = &patch.event_type_id {
            builder.push(", event_type_id = ");
            builder.push_bind(id.map(|id| id.to_string()));
        }
        if let Some(id) = &patch.event_topic_id {
            builder.push(", event_topic_id = ");
            builder.push_bind(id.map(|id| id.to_string()));
        }
        if let Some(id) = &patch.event_sub_topic_id {
            builder.push(", event_sub_topic_id = ");
            builder.push_bind(id.map(|id| id.to_string()));
        }
        if let Some(id) = &patch.discount_code_id {
            builder.push(", discount_code_id = ");
            builder.push_bind(id.map(|id| id.to_string()));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(event_id.to_string());
        builder.push(" RETURNING ");
        builder.push(EVENT_COLUMNS);

        let row: Option<EventRow> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.map(Event::from))
    }

    /// Soft-delete an event.
    ///
    /// Returns `None` when the event does not exist or is already deleted.
    pub async fn soft_delete(
        &self,
        event_id: EventId,
        at: DateTime<Utc>,
    ) -> Result<Option<Event>, DbError> {
        let sql = format!(
            "UPDATE events SET deleted_at = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {EVENT_COLUMNS}"
        );
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id.to_string())
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(row.map(Event::from))
    }

    /// Count live orders placed against an event.
    pub async fn count_orders(&self, event_id: EventId) -> Result<i64, DbError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS order_count FROM orders WHERE event_id = $1 AND deleted_at IS NULL",
        )
        .bind(event_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::Query)?;
        row.try_get("order_count").map_err(DbError::Query)
    }

    /// List live events matching a visibility filter.
    ///
    /// Results are ordered by id ascending; the cursor is the last id of the
    /// previous page.
    pub async fn list(
        &self,
        filter: &EventFilter,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<EventPage, DbError> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(EVENT_COLUMNS);
        builder.push(" FROM events WHERE deleted_at IS NULL AND ");
        filter.push_predicate(&mut builder);
        if let Some(cursor) = cursor {
            builder.push(" AND id > ");
            builder.push_bind(cursor.to_string());
        }
        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(limit);

        let rows: Vec<EventRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)?;
        let events: Vec<Event> = rows.into_iter().map(Event::from).collect();

        let next_cursor = if events.len() as i64 == limit {
            events.last().map(|e| e.id.to_string())
        } else {
            None
        };

        Ok(EventPage {
            events,
            next_cursor,
        })
    }

    /// List upcoming discoverable events, soonest first.
    pub async fn list_upcoming(
        &self,
        filter: &UpcomingFilter,
        limit: i64,
    ) -> Result<Vec<Event>, DbError> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(EVENT_COLUMNS);
        builder.push(" FROM events WHERE deleted_at IS NULL AND ");
        filter.push_predicate(&mut builder);
        builder.push(" ORDER BY starts_at ASC LIMIT ");
        builder.push_bind(limit);

        let rows: Vec<EventRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_column_reports_column_name() {
        let err = parse_column::<EventId>("id", "not-an-id").unwrap_err();
        match err {
            sqlx::Error::ColumnDecode { index, .. } => assert_eq!(index, "id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn event_columns_match_struct_width() {
        assert_eq!(EVENT_COLUMNS.split(',').count(), 21);
    }
}
