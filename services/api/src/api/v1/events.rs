//! Event endpoints: the collection itself plus every scoped route that
//! resolves back to it.
//!
//! Three families of routes live here. The `/events` collection covers CRUD
//! and the upcoming listing. Scoped listings narrow the collection by role
//! assignment, classification, or discount code. Owning-event routes take a
//! sub-resource key from the URL and return the event it belongs to.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use marquee_domain::{
    Caller, DomainError, Event, EventPatch, EventPrivacy, EventState, OwnerResolution, Role,
    RoleScoping, ScopeMap,
};
use marquee_id::{
    DiscountCodeId, EventId, EventSubTopicId, EventTopicId, EventTypeId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::api::authz;
use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::db::DbError;
use crate::jobs::{self, Dispatcher, SideEffect};
use crate::lifecycle::{self, DateDecision};
use crate::scoping;
use crate::state::AppState;
use crate::visibility::{EventFilter, UpcomingFilter};

// ============================================================================
// Routes
// ============================================================================

/// Routes under `/events`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/upcoming", get(list_upcoming_events))
        .route(
            "/{event_ref}",
            get(get_event).patch(update_event).delete(delete_event),
        )
}

/// Sub-resource collections with an owning-event route, paired with the
/// scope parameter each one binds. Event invoices are registered separately
/// because their key can be either a primary key or a human identifier.
const OWNING_EVENT_ROUTES: [(&str, &str); 25] = [
    ("sponsors", "sponsor_id"),
    ("user-favourite-events", "user_favourite_event_id"),
    ("event-copyrights", "copyright_id"),
    ("tracks", "track_id"),
    ("session-types", "session_type_id"),
    ("faq-types", "faq_type_id"),
    ("discount-codes", "discount_code_id"),
    ("sessions", "session_id"),
    ("social-links", "social_link_id"),
    ("taxes", "tax_id"),
    ("stripe-authorizations", "stripe_authorization_id"),
    ("speakers-calls", "speakers_call_id"),
    ("tickets", "ticket_id"),
    ("ticket-tags", "ticket_tag_id"),
    ("role-invites", "role_invite_id"),
    ("users-events-roles", "users_events_role_id"),
    ("access-codes", "access_code_id"),
    ("speakers", "speaker_id"),
    ("email-notifications", "email_notification_id"),
    ("microlocations", "microlocation_id"),
    ("attendees", "attendee_id"),
    ("custom-forms", "custom_form_id"),
    ("faqs", "faq_id"),
    ("orders", "order_identifier"),
    ("feedbacks", "feedback_id"),
];

/// Scoped routes mounted at the version root.
pub fn scoped_routes() -> Router<AppState> {
    let mut router = Router::new()
        // Role-scoped listings, self-or-staff only.
        .route("/users/{user_id}/events", get(list_user_events))
        .route("/users/{user_id}/owner-events", get(list_owner_events))
        .route("/users/{user_id}/organizer-events", get(list_organizer_events))
        .route(
            "/users/{user_id}/coorganizer-events",
            get(list_coorganizer_events),
        )
        .route(
            "/users/{user_id}/track-organizer-events",
            get(list_track_organizer_events),
        )
        .route("/users/{user_id}/registrar-events", get(list_registrar_events))
        .route("/users/{user_id}/moderator-events", get(list_moderator_events))
        .route("/users/{user_id}/marketer-events", get(list_marketer_events))
        .route(
            "/users/{user_id}/sales-admin-events",
            get(list_sales_admin_events),
        )
        // Classification listings.
        .route("/event-types/{event_type_id}/events", get(list_events_by_type))
        .route("/event-topics/{event_topic_id}/events", get(list_events_by_topic))
        .route(
            "/event-sub-topics/{event_sub_topic_id}/events",
            get(list_events_by_sub_topic),
        )
        // Discount-code listing, management access required.
        .route(
            "/discount-codes/{discount_code_id}/events",
            get(list_discount_code_events),
        )
        // Invoice keys come in two shapes; the handler sniffs which.
        .route("/event-invoices/{invoice_key}/event", get(get_invoice_event));

    for (collection, param) in OWNING_EVENT_ROUTES {
        let path = format!("/{collection}/{{{param}}}/event");
        router = router.route(&path, get(get_owning_event));
    }

    router
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for event listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    /// Maximum results per page (default 50, max 200).
    pub limit: Option<i64>,
    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,
}

/// A page of events.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ListEventsResponse {
    pub items: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Payload for creating an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    /// Unique slug; derived from the new event's ID when omitted.
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub state: Option<EventState>,
    #[serde(default)]
    pub privacy: Option<EventPrivacy>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub schedule_published_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_promoted: Option<bool>,
    #[serde(default)]
    pub event_type_id: Option<EventTypeId>,
    #[serde(default)]
    pub event_topic_id: Option<EventTopicId>,
    #[serde(default)]
    pub event_sub_topic_id: Option<EventSubTopicId>,
    #[serde(default)]
    pub discount_code_id: Option<DiscountCodeId>,
}

/// Deletion acknowledgement.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DeleteResponse {
    pub ok: bool,
}

// ============================================================================
// Collection Handlers
// ============================================================================

/// List events the caller may see.
async fn list_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authz::load_caller(&state, &ctx).await?;
    let filter = EventFilter::for_caller(&caller);
    list_with_filter(&state, &filter, &query, &ctx.request_id).await
}

/// List upcoming discoverable events, soonest first.
async fn list_upcoming_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let events = state
        .events()
        .list_upcoming(&UpcomingFilter::new(Utc::now()), limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to list upcoming events");
            ApiError::internal("internal_error", "Failed to list upcoming events")
                .with_request_id(request_id.clone())
        })?;

    Ok(Json(ListEventsResponse {
        items: events,
        next_cursor: None,
    }))
}

/// Create an event.
///
/// The caller becomes the owner: an owner role assignment and an accepted
/// owner invite are written in the same transaction as the event itself.
async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id.clone();

    let caller = authz::load_caller(&state, &ctx).await?;
    let user = authz::require_authenticated(&caller, &request_id)?.clone();

    let event_state = req.state.unwrap_or_default();

    // Capability and publication checks run over the submitted payload.
    let gate = EventPatch {
        name: Some(req.name.clone()),
        state: Some(event_state),
        ..Default::default()
    };
    lifecycle::check_write_authorization(&user.capabilities, &gate)
        .map_err(|e| ApiError::from_domain(e, &request_id))?;

    // Drafts may carry past dates; anything published must validate.
    if event_state != EventState::Draft {
        let dates = EventPatch {
            starts_at: Some(req.starts_at),
            ends_at: Some(req.ends_at),
            ..Default::default()
        };
        if let DateDecision::Reject { field, message } =
            lifecycle::check_date_window(None, &dates, Utc::now())
        {
            return Err(ApiError::from_domain(
                DomainError::unprocessable(field, message),
                &request_id,
            ));
        }
    }

    let event_id = EventId::new();
    let identifier = req
        .identifier
        .unwrap_or_else(|| derive_identifier(event_id));

    let now = Utc::now();
    let event = Event {
        id: event_id,
        identifier,
        name: req.name,
        state: event_state,
        privacy: req.privacy.unwrap_or_default(),
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        deleted_at: None,
        original_image_url: req.original_image_url,
        logo_url: req.logo_url,
        ical_url: None,
        xcal_url: None,
        pentabarf_url: None,
        schedule_published_on: req.schedule_published_on,
        is_promoted: req.is_promoted.unwrap_or(false),
        event_type_id: req.event_type_id,
        event_topic_id: req.event_topic_id,
        event_sub_topic_id: req.event_sub_topic_id,
        discount_code_id: req.discount_code_id,
        created_at: now,
        updated_at: now,
    };

    state
        .events()
        .insert_with_owner(&event, &user)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return ApiError::conflict(
                    "identifier_taken",
                    "An event with this identifier already exists",
                )
                .with_request_id(request_id.clone());
            }
            tracing::error!(error = %e, request_id = %request_id, "Failed to create event");
            ApiError::internal("internal_error", "Failed to create event")
                .with_request_id(request_id.clone())
        })?;

    dispatch_side_effects(&state, jobs::plan_create(&event), &request_id).await?;

    tracing::info!(
        request_id = %request_id,
        event_id = %event.id,
        state = %event.state.as_str(),
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(event)).into_response())
}

/// Fetch one event by ID or identifier slug.
async fn get_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_ref): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let caller = authz::load_caller(&state, &ctx).await?;

    let event = fetch_event_by_ref(&state, &event_ref, &request_id).await?;
    let event = gate_event_visibility(&state, &caller, event, &request_id).await?;

    Ok(Json(event))
}

/// Update an event.
async fn update_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_ref): Path<String>,
    Json(mut patch): Json<EventPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();

    let caller = authz::load_caller(&state, &ctx).await?;
    let capabilities = authz::require_authenticated(&caller, &request_id)?.capabilities;

    let before = fetch_event_by_ref(&state, &event_ref, &request_id).await?;
    authz::require_coorganizer(&state, &caller, before.id, &request_id).await?;

    lifecycle::check_write_authorization(&capabilities, &patch)
        .map_err(|e| ApiError::from_domain(e, &request_id))?;

    // Date changes, publication of a draft, and restores all force the date
    // window to be re-checked. Restores of an already-started event come
    // back as drafts.
    let triggers = lifecycle::detect_triggers(&before, &patch);
    if triggers.any() {
        match lifecycle::check_date_window(Some(&before), &patch, Utc::now()) {
            DateDecision::Accept => {}
            DateDecision::CoerceDraft => patch.state = Some(EventState::Draft),
            DateDecision::Reject { field, message } => {
                return Err(ApiError::from_domain(
                    DomainError::unprocessable(field, message),
                    &request_id,
                ));
            }
        }
    }

    if patch.requests_deletion() {
        let order_count = count_orders(&state, before.id, &request_id).await?;
        lifecycle::check_deletion(&capabilities, order_count)
            .map_err(|e| ApiError::from_domain(e, &request_id))?;
    }

    let after = state
        .events()
        .update(before.id, &patch)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, event_id = %before.id, "Failed to update event");
            ApiError::internal("internal_error", "Failed to update event")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| event_not_found(&request_id))?;

    dispatch_side_effects(&state, jobs::plan_update(&before, &after, &patch), &request_id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        event_id = %after.id,
        state = %after.state.as_str(),
        "Event updated"
    );

    Ok(Json(after))
}

/// Soft-delete an event.
async fn delete_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_ref): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();

    let caller = authz::load_caller(&state, &ctx).await?;
    authz::require_authenticated(&caller, &request_id)?;

    let event = fetch_event_by_ref(&state, &event_ref, &request_id).await?;
    if event.is_deleted() {
        return Err(event_not_found(&request_id));
    }

    authz::require_coorganizer(&state, &caller, event.id, &request_id).await?;

    let order_count = count_orders(&state, event.id, &request_id).await?;
    lifecycle::check_deletion(&caller.capabilities(), order_count)
        .map_err(|e| ApiError::from_domain(e, &request_id))?;

    state
        .events()
        .soft_delete(event.id, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, event_id = %event.id, "Failed to delete event");
            ApiError::internal("internal_error", "Failed to delete event")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| event_not_found(&request_id))?;

    tracing::info!(request_id = %request_id, event_id = %event.id, "Event soft-deleted");

    Ok(Json(DeleteResponse { ok: true }))
}

// ============================================================================
// Role-Scoped Listings
// ============================================================================

async fn list_user_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(&state, &ctx, &user_id, RoleScoping::AnyOrganizing, &query).await
}

async fn list_owner_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(&state, &ctx, &user_id, RoleScoping::Exactly(Role::Owner), &query).await
}

async fn list_organizer_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::Organizer),
        &query,
    )
    .await
}

async fn list_coorganizer_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::Coorganizer),
        &query,
    )
    .await
}

async fn list_track_organizer_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::TrackOrganizer),
        &query,
    )
    .await
}

async fn list_registrar_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::Registrar),
        &query,
    )
    .await
}

async fn list_moderator_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::Moderator),
        &query,
    )
    .await
}

async fn list_marketer_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::Marketer),
        &query,
    )
    .await
}

async fn list_sales_admin_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_role_scoped(
        &state,
        &ctx,
        &user_id,
        RoleScoping::Exactly(Role::SalesAdmin),
        &query,
    )
    .await
}

/// Shared body of the nine role-scoped listings.
///
/// Only the user themselves or staff may read these; everyone else gets a
/// flat 403 regardless of whether the target user exists. Staff naming a
/// missing account get a 404 on `user_id`.
async fn list_role_scoped(
    state: &AppState,
    ctx: &RequestContext,
    raw_user_id: &str,
    scoping: RoleScoping,
    query: &ListEventsQuery,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let request_id = &ctx.request_id;

    let user_id: UserId = raw_user_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_user_id", "Invalid user ID format")
            .with_request_id(request_id.clone())
    })?;

    let caller = authz::load_caller(state, ctx).await?;
    authz::require_self_or_staff(&caller, user_id, request_id)?;

    // The caller's own account was already loaded with the token; only a
    // staff lookup of somebody else needs an existence check.
    if caller.user_id() != Some(user_id) {
        let target = state.roles().find_user(user_id).await.map_err(|e| {
            tracing::error!(
                error = %e,
                request_id = %request_id,
                user_id = %user_id,
                "Failed to load target user"
            );
            ApiError::internal("internal_error", "Failed to list events")
                .with_request_id(request_id.clone())
        })?;
        if target.is_none() {
            return Err(ApiError::from_domain(
                DomainError::not_found("user_id", format!("user not found: {user_id}")),
                request_id,
            ));
        }
    }

    let filter = EventFilter::HeldRole { user_id, scoping };
    list_with_filter(state, &filter, query, request_id).await
}

// ============================================================================
// Classification Listings
// ============================================================================

async fn list_events_by_type(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_type_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let event_type_id: EventTypeId = event_type_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_event_type_id", "Invalid event type ID format")
            .with_request_id(ctx.request_id.clone())
    })?;
    list_with_filter(
        &state,
        &EventFilter::EventType(event_type_id),
        &query,
        &ctx.request_id,
    )
    .await
}

async fn list_events_by_topic(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_topic_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let event_topic_id: EventTopicId = event_topic_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_event_topic_id", "Invalid event topic ID format")
            .with_request_id(ctx.request_id.clone())
    })?;
    list_with_filter(
        &state,
        &EventFilter::EventTopic(event_topic_id),
        &query,
        &ctx.request_id,
    )
    .await
}

async fn list_events_by_sub_topic(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_sub_topic_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let event_sub_topic_id: EventSubTopicId = event_sub_topic_id.parse().map_err(|_| {
        ApiError::bad_request(
            "invalid_event_sub_topic_id",
            "Invalid event sub-topic ID format",
        )
        .with_request_id(ctx.request_id.clone())
    })?;
    list_with_filter(
        &state,
        &EventFilter::EventSubTopic(event_sub_topic_id),
        &query,
        &ctx.request_id,
    )
    .await
}

/// List events linked to a discount code.
///
/// The code is resolved to its owning event first and the caller must manage
/// that event. A code attached to no event scopes the listing to nothing.
async fn list_discount_code_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(discount_code_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();

    let code_id: DiscountCodeId = discount_code_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_discount_code_id", "Invalid discount code ID format")
            .with_request_id(request_id.clone())
    })?;

    let caller = authz::load_caller(&state, &ctx).await?;

    let scope = ScopeMap::from_param("discount_code_id", discount_code_id);
    let directory = state.resources();
    let resolution = scoping::resolve_owner(&directory, &scope)
        .await
        .map_err(|e| ApiError::from_domain(e, &request_id))?;

    let event_id = match resolution {
        OwnerResolution::Event(event_id) => event_id,
        OwnerResolution::Orphaned | OwnerResolution::Unscoped => {
            return Ok(Json(ListEventsResponse {
                items: Vec::new(),
                next_cursor: None,
            }));
        }
    };

    authz::require_coorganizer(&state, &caller, event_id, &request_id).await?;

    list_with_filter(&state, &EventFilter::DiscountCode(code_id), &query, &request_id).await
}

// ============================================================================
// Owning-Event Routes
// ============================================================================

/// Return the event a sub-resource belongs to.
///
/// The path parameter name selects the resolution rule, so a single handler
/// serves every registered sub-resource collection.
async fn get_owning_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(params): Path<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let caller = authz::load_caller(&state, &ctx).await?;

    let event = resolve_owning_event(&state, &caller, ScopeMap::from(params), &request_id).await?;
    Ok(Json(event))
}

/// Return the event an invoice belongs to.
///
/// Invoice routes accept either the primary key or the human identifier in
/// the same position; the key shape decides which lookup runs.
async fn get_invoice_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let caller = authz::load_caller(&state, &ctx).await?;

    let scope = ScopeMap::from_param(invoice_scope_param(&invoice_key), invoice_key);
    let event = resolve_owning_event(&state, &caller, scope, &request_id).await?;
    Ok(Json(event))
}

// ============================================================================
// Helpers
// ============================================================================

fn event_not_found(request_id: &str) -> ApiError {
    ApiError::from_domain(
        DomainError::not_found("event_id", "Event: not found"),
        request_id,
    )
}

/// Invoice primary keys carry the `inv_` prefix; anything else is treated as
/// a human identifier.
fn invoice_scope_param(key: &str) -> &'static str {
    if key.starts_with("inv_") {
        "event_invoice_id"
    } else {
        "event_invoice_identifier"
    }
}

/// Event slugs are the lowercased ULID of the event ID unless the creator
/// picked one.
fn derive_identifier(event_id: EventId) -> String {
    event_id.ulid().to_string().to_lowercase()
}

fn is_unique_violation(err: &DbError) -> bool {
    match err {
        DbError::Query(e) => e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation()),
        _ => false,
    }
}

/// Run a filtered, paginated listing.
async fn list_with_filter(
    state: &AppState,
    filter: &EventFilter,
    query: &ListEventsQuery,
    request_id: &str,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let page = state
        .events()
        .list(filter, limit, query.cursor.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to list events");
            ApiError::internal("internal_error", "Failed to list events")
                .with_request_id(request_id.to_string())
        })?;

    Ok(Json(ListEventsResponse {
        items: page.events,
        next_cursor: page.next_cursor,
    }))
}

/// Load an event by ID or identifier slug, 404 when neither matches.
async fn fetch_event_by_ref(
    state: &AppState,
    event_ref: &str,
    request_id: &str,
) -> Result<Event, ApiError> {
    let store = state.events();
    let event = match event_ref.parse::<EventId>() {
        Ok(event_id) => store.fetch(event_id).await,
        Err(_) => store.fetch_by_identifier(event_ref).await,
    }
    .map_err(|e| {
        tracing::error!(error = %e, request_id = %request_id, "Failed to load event");
        ApiError::internal("internal_error", "Failed to load event")
            .with_request_id(request_id.to_string())
    })?;

    event.ok_or_else(|| event_not_found(request_id))
}

/// Hide drafts and deleted events from callers without management access.
///
/// The response is the same 404 a missing event produces, so probing for
/// drafts leaks nothing.
async fn gate_event_visibility(
    state: &AppState,
    caller: &Caller,
    event: Event,
    request_id: &str,
) -> Result<Event, ApiError> {
    let hidden = event.is_deleted() || event.state == EventState::Draft;
    if !hidden {
        return Ok(event);
    }
    if authz::is_coorganizer(state, caller, event.id, request_id).await? {
        return Ok(event);
    }
    Err(event_not_found(request_id))
}

/// Resolve scope parameters to an owning event and load it.
///
/// A resource that exists but points at no event is indistinguishable from a
/// missing one here.
async fn resolve_owning_event(
    state: &AppState,
    caller: &Caller,
    scope: ScopeMap,
    request_id: &str,
) -> Result<Event, ApiError> {
    let directory = state.resources();
    let resolution = scoping::resolve_owner(&directory, &scope)
        .await
        .map_err(|e| ApiError::from_domain(e, request_id))?;

    let OwnerResolution::Event(event_id) = resolution else {
        return Err(event_not_found(request_id));
    };

    let event = state
        .events()
        .fetch(event_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, event_id = %event_id, "Failed to load owning event");
            ApiError::internal("internal_error", "Failed to load event")
                .with_request_id(request_id.to_string())
        })?
        .ok_or_else(|| event_not_found(request_id))?;

    gate_event_visibility(state, caller, event, request_id).await
}

async fn count_orders(
    state: &AppState,
    event_id: EventId,
    request_id: &str,
) -> Result<i64, ApiError> {
    state.events().count_orders(event_id).await.map_err(|e| {
        tracing::error!(error = %e, request_id = %request_id, event_id = %event_id, "Failed to count orders");
        ApiError::internal("internal_error", "Failed to load event orders")
            .with_request_id(request_id.to_string())
    })
}

/// Submit the planned side effects of a successful write.
async fn dispatch_side_effects(
    state: &AppState,
    effects: Vec<SideEffect>,
    request_id: &str,
) -> Result<(), ApiError> {
    if effects.is_empty() {
        return Ok(());
    }

    let queue = state.job_queue();
    let exports = state.export_jobs();
    let submitted = Dispatcher::new(&queue, &exports)
        .dispatch(&effects)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to dispatch background tasks");
            ApiError::internal("internal_error", "Failed to schedule background tasks")
                .with_request_id(request_id.to_string())
        })?;

    if !submitted.is_empty() {
        tracing::info!(
            request_id = %request_id,
            tasks = submitted.len(),
            "Submitted background tasks"
        );
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
