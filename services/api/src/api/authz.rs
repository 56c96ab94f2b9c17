//! Authorization helpers shared across v1 handlers.

use marquee_domain::{Caller, RoleDirectory, UserRecord, MANAGING_ROLES};
use marquee_id::{EventId, UserId};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::state::AppState;

/// Load the caller's account for this request.
///
/// Requests without a token become anonymous callers. A token naming an
/// unknown account is rejected; capability checks downstream depend on the
/// stored verification flags.
pub async fn load_caller(state: &AppState, ctx: &RequestContext) -> Result<Caller, ApiError> {
    let Some(user_id) = ctx.user_id else {
        return Ok(Caller::anonymous());
    };

    let user = state.roles().find_user(user_id).await.map_err(|e| {
        tracing::error!(
            error = %e,
            request_id = %ctx.request_id,
            user_id = %user_id,
            "Failed to load caller account"
        );
        ApiError::internal("internal_error", "Authorization check failed")
            .with_request_id(ctx.request_id.clone())
    })?;

    match user {
        Some(user) => Ok(Caller::authenticated(user)),
        None => Err(ApiError::unauthorized("unauthorized", "Unknown user")
            .with_request_id(ctx.request_id.clone())),
    }
}

/// Require a logged-in caller and hand back their account.
pub fn require_authenticated<'a>(
    caller: &'a Caller,
    request_id: &str,
) -> Result<&'a UserRecord, ApiError> {
    caller.user().ok_or_else(|| {
        ApiError::unauthorized("unauthorized", "Missing or invalid Authorization token")
            .with_request_id(request_id.to_string())
    })
}

/// Allow the user themselves or staff, nobody else.
pub fn require_self_or_staff(
    caller: &Caller,
    user_id: UserId,
    request_id: &str,
) -> Result<(), ApiError> {
    if caller.is_staff() || caller.user_id() == Some(user_id) {
        return Ok(());
    }
    Err(ApiError::forbidden("forbidden", "Access Forbidden")
        .with_request_id(request_id.to_string()))
}

/// True when the caller holds a managing role on the event. Staff always
/// qualify; anonymous callers never do.
pub async fn is_coorganizer(
    state: &AppState,
    caller: &Caller,
    event_id: EventId,
    request_id: &str,
) -> Result<bool, ApiError> {
    if caller.is_staff() {
        return Ok(true);
    }
    let Some(user_id) = caller.user_id() else {
        return Ok(false);
    };

    state
        .roles()
        .holds_any(user_id, event_id, &MANAGING_ROLES)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                request_id = %request_id,
                event_id = %event_id,
                "Failed to load role assignments"
            );
            ApiError::internal("internal_error", "Authorization check failed")
                .with_request_id(request_id.to_string())
        })
}

/// Management gate for event writes and scoped listings.
pub async fn require_coorganizer(
    state: &AppState,
    caller: &Caller,
    event_id: EventId,
    request_id: &str,
) -> Result<(), ApiError> {
    if is_coorganizer(state, caller, event_id, request_id).await? {
        return Ok(());
    }
    Err(ApiError::forbidden("forbidden", "Coorganizer access is required")
        .with_request_id(request_id.to_string()))
}
