use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::error;

use crate::{
    models::usage::UsageDecision,
    responses::JsonResponse,
    routes::auth::session::AuthSession,
    state::AppState,
    usage::{ResetWindow, UsageError},
};

pub const DAILY_LIMIT_CODE: &str = "daily_limit_reached";

pub async fn get_message_usage(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let plan = app_state
        .resolve_plan_tier(&claims.id, claims.plan.as_deref())
        .await;

    let decision = match app_state.usage_limiter.check_limit(&claims.id, plan).await {
        Ok(decision) => decision,
        Err(err) => return usage_error_response(err),
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "plan": plan.as_str(),
            "limit": decision.limit,
            "used": decision.used,
            "remaining": decision.remaining,
            "allowed": decision.allowed,
            "next_reset_time": rfc3339(decision.next_reset_time),
        })),
    )
        .into_response()
}

pub(crate) fn usage_error_response(err: UsageError) -> Response {
    match err {
        UsageError::InvalidArgument => {
            JsonResponse::unauthorized("Session is missing a user id").into_response()
        }
        UsageError::StorageUnavailable(err) => {
            error!(?err, "message usage store unavailable");
            JsonResponse::service_unavailable(
                "Message usage is temporarily unavailable. Please try again shortly.",
            )
            .into_response()
        }
    }
}

pub(crate) fn limit_reached_response(decision: &UsageDecision, window: &ResetWindow) -> Response {
    let message = format!(
        "Daily limit reached. Try again after {}",
        display_time(decision.next_reset_time, window)
    );
    let mut response =
        JsonResponse::error_with_code(StatusCode::TOO_MANY_REQUESTS, &message, DAILY_LIMIT_CODE)
            .into_response();

    let retry_after = (decision.next_reset_time - Utc::now()).num_seconds().max(0);
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

pub(crate) fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn display_time(instant: DateTime<Utc>, window: &ResetWindow) -> String {
    instant
        .with_timezone(&window.timezone())
        .format("%B %-d, %Y %-I:%M %p %Z")
        .to_string()
}
