use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info};

use super::usage::{limit_reached_response, rfc3339, usage_error_response};
use crate::{
    models::chat::ChatMessagePayload, responses::JsonResponse,
    routes::auth::session::AuthSession, state::AppState,
};

pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Gated chat: check the quota, ask the provider, then count the message.
/// A provider failure leaves the quota untouched. Two requests racing at
/// `limit - 1` can both pass the check; the store counts both, so the day may
/// end one message over the limit.
pub async fn send_chat_message(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<ChatMessagePayload>,
) -> Response {
    let message = payload.message.trim();
    if message.is_empty() {
        return JsonResponse::bad_request("Message is required").into_response();
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return JsonResponse::bad_request(&format!(
            "Messages are limited to {MAX_MESSAGE_CHARS} characters"
        ))
        .into_response();
    }

    let user_id = claims.id.as_str();
    let plan = app_state
        .resolve_plan_tier(user_id, claims.plan.as_deref())
        .await;
    let limiter = &app_state.usage_limiter;

    let decision = match limiter.check_limit(user_id, plan).await {
        Ok(decision) => decision,
        Err(err) => return usage_error_response(err),
    };
    if !decision.allowed {
        info!(%user_id, plan = plan.as_str(), "daily message limit reached");
        return limit_reached_response(&decision, limiter.window());
    }

    let reply = match app_state.chat.reply(user_id, message).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(%user_id, ?err, "chat provider request failed");
            return JsonResponse::bad_gateway(
                "Your guide is unavailable right now. This message did not count toward your daily limit.",
            )
            .into_response();
        }
    };

    let record = match limiter.record_usage(user_id).await {
        Ok(record) => record,
        Err(err) => return usage_error_response(err),
    };

    let used = u32::try_from(record.message_count.max(0)).unwrap_or(u32::MAX);
    let next_reset_time = limiter.window().start_of_next_day(record.last_reset);

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "reply": reply,
            "remaining": decision.limit.saturating_sub(used),
            "next_reset_time": rfc3339(next_reset_time),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::{
        db::mock_db::{MockSubscriptionRepository, MockUsageRepository},
        models::usage::UsageRecord,
        routes::{app_router, usage::DAILY_LIMIT_CODE},
        services::chat::MockChatService,
        state::{
            test_support::{auth_cookie, TestStateBuilder},
            AppState,
        },
    };

    fn chat_request(cookie: &str, message: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(json!({ "message": message }).to_string()))
            .unwrap()
    }

    async fn send(state: &AppState, cookie: &str, message: &str) -> (StatusCode, Value) {
        let res = app_router(state.clone())
            .oneshot(chat_request(cookie, message))
            .await
            .unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn free_user_gets_three_messages_then_limit() {
        let usage = Arc::new(MockUsageRepository::default());
        let chat = Arc::new(MockChatService::default());
        let state = TestStateBuilder {
            usage: usage.clone(),
            chat: chat.clone(),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", Some("free"));

        for expected_remaining in [2, 1, 0] {
            let (status, json) = send(&state, &cookie, "How do I find calm?").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["remaining"], expected_remaining);
            assert!(json["reply"]["content"]
                .as_str()
                .unwrap()
                .contains("How do I find calm?"));
        }

        let res = app_router(state.clone())
            .oneshot(chat_request(&cookie, "One more?"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key(header::RETRY_AFTER));
        let body = axum::body::to_bytes(res.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], DAILY_LIMIT_CODE);
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("Daily limit reached. Try again after "));

        assert_eq!(chat.prompt_count(), 3);
        assert_eq!(usage.record("u1").unwrap().message_count, 3);
    }

    #[tokio::test]
    async fn premium_subscription_raises_the_limit() {
        let usage = Arc::new(MockUsageRepository::default());
        usage.seed(UsageRecord {
            user_id: "u1".into(),
            message_count: 3,
            last_reset: Utc::now(),
        });
        let state = TestStateBuilder {
            usage,
            subscriptions: MockSubscriptionRepository::with_plan("u1", "premium"),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", Some("free"));

        let (status, json) = send(&state, &cookie, "Guide me").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["remaining"], 5);
    }

    #[tokio::test]
    async fn yesterdays_usage_does_not_block_today() {
        let usage = Arc::new(MockUsageRepository::default());
        usage.seed(UsageRecord {
            user_id: "u1".into(),
            message_count: 3,
            last_reset: Utc::now() - Duration::days(2),
        });
        let state = TestStateBuilder {
            usage: usage.clone(),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", None);

        let (status, json) = send(&state, &cookie, "A new day").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["remaining"], 2);
        assert_eq!(usage.record("u1").unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn provider_failure_does_not_consume_quota() {
        let usage = Arc::new(MockUsageRepository::default());
        let state = TestStateBuilder {
            usage: usage.clone(),
            chat: Arc::new(MockChatService::failing()),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", None);

        let (status, json) = send(&state, &cookie, "Hello").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["success"], false);
        assert!(usage.record("u1").is_none());
    }

    #[tokio::test]
    async fn rejects_blank_and_oversized_messages() {
        let chat = Arc::new(MockChatService::default());
        let state = TestStateBuilder {
            chat: chat.clone(),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", None);

        let (status, _) = send(&state, &cookie, "   ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let long = "a".repeat(super::MAX_MESSAGE_CHARS + 1);
        let (status, _) = send(&state, &cookie, &long).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(chat.prompt_count(), 0);
    }

    #[tokio::test]
    async fn store_outage_blocks_the_message() {
        let chat = Arc::new(MockChatService::default());
        let state = TestStateBuilder {
            usage: Arc::new(MockUsageRepository::failing()),
            chat: chat.clone(),
            ..Default::default()
        }
        .build();
        let cookie = auth_cookie(&state, "u1", None);

        let (status, _) = send(&state, &cookie, "Hello").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(chat.prompt_count(), 0);
    }
}
