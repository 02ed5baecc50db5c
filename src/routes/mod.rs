pub mod auth;
pub mod chat;
pub mod usage;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::{responses::JsonResponse, state::AppState};

/// All application routes with state applied. Transport layers (CORS,
/// tracing, per-IP throttling) are added by the binary.
pub fn app_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/usage", get(usage::get_message_usage))
        .route("/chat/messages", post(chat::send_chat_message));

    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes)
        .with_state(state)
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Hello from Sanctum!").into_response()
}
