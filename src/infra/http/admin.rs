use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::{
    application::{error::AppError, favicon::FaviconLookup},
    domain::types::HeadSlot,
};

use super::{
    AdminState,
    middleware::{log_responses, set_request_context},
};

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_head/favicon", get(head_fragment))
        .route("/favicon", get(lookup))
        .route("/favicon/refresh", post(refresh))
        .route("/cache/invalidate", post(invalidate_cache))
        .route(
            "/settings/favicon-image",
            put(set_favicon_image).delete(clear_favicon_image),
        )
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Deserialize)]
struct FaviconImageForm {
    attachment_id: String,
}

async fn head_fragment(State(state): State<AdminState>) -> Html<String> {
    Html(state.favicon.head_markup(HeadSlot::Admin).await)
}

async fn lookup(State(state): State<AdminState>) -> Json<FaviconLookup> {
    Json(state.favicon.lookup().await)
}

async fn refresh(State(state): State<AdminState>) -> Json<FaviconLookup> {
    Json(state.favicon.refresh().await)
}

async fn invalidate_cache(State(state): State<AdminState>) -> Result<StatusCode, AppError> {
    state.favicon.clear_cache().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_favicon_image(
    State(state): State<AdminState>,
    Json(form): Json<FaviconImageForm>,
) -> Response {
    match state.uploads.set_upload(&form.attachment_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn clear_favicon_image(State(state): State<AdminState>) -> Result<StatusCode, AppError> {
    state.uploads.clear_upload().await?;
    Ok(StatusCode::NO_CONTENT)
}
