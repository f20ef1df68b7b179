use axum::{
    Router,
    extract::State,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use crate::domain::types::HeadSlot;

use super::{
    HttpState,
    middleware::{log_responses, set_request_context},
};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/favicon.ico", get(favicon))
        .route("/_head/favicon", get(head_fragment))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn favicon(State(state): State<HttpState>) -> Response {
    let path = state.favicon.current_path().await;
    Redirect::temporary(&path).into_response()
}

async fn head_fragment(State(state): State<HttpState>) -> Html<String> {
    Html(state.favicon.head_markup(HeadSlot::Public).await)
}
