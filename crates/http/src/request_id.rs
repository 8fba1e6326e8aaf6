//! Exposes the `x-request-id` of the request being handled to code that has
//! no access to the request, such as [`AppError`](crate::error::AppError)
//! rendering.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::request_id::RequestId;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Middleware running the rest of the stack with the request id in scope.
/// Must sit inside `SetRequestIdLayer`.
pub async fn scope_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_owned);

    match request_id {
        Some(id) => REQUEST_ID.scope(id, next.run(request)).await,
        None => next.run(request).await,
    }
}

/// Request id of the current request, if called within [`scope_request_id`]
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}
