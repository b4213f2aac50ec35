use axum::http::StatusCode;

/// Handler for GET /
pub async fn home() -> &'static str {
    "Stateless auth service"
}

/// Fallback for paths without a route. Only reached once the gate has
/// let the request through.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
