//! API Middleware
//!
//! Request logging and CORS

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;

/// The front-end is served from another origin
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Log method, path, status and latency of every request
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = started.elapsed().as_millis();
    if status.is_server_error() {
        log::warn!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed);
    } else {
        log::info!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed);
    }
    response
}
