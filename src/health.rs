//! Liveness and readiness endpoints.
//!
//! Served on their own listener so that every path on the main listener
//! stays part of the A/B split.

use std::convert::Infallible;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use tokio::net::TcpListener;

use crate::server;

/// Returns 200 "ok" for `/healthz` and `/readyz`, 404 otherwise.
pub async fn health_handler<B>(req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (status, body) = match req.uri().path() {
        "/healthz" | "/readyz" => (StatusCode::OK, "ok"),
        _ => (StatusCode::NOT_FOUND, "not found"),
    };

    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    Ok(response)
}

/// Serves health checks on `listener` until accepting fails.
pub async fn start_health_server(listener: TcpListener) -> std::io::Result<()> {
    server::serve(listener, health_handler::<Incoming>).await
}
