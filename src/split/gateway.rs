//! Request handling for the A/B split.
//!
//! Resolves the client's bucket from its cookie, fetches both upstream
//! variants and serves the rewritten document for that bucket.

use std::future::Future;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use hyper::{Request, Response, StatusCode};
use thiserror::Error;

use super::bucket::Assignment;
use super::rewrite::{rewrite, Theme};
use super::upstream::{discover, fetch_variants, Fetcher, UpstreamError};
use super::Bucket;

/// Failure while producing the variant document.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("variant discovery failed")]
    Discovery(#[source] UpstreamError),

    #[error("variant fetch failed")]
    Variant(#[source] UpstreamError),
}

impl GatewayError {
    fn upstream(&self) -> &UpstreamError {
        match self {
            GatewayError::Discovery(e) | GatewayError::Variant(e) => e,
        }
    }
}

/// Serves one of two rewritten upstream variants per request.
///
/// Holds no per-client state; the cookie is the only record of a
/// client's bucket.
pub struct SplitGateway {
    fetcher: Arc<dyn Fetcher>,
    discovery_url: String,
}

impl SplitGateway {
    /// Creates a gateway that discovers variants at `discovery_url`.
    pub fn new(fetcher: Arc<dyn Fetcher>, discovery_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            discovery_url: discovery_url.into(),
        }
    }

    /// Handles one inbound request.
    ///
    /// Only the `Cookie` header influences the response. The returned future
    /// does not borrow the request.
    pub fn handle<B>(&self, req: &Request<B>) -> impl Future<Output = Response<Full<Bytes>>> + '_ {
        // Cookie values may carry non-ASCII bytes from other cookies.
        let cookie = req
            .headers()
            .get(COOKIE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));
        let assignment = Assignment::resolve(cookie.as_deref(), &mut rand::thread_rng());
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        async move {
            let response = self.respond(assignment).await;

            tracing::info!(
                method = method.as_str(),
                path = path.as_str(),
                status = response.status().as_u16(),
                bucket = %assignment.bucket,
                assigned = assignment.is_new,
                "request completed"
            );

            response
        }
    }

    /// Builds the response for an already resolved assignment.
    ///
    /// `Set-Cookie` is added only for a new assignment and only when the
    /// variant was served.
    pub async fn respond(&self, assignment: Assignment) -> Response<Full<Bytes>> {
        match self.render(assignment.bucket).await {
            Ok(html) => html_response(html, assignment),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cause = %e.upstream(),
                    bucket = %assignment.bucket,
                    "upstream failure"
                );
                bad_gateway(&e)
            }
        }
    }

    /// Fetches both variants and rewrites the one served to `bucket`.
    async fn render(&self, bucket: Bucket) -> Result<String, GatewayError> {
        let source = discover(self.fetcher.as_ref(), &self.discovery_url)
            .await
            .map_err(GatewayError::Discovery)?;

        let pair = fetch_variants(self.fetcher.as_ref(), &source)
            .await
            .map_err(GatewayError::Variant)?;

        let document = pair.take(bucket);
        Ok(rewrite(&document.html, Theme::for_bucket(document.bucket)))
    }
}

fn html_response(html: String, assignment: Assignment) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(html)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

    if assignment.is_new {
        match HeaderValue::from_str(&assignment.bucket.set_cookie()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "invalid set-cookie value"),
        }
    }

    response
}

fn bad_gateway(error: &GatewayError) -> Response<Full<Bytes>> {
    let body = format!("bad gateway: {}", error);
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
