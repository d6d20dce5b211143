//! Correlation id middleware.
//!
//! Each request gets a correlation id: the one sent in `X-Correlation-ID`
//! if it parses as a UUID, a fresh v4 otherwise. The id is stored in the
//! request extensions, recorded on an `http_request` span wrapping the
//! handler, and echoed back in the response header.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/requests", post(list))
//!     .layer(correlation_id_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation id tracking to all requests.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;

            if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response
                    .headers_mut()
                    .insert(CORRELATION_ID_HEADER, header_value);
            }

            Ok(response)
        })
    }
}

/// Read the correlation id stored by [`correlation_id_layer`].
pub trait CorrelationIdExt {
    /// Correlation id, or `None` if the middleware is not installed.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl CorrelationIdExt for Request {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/echo",
                get(|req: Request<Body>| async move {
                    req.correlation_id()
                        .map(|id| id.to_string())
                        .unwrap_or_default()
                }),
            )
            .layer(correlation_id_layer())
    }

    fn response_id(response: &Response) -> String {
        response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation id header present")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn generates_id_when_missing() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert!(Uuid::parse_str(&response_id(&response)).is_ok());
    }

    #[tokio::test]
    async fn preserves_caller_id() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri("/health")
            .header(CORRELATION_ID_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response_id(&response), id.to_string());
    }

    #[tokio::test]
    async fn replaces_malformed_id() {
        let request = Request::builder()
            .uri("/health")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let id = response_id(&response);
        assert_ne!(id, "not-a-uuid");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn handlers_see_the_echoed_id() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri("/echo")
            .header(CORRELATION_ID_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, id.to_string().as_bytes());
    }
}
