//! Custom Axum extractors.

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;

/// JSON request body whose rejections answer `{code, message}`.
///
/// Plain [`Json`] rejects malformed bodies with a text response, which
/// clients cannot tell apart from a proxy failure. Every rejection here
/// is a 400 `BAD_REQUEST` error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Correlation id of the current request.
///
/// Taken from the extensions set by
/// [`correlation_id_layer`](crate::middleware::correlation_id_layer), then
/// from the `X-Correlation-ID` header, else freshly generated.
///
/// ```ignore
/// async fn handler(correlation_id: CorrelationId) -> String {
///     format!("Request ID: {}", correlation_id.0)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn extract(request: Request<()>) -> CorrelationId {
        let (mut parts, ()) = request.into_parts();
        CorrelationId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn extension_wins_over_header() {
        let stored = Uuid::new_v4();
        let mut request = Request::builder()
            .header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string())
            .body(())
            .unwrap();
        request.extensions_mut().insert(stored);

        assert_eq!(extract(request).await, CorrelationId(stored));
    }

    #[tokio::test]
    async fn falls_back_to_header() {
        let sent = Uuid::new_v4();
        let request = Request::builder()
            .header(CORRELATION_ID_HEADER, sent.to_string())
            .body(())
            .unwrap();

        assert_eq!(extract(request).await, CorrelationId(sent));
    }

    #[tokio::test]
    async fn json_body_accepts_valid_json() {
        let request = json_request(r#"{"name":"alice"}"#);
        let JsonBody(named) = JsonBody::<Named>::from_request(request, &()).await.unwrap();
        assert_eq!(named.name, "alice");
    }

    #[tokio::test]
    async fn json_body_rejects_with_error_code() {
        for body in [r#"{"name":"#, r#"{"other":1}"#] {
            let err = JsonBody::<Named>::from_request(json_request(body), &())
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), "BAD_REQUEST");
            assert!(!err.message().is_empty());
        }
    }

    #[tokio::test]
    async fn json_body_requires_content_type() {
        let request = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"name":"alice"}"#))
            .unwrap();
        let err = JsonBody::<Named>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
