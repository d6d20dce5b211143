//! HTTP implementation of [`AccessApi`].
//!
//! Speaks the same JSON contracts the router serves. Refusals answered
//! with an error body become [`ClientError::Rejected`] carrying the
//! service's code; anything else is a [`TransportError`].

use crate::config::WebConfig;
use accessgate_auth::ConfigError;
use accessgate_core::api::{
    ACTION_PATH, ActionBody, ErrorBody, LOGIN_PATH, ListBody, ListResponse, LoginBody,
    LoginResponse, MessageResponse, REQUESTS_PATH, SUBMIT_PATH, SubmitBody,
};
use accessgate_core::{AccessRequest, RequestAction, RequestId, Session, TransportError};
use accessgate_runtime::{AccessApi, ClientError};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Client for a remote request service.
///
/// # Example
///
/// ```no_run
/// use accessgate_runtime::{ClientView, PollConfig};
/// use accessgate_core::environment::SystemClock;
/// use accessgate_web::{HttpAccessApi, WebConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = Arc::new(HttpAccessApi::new(WebConfig::from_env()?)?);
/// let session = api.login("code-from-redirect").await?;
/// let _view = ClientView::open(session, api, PollConfig::default(), Arc::new(SystemClock));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAccessApi {
    config: WebConfig,
    http_client: Client,
}

impl HttpAccessApi {
    /// Create a client honouring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the client cannot be built.
    pub fn new(config: WebConfig) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Exchange an authorization code for a session.
    ///
    /// # Errors
    ///
    /// [`ClientError::Rejected`] with `INVALID_CODE` or
    /// `NOT_A_PROJECT_MEMBER` when the service refuses the code.
    pub async fn login(&self, code: &str) -> Result<Session, ClientError> {
        let response: LoginResponse = self
            .post(
                LOGIN_PATH,
                &LoginBody {
                    code: code.to_string(),
                },
            )
            .await?;
        Ok(response.into())
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let response = self
            .http_client
            .post(self.config.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()).into());
        }

        let text = response.text().await.unwrap_or_default();
        tracing::debug!(%status, path, "Request service refused call");
        Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody { code, message }) => ClientError::Rejected { code, message },
            Err(_) => TransportError::Status {
                status: status.as_u16(),
                message: text,
            }
            .into(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else {
        TransportError::Network(err.to_string()).into()
    }
}

impl AccessApi for HttpAccessApi {
    async fn fetch_requests(&self, session: &Session) -> Result<Vec<AccessRequest>, ClientError> {
        let response: ListResponse = self.post(REQUESTS_PATH, &ListBody::from(session)).await?;
        Ok(response.requests)
    }

    async fn submit(&self, session: &Session, reason: &str) -> Result<String, ClientError> {
        let body = SubmitBody {
            username: session.username.clone(),
            reason: reason.to_string(),
        };
        let response: MessageResponse = self.post(SUBMIT_PATH, &body).await?;
        Ok(response.message)
    }

    async fn act(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> Result<String, ClientError> {
        let body = ActionBody {
            request_id,
            action,
            approved_by: session.username.clone(),
        };
        let response: MessageResponse = self.post(ACTION_PATH, &body).await?;
        Ok(response.message)
    }
}
