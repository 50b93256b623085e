// HTTP layer for the rolodex client.
// Contains the ApiClient plus one impl file per remote service.

pub mod auth;
pub mod contacts;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub use auth::{AuthMode, AuthSession};
pub use contacts::Decision;

/// Errors from a request/response exchange with the auth or contacts
/// service. Nothing here is retried; callers surface the message to the
/// user and move on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent, or the response body could not be
    /// read or parsed as JSON.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the request and said why.
    #[error("{0}")]
    Service(String),

    /// Non-success status without a usable `{error}` body.
    #[error("server returned {0}")]
    Status(StatusCode),

    /// A required field was left empty. The only validation done locally.
    #[error("{0} is required")]
    MissingInput(&'static str),

    /// An operation needing a token was attempted while logged out.
    #[error("not logged in")]
    NotAuthenticated,
}

/// Client for the two remote endpoints. Holds no session state; the
/// token travels as a parameter so the session layer stays the single
/// owner of authentication state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    auth_url: String,
    contacts_url: String,
}

/// Header carrying the opaque bearer token on contacts-service calls.
pub const TOKEN_HEADER: &str = "X-User-Token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiClient {
    pub fn new(auth_url: &str, contacts_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        ApiClient {
            http,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            contacts_url: contacts_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn contacts_url(&self) -> &str {
        &self.contacts_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Turn a non-success response into an error, preferring the service's
/// own `{error}` message over the bare status code.
pub(crate) async fn service_error(response: Response) -> ApiError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            error: Some(message),
        }) => ApiError::Service(message),
        _ => ApiError::Status(status),
    }
}
