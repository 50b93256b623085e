// Authentication exchange against the auth service.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::api::{service_error, ApiClient, ApiError};
use crate::models::User;

/// Which auth action to submit. Registration additionally carries the
/// display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Register => "register",
        }
    }
}

/// A user paired with its opaque bearer token. Lives only in memory
/// for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    action: &'static str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthResponse {
    user: User,
    token: String,
}

impl ApiClient {
    /// Submit login or register credentials. The only local checks are
    /// required-field presence; everything else (email format, password
    /// rules, duplicate accounts) is the service's call.
    pub async fn authenticate(
        &self,
        mode: AuthMode,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthSession, ApiError> {
        if email.trim().is_empty() {
            return Err(ApiError::MissingInput("email"));
        }
        if password.is_empty() {
            return Err(ApiError::MissingInput("password"));
        }
        let name = match mode {
            AuthMode::Register => match name {
                Some(n) if !n.trim().is_empty() => Some(n),
                _ => return Err(ApiError::MissingInput("name")),
            },
            AuthMode::Login => None,
        };

        debug!("Submitting {} request for {}", mode.as_str(), email);
        let response = self
            .http()
            .post(self.auth_url())
            .json(&AuthRequest {
                action: mode.as_str(),
                email,
                password,
                name,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let body: AuthResponse = response.json().await?;
        info!("Authenticated as {} (user id {})", body.user.email, body.user.id);
        Ok(AuthSession {
            user: body.user,
            token: body.token,
        })
    }
}
