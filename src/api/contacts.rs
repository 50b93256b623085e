// Contacts service exchanges: list/requests/sent fetches, user search,
// and the contact-request workflow (send, accept/reject).

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::api::{service_error, ApiClient, ApiError, TOKEN_HEADER};
use crate::models::{Contact, ContactRequest, SentRequest, User};

/// How to resolve a pending incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }
}

#[derive(Deserialize)]
struct ContactsResponse {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Deserialize)]
struct RequestsResponse {
    #[serde(default)]
    requests: Vec<ContactRequest>,
}

#[derive(Deserialize)]
struct SentRequestsResponse {
    #[serde(default)]
    sent_requests: Vec<SentRequest>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<User>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    action: &'static str,
    query: &'a str,
}

#[derive(Serialize)]
struct SendRequestBody<'a> {
    action: &'static str,
    contact_email: &'a str,
}

#[derive(Serialize)]
struct HandleRequestBody {
    action: &'static str,
    request_id: i64,
    decision: &'static str,
}

impl ApiClient {
    async fn fetch(&self, token: &str, action: &str) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http()
            .get(self.contacts_url())
            .query(&[("action", action)])
            .header(TOKEN_HEADER, token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        Ok(response)
    }

    /// Fetch the full contact list, newest first as ordered by the service.
    pub async fn list_contacts(&self, token: &str) -> Result<Vec<Contact>, ApiError> {
        let body: ContactsResponse = self.fetch(token, "list").await?.json().await?;
        debug!("Fetched {} contacts", body.contacts.len());
        Ok(body.contacts)
    }

    /// Fetch all pending incoming contact requests.
    pub async fn list_requests(&self, token: &str) -> Result<Vec<ContactRequest>, ApiError> {
        let body: RequestsResponse = self.fetch(token, "requests").await?.json().await?;
        debug!("Fetched {} pending requests", body.requests.len());
        Ok(body.requests)
    }

    /// Fetch the session user's own pending outgoing requests.
    pub async fn list_sent_requests(&self, token: &str) -> Result<Vec<SentRequest>, ApiError> {
        let body: SentRequestsResponse = self.fetch(token, "sent").await?.json().await?;
        debug!("Fetched {} sent requests", body.sent_requests.len());
        Ok(body.sent_requests)
    }

    /// Search users by name or email substring. An empty result set is a
    /// valid outcome, not an error.
    pub async fn search(&self, token: &str, query: &str) -> Result<Vec<User>, ApiError> {
        let response = self
            .http()
            .post(self.contacts_url())
            .header(TOKEN_HEADER, token)
            .json(&SearchRequest {
                action: "search",
                query,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let body: SearchResponse = response.json().await?;
        debug!("Search for {:?} returned {} users", query, body.results.len());
        Ok(body.results)
    }

    /// Ask the service to create a pending request towards `contact_email`.
    pub async fn send_request(&self, token: &str, contact_email: &str) -> Result<(), ApiError> {
        let response = self
            .http()
            .post(self.contacts_url())
            .header(TOKEN_HEADER, token)
            .json(&SendRequestBody {
                action: "send_request",
                contact_email,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        info!("Contact request sent to {}", contact_email);
        Ok(())
    }

    /// Resolve a pending incoming request. Accepting makes the service
    /// create the reciprocal contact pair; rejecting discards it.
    pub async fn respond_request(
        &self,
        token: &str,
        request_id: i64,
        decision: Decision,
    ) -> Result<(), ApiError> {
        let response = self
            .http()
            .post(self.contacts_url())
            .header(TOKEN_HEADER, token)
            .json(&HandleRequestBody {
                action: "handle_request",
                request_id,
                decision: decision.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        info!("Request {} resolved: {}", request_id, decision.as_str());
        Ok(())
    }
}
