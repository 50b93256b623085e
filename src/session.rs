// The session client: volatile authentication state plus the derived
// view caches (contacts, requests, search results), mutated only by the
// UI event handlers one operation at a time.

use log::{debug, info, warn};

use crate::api::{ApiClient, ApiError, AuthMode, AuthSession, Decision};
use crate::models::{Contact, ContactRequest, SentRequest, User};

/// In-memory state for one logged-in page session. Everything here is
/// lost when the process exits; the services own all persistent state.
///
/// Every mutating operation follows the same shape: issue the call, and
/// on success re-fetch whatever lists the mutation invalidated. Failed
/// calls change nothing locally.
pub struct Session {
    api: ApiClient,
    auth: Option<AuthSession>,
    contacts: Vec<Contact>,
    requests: Vec<ContactRequest>,
    sent_requests: Vec<SentRequest>,
    search_query: String,
    search_results: Vec<User>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Session {
            api,
            auth: None,
            contacts: Vec::new(),
            requests: Vec::new(),
            sent_requests: Vec::new(),
            search_query: String::new(),
            search_results: Vec::new(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.as_ref().map(|a| &a.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.token.as_str())
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn requests(&self) -> &[ContactRequest] {
        &self.requests
    }

    pub fn sent_requests(&self) -> &[SentRequest] {
        &self.sent_requests
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_results(&self) -> &[User] {
        &self.search_results
    }

    fn require_token(&self) -> Result<String, ApiError> {
        match &self.auth {
            Some(auth) => Ok(auth.token.clone()),
            None => Err(ApiError::NotAuthenticated),
        }
    }

    /// Log in or register. On success the token and profile are stored
    /// and the contact list is fetched once; on failure all prior state
    /// stays as it was.
    pub async fn authenticate(
        &mut self,
        mode: AuthMode,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<(), ApiError> {
        let auth = self.api.authenticate(mode, email, password, name).await?;
        info!("Session opened for {}", auth.user.email);
        self.auth = Some(auth);
        // Initial view state; a refresh failure here is not fatal to the
        // freshly opened session, the Contacts tab will retry on entry.
        if let Err(e) = self.refresh_contacts().await {
            warn!("Initial contact refresh failed: {}", e);
        }
        Ok(())
    }

    /// Discard the token and every cached view. Purely local.
    pub fn logout(&mut self) {
        if let Some(auth) = &self.auth {
            info!("Session closed for {}", auth.user.email);
        }
        self.auth = None;
        self.contacts.clear();
        self.requests.clear();
        self.sent_requests.clear();
        self.search_query.clear();
        self.search_results.clear();
    }

    /// Fetch the contact list and replace the cache wholesale.
    pub async fn refresh_contacts(&mut self) -> Result<(), ApiError> {
        let token = self.require_token()?;
        self.contacts = self.api.list_contacts(&token).await?;
        Ok(())
    }

    /// Fetch pending incoming requests and replace the cache wholesale.
    pub async fn refresh_requests(&mut self) -> Result<(), ApiError> {
        let token = self.require_token()?;
        self.requests = self.api.list_requests(&token).await?;
        Ok(())
    }

    /// Fetch the user's own pending outgoing requests.
    pub async fn refresh_sent_requests(&mut self) -> Result<(), ApiError> {
        let token = self.require_token()?;
        self.sent_requests = self.api.list_sent_requests(&token).await?;
        Ok(())
    }

    /// Run a user search. Blank input is silently ignored and issues no
    /// network call; otherwise the cached result set is replaced.
    pub async fn search(&mut self, query: &str) -> Result<(), ApiError> {
        if query.trim().is_empty() {
            debug!("Ignoring blank search query");
            return Ok(());
        }
        let token = self.require_token()?;
        let results = self.api.search(&token, query).await?;
        self.search_query = query.to_string();
        self.search_results = results;
        Ok(())
    }

    /// Send a contact request. Success completes the search workflow, so
    /// the query and results are cleared; failure leaves them intact.
    pub async fn send_request(&mut self, contact_email: &str) -> Result<(), ApiError> {
        let token = self.require_token()?;
        self.api.send_request(&token, contact_email).await?;
        self.search_query.clear();
        self.search_results.clear();
        Ok(())
    }

    /// Accept or reject a pending request, then re-fetch the pending
    /// list. Accepting also mutates the contact set server-side, so it
    /// additionally re-fetches contacts.
    pub async fn respond(&mut self, request_id: i64, decision: Decision) -> Result<(), ApiError> {
        let token = self.require_token()?;
        self.api.respond_request(&token, request_id, decision).await?;
        self.refresh_requests().await?;
        if decision == Decision::Accept {
            self.refresh_contacts().await?;
        }
        Ok(())
    }
}
