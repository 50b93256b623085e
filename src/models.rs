use serde::Deserialize;

/// A user profile as returned by the auth and contacts services.
///
/// All identifiers are minted server-side; the client never creates or
/// mutates users, it only holds transient copies for display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A confirmed bidirectional contact of the session user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub added_at: Option<String>,
}

/// A pending incoming contact request. `request_id` is what gets sent
/// back when accepting or rejecting; `user_id` identifies the requester.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContactRequest {
    pub request_id: i64,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub created_at: Option<String>,
}

/// A pending outgoing request sent by the session user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentRequest {
    pub request_id: i64,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}
