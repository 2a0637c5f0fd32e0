use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_update_not_empty;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table, minus the password hash which never leaves the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    // 'user' or 'admin'.
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Role
///
/// The closed set of roles a payload may assign. Anything else is rejected while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// UpdateUserRequest
///
/// Partial update payload for `PUT /api/users/{id}`. Only the fields listed here are
/// ever read from the body; anything else is dropped during decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate)]
#[validate(schema(function = "validate_update_not_empty"))]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        email(message = "Email must be a valid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    /// Trims the name, trims and lowercases the email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.map(|email| email.trim().to_lowercase()),
            role: self.role,
        }
    }

    pub fn changes_role(&self) -> bool {
        self.role.is_some()
    }
}

// --- Response Envelopes (Output) ---

/// UsersListResponse
///
/// Body of `GET /api/users`. `count` always equals `users.len()`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersListResponse {
    pub message: String,
    pub users: Vec<User>,
    pub count: usize,
}

/// UserResponse
///
/// Body of the single-user read and update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
