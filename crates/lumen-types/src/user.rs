//! User identity types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// How an identity was first established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Email magic link
    MagicLink,
    /// Google OAuth
    Google,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MagicLink => write!(f, "magic_link"),
            Self::Google => write!(f, "google"),
        }
    }
}

/// An authenticated user identity
///
/// This is the shape carried inside session tokens, so fields here are
/// part of the token format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub id: UserId,
    /// Normalized (lower-cased) email address
    pub email: String,
    /// Display name shown in the UI
    pub display_name: String,
    /// Provider the identity originated from
    pub origin_provider: AuthProvider,
}

impl Identity {
    /// Create a fresh identity for a first-seen email
    pub fn new(email: impl Into<String>, provider: AuthProvider) -> Self {
        let email = email.into();
        // Default display name is the local part of the address
        let display_name = email.split('@').next().unwrap_or(&email).to_string();
        Self {
            id: UserId::new(),
            email,
            display_name,
            origin_provider: provider,
        }
    }
}

/// Normalize an email address for lookup and token binding
///
/// Lower-cases and trims surrounding whitespace. Identities are keyed
/// by this form everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
