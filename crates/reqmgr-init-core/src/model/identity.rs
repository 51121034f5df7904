// crates/reqmgr-init-core/src/model/identity.rs
// ============================================================================
// Module: Administrator Identity
// Description: Fixed administrator identity and bootstrap secret policy.
// Purpose: Keep the seeded identity and its secret rules in one place.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! The initializer seeds exactly one identity. Its username, email, and role
//! are fixed; only the password comes from the operator, through the
//! `DEFAULT_ADMIN_PASSWORD` environment variable.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";
/// Email of the seeded administrator.
pub const ADMIN_EMAIL: &str = "admin@localhost";
/// Environment variable carrying the administrator bootstrap secret.
pub const ADMIN_PASSWORD_ENV: &str = "DEFAULT_ADMIN_PASSWORD";
/// Minimum accepted length of the bootstrap secret, in characters.
pub const MIN_ADMIN_PASSWORD_LENGTH: usize = 8;

/// Roles known to the requirements service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Full access.
    Administrator,
    /// Regular author.
    User,
    /// Read and comment only.
    Commenter,
}

impl Role {
    /// Returns the stored label of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::User => "User",
            Self::Commenter => "Commenter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity created by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    /// Generated row identifier.
    pub id: Uuid,
    /// Username, always [`ADMIN_USERNAME`].
    pub username: String,
    /// Email, always [`ADMIN_EMAIL`].
    pub email: String,
    /// Role, always [`Role::Administrator`].
    pub role: Role,
}

impl AdminIdentity {
    /// Builds the fixed administrator identity for a stored row id.
    #[must_use]
    pub fn seeded(id: Uuid) -> Self {
        Self {
            id,
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: Role::Administrator,
        }
    }
}

/// Checks a bootstrap secret against the length policy.
///
/// # Errors
///
/// Returns a human-readable reason when the secret is empty or shorter than
/// [`MIN_ADMIN_PASSWORD_LENGTH`] characters.
pub fn check_admin_secret(secret: &str) -> Result<(), String> {
    if secret.is_empty() {
        return Err(format!("{ADMIN_PASSWORD_ENV} must not be empty"));
    }
    if secret.chars().count() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(format!(
            "{ADMIN_PASSWORD_ENV} must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters long"
        ));
    }
    Ok(())
}
