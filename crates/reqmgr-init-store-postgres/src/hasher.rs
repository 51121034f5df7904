// crates/reqmgr-init-store-postgres/src/hasher.rs
// ============================================================================
// Module: Bcrypt Password Hasher
// Description: Default password hashing primitive.
// Dependencies: bcrypt
// ============================================================================

//! Hashes use the `$2a$` variant so the requirements service, which verifies
//! logins with its own bcrypt implementation, accepts them unchanged.

use bcrypt::Version;
use reqmgr_init_core::HashError;
use reqmgr_init_core::PasswordHasher;

/// Work factor of produced hashes.
pub const BCRYPT_COST: u32 = 10;

/// Bcrypt hasher producing `$2a$` hashes.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    /// Work factor.
    cost: u32,
}

impl BcryptHasher {
    /// Creates a hasher with [`BCRYPT_COST`].
    #[must_use]
    pub const fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Creates a hasher with a custom work factor.
    #[must_use]
    pub const fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        bcrypt::hash_with_result(secret, self.cost)
            .map(|parts| parts.format_for_version(Version::TwoA))
            .map_err(|err| HashError::Hash(err.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        bcrypt::verify(secret, hash).map_err(|err| HashError::Verify(err.to_string()))
    }
}
