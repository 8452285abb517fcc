//! Refresh-token denylist. Only the SHA-256 hash of a revoked token is
//! stored, so a database leak does not expose usable tokens.

use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};

use crate::database::manager::DatabaseError;

/// Compute the SHA-256 hex digest of a refresh token
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Mark a refresh token as revoked. Revoking twice is a no-op.
pub async fn revoke(pool: &PgPool, token: &str) -> Result<(), DatabaseError> {
    sqlx::query("INSERT INTO token_denylist (token_hash) VALUES ($1) ON CONFLICT (token_hash) DO NOTHING")
        .bind(hash_refresh_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Check whether a refresh token has been revoked
pub async fn is_revoked(pool: &PgPool, token: &str) -> Result<bool, DatabaseError> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM token_denylist WHERE token_hash = $1) AS revoked")
        .bind(hash_refresh_token(token))
        .fetch_one(pool)
        .await?;
    let revoked: bool = row.try_get("revoked")?;
    Ok(revoked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex() {
        let a = hash_refresh_token("some-token");
        let b = hash_refresh_token("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_refresh_token("token-a"), hash_refresh_token("token-b"));
    }
}
