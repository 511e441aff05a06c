//! Credential hashing with bcrypt

use calmwave_core::{CatalogError, Result, Secret};

/// Result of checking a credential against its stored form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Matched a bcrypt hash
    Match,
    /// Matched a row still holding a cleartext credential; the caller should rehash it
    LegacyMatch,
    Mismatch,
}

impl Verification {
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a credential with a fresh salt
    pub async fn hash(&self, secret: &Secret) -> Result<String> {
        let secret = secret.clone();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(secret.expose(), cost))
            .await
            .map_err(|e| CatalogError::Credential(e.to_string()))?
            .map_err(|e| CatalogError::Credential(e.to_string()))
    }

    /// Check `secret` against the stored column value
    pub async fn verify(&self, secret: &Secret, stored: &str) -> Result<Verification> {
        if secret.is_empty() || stored.is_empty() {
            return Ok(Verification::Mismatch);
        }

        if !is_bcrypt_hash(stored) {
            // rows written before hashing was introduced
            return Ok(if constant_time_eq(secret.expose().as_bytes(), stored.as_bytes()) {
                Verification::LegacyMatch
            } else {
                Verification::Mismatch
            });
        }

        let secret = secret.clone();
        let stored = stored.to_string();

        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(secret.expose(), &stored))
            .await
            .map_err(|e| CatalogError::Credential(e.to_string()))?
            .map_err(|e| CatalogError::Credential(e.to_string()))?;

        Ok(if matched {
            Verification::Match
        } else {
            Verification::Mismatch
        })
    }
}

impl CredentialHasher {
    /// Spend one bcrypt round at this hasher's cost when there is no stored hash to check.
    /// Always a mismatch.
    pub async fn verify_absent(&self, secret: &Secret) -> Result<Verification> {
        self.hash(secret).await?;
        Ok(Verification::Mismatch)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.len() == 60
        && ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| stored.starts_with(prefix))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
