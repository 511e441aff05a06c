/// User domain types
use crate::secret::Secret;
use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Developer account as read back from storage.
///
/// The stored credential hash is never part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier
    pub id: UserId,

    /// Login handle (`nome_usuario`)
    pub username: String,

    /// Display name (`nome_completo`)
    pub full_name: String,

    /// Phone number (`telefone`)
    pub phone: String,

    /// Email address, unique across accounts
    pub email: String,

    /// Role discriminator (`tipo_dev`)
    pub developer_type: i32,
}

/// Payload for registering a user or overwriting every field of an existing one
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    /// Login handle
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Phone number, may be empty
    pub phone: String,
    /// Email address used to log in
    pub email: String,
    /// Cleartext credential; storage keeps only its hash
    pub credential: Secret,
    /// Role discriminator, 0 when omitted
    #[serde(default)]
    pub developer_type: i32,
}

impl NewUser {
    /// Create a payload with an empty credential and the default role
    pub fn new(
        username: impl Into<String>,
        full_name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            phone: phone.into(),
            email: email.into(),
            credential: Secret::default(),
            developer_type: 0,
        }
    }

    /// Set the credential
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<Secret>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Set the role discriminator
    #[must_use]
    pub fn with_developer_type(mut self, developer_type: i32) -> Self {
        self.developer_type = developer_type;
        self
    }

    /// Reject payloads storage would accept but the catalog cannot use
    pub fn validate(&self) -> crate::Result<()> {
        if self.username.trim().is_empty() {
            return Err(crate::CatalogError::invalid_input("username must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(crate::CatalogError::invalid_input(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        if self.credential.is_empty() {
            return Err(crate::CatalogError::invalid_input("credential must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_credential_and_role() {
        let user = NewUser::new("ana", "Ana Lima", "555-0101", "ana@example.com")
            .with_credential("pw")
            .with_developer_type(2);

        assert_eq!(user.credential.expose(), "pw");
        assert_eq!(user.developer_type, 2);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let base = NewUser::new("ana", "Ana Lima", "555-0101", "ana@example.com");
        assert!(base.validate().is_err(), "empty credential");

        let bad_email = NewUser::new("ana", "Ana", "1", "not-an-email").with_credential("pw");
        assert!(bad_email.validate().is_err());

        let blank_name = NewUser::new("  ", "Ana", "1", "a@b.c").with_credential("pw");
        assert!(blank_name.validate().is_err());
    }
}
