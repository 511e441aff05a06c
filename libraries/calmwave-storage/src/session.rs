use crate::users::UserRepository;
use calmwave_core::{Result, Secret, User, UserId};

/// Signed-in account state held by the presentation layer
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the credential and, only on a match, load the account into the session.
    ///
    /// A miss or a storage failure leaves whatever was signed in before untouched.
    pub async fn sign_in(
        &mut self,
        users: &UserRepository,
        email: &str,
        credential: &Secret,
    ) -> Result<Option<UserId>> {
        let Some(user) = users.verify_login(email, credential).await? else {
            return Ok(None);
        };

        let id = user.id;
        self.current = Some(user);
        Ok(Some(id))
    }

    pub fn sign_out(&mut self) -> Option<User> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current.as_ref().map(|user| user.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }
}
