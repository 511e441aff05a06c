//! User accounts and login verification

use crate::connection::ConnectionManager;
use crate::credentials::{CredentialHasher, Verification};
use crate::statement::{Gateway, Statement};
use calmwave_core::{CatalogError, NewUser, Outcome, Result, Secret, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// CRUD over `desenvolvedores`
#[derive(Debug, Clone)]
pub struct UserRepository {
    manager: ConnectionManager,
    hasher: CredentialHasher,
}

impl UserRepository {
    pub fn new(manager: ConnectionManager, hasher: CredentialHasher) -> Self {
        Self { manager, hasher }
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Register a new account, returning its storage-assigned id.
    ///
    /// A second account with the same email fails with `CatalogError::Duplicate`.
    pub async fn register(&self, user: &NewUser) -> Result<UserId> {
        user.validate()?;
        let hash = self.hasher.hash(&user.credential).await?;

        let mut lease = self.manager.acquire().await?;
        let id = insert(&mut lease.gateway(), user, &hash).await?;

        tracing::info!(user_id = %id, "user registered");
        Ok(id)
    }

    /// Find the account for `email` and check `credential` against it.
    ///
    /// `Ok(None)` means no such account or a wrong credential; it is not an error.
    /// An unknown email costs the same hashing work as a wrong credential.
    pub async fn verify_login(&self, email: &str, credential: &Secret) -> Result<Option<User>> {
        if credential.is_empty() {
            tracing::debug!("login rejected: empty credential");
            return Ok(None);
        }

        let mut lease = self.manager.acquire().await?;
        let mut gateway = lease.gateway();

        let Some(row) = gateway
            .fetch_optional(&Statement::new(SELECT_LOGIN_BY_EMAIL).bind(email))
            .await?
        else {
            drop(lease);
            self.hasher.verify_absent(credential).await?;
            tracing::debug!("login rejected: unknown email");
            return Ok(None);
        };

        let stored: String = row.try_get("senha")?;
        let user = user_from_row(&row)?;

        match self.hasher.verify(credential, &stored).await? {
            Verification::Match => Ok(Some(user)),
            Verification::LegacyMatch => {
                // upgrade the cleartext column in place
                let hash = self.hasher.hash(credential).await?;
                gateway
                    .execute(&Statement::new(UPDATE_CREDENTIAL).bind(hash).bind(user.id))
                    .await?;
                tracing::info!(user_id = %user.id, "legacy credential rehashed");
                Ok(Some(user))
            }
            Verification::Mismatch => {
                tracing::debug!(user_id = %user.id, "login rejected: credential mismatch");
                Ok(None)
            }
        }
    }

    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        let mut lease = self.manager.acquire().await?;
        get_by_id(&mut lease.gateway(), id).await
    }

    /// Overwrite every field of an existing account
    pub async fn update(&self, id: UserId, user: &NewUser) -> Result<Outcome> {
        user.validate()?;
        let hash = self.hasher.hash(&user.credential).await?;

        let mut lease = self.manager.acquire().await?;
        let done = lease
            .gateway()
            .execute(
                &Statement::new(UPDATE_USER)
                    .bind(user.username.as_str())
                    .bind(user.full_name.as_str())
                    .bind(user.phone.as_str())
                    .bind(user.email.as_str())
                    .bind(hash)
                    .bind(user.developer_type)
                    .bind(id),
            )
            .await?;

        Ok(Outcome::from_rows_affected(done.rows_affected))
    }

    /// Physically delete an account
    pub async fn delete(&self, id: UserId) -> Result<Outcome> {
        let mut lease = self.manager.acquire().await?;
        let done = lease
            .gateway()
            .execute(&Statement::new(DELETE_USER).bind(id))
            .await?;

        let outcome = Outcome::from_rows_affected(done.rows_affected);
        tracing::info!(user_id = %id, ?outcome, "user delete");
        Ok(outcome)
    }

    /// Every account, in storage order
    pub async fn list(&self) -> Result<Vec<User>> {
        let mut lease = self.manager.acquire().await?;
        let rows = lease
            .gateway()
            .fetch_all(&Statement::new(SELECT_ALL_USERS))
            .await?;

        rows.iter().map(user_from_row).collect()
    }
}

const INSERT_USER: &str = "INSERT INTO desenvolvedores \
     (nome_usuario, nome_completo, telefone, email, senha, tipo_dev) \
     VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_LOGIN_BY_EMAIL: &str = "SELECT id_dev, nome_usuario, nome_completo, telefone, email, senha, tipo_dev \
     FROM desenvolvedores WHERE email = ?";

const SELECT_USER_BY_ID: &str = "SELECT id_dev, nome_usuario, nome_completo, telefone, email, tipo_dev \
     FROM desenvolvedores WHERE id_dev = ?";

const SELECT_ALL_USERS: &str =
    "SELECT id_dev, nome_usuario, nome_completo, telefone, email, tipo_dev FROM desenvolvedores";

const UPDATE_USER: &str = "UPDATE desenvolvedores \
     SET nome_usuario = ?, nome_completo = ?, telefone = ?, email = ?, senha = ?, tipo_dev = ? \
     WHERE id_dev = ?";

const UPDATE_CREDENTIAL: &str = "UPDATE desenvolvedores SET senha = ? WHERE id_dev = ?";

const DELETE_USER: &str = "DELETE FROM desenvolvedores WHERE id_dev = ?";

pub(crate) async fn insert(gateway: &mut Gateway<'_>, user: &NewUser, hash: &str) -> Result<UserId> {
    let done = gateway
        .execute(
            &Statement::new(INSERT_USER)
                .bind(user.username.as_str())
                .bind(user.full_name.as_str())
                .bind(user.phone.as_str())
                .bind(user.email.as_str())
                .bind(hash)
                .bind(user.developer_type),
        )
        .await?;

    if done.rows_affected != 1 {
        return Err(CatalogError::statement(format!(
            "user insert affected {} rows",
            done.rows_affected
        )));
    }

    Ok(UserId::new(done.last_insert_id))
}

pub(crate) async fn get_by_id(gateway: &mut Gateway<'_>, id: UserId) -> Result<Option<User>> {
    gateway
        .fetch_optional(&Statement::new(SELECT_USER_BY_ID).bind(id))
        .await?
        .as_ref()
        .map(user_from_row)
        .transpose()
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id_dev")?,
        username: row.try_get("nome_usuario")?,
        full_name: row.try_get("nome_completo")?,
        phone: row.try_get("telefone")?,
        email: row.try_get("email")?,
        developer_type: row.try_get("tipo_dev")?,
    })
}
