use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::accounts::{self, AccountStatus, Role};

/// Account data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            status: model.status,
            avatar: model.avatar,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a new account. Returns `None` when the email is already taken.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        config: &SecurityConfig,
    ) -> Result<Option<Account>> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash),
            role: Set(role),
            status: Set(AccountStatus::Active),
            avatar: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(Account::from(model))),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err).context("Failed to insert account"),
        }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Verify credentials where `identity` may be a username or an email.
    /// Returns the account on success, `None` on unknown identity or wrong
    /// password. Argon2 verification runs under `spawn_blocking` because it
    /// is CPU-intensive and would stall the async runtime.
    pub async fn verify_credentials(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Username.eq(identity))
                    .add(accounts::Column::Email.eq(identity.to_lowercase())),
            )
            .one(&self.conn)
            .await
            .context("Failed to query account for login")?;

        let Some(account) = account else {
            return Ok(None);
        };

        let password_hash = account.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| Account::from(account)))
    }

    /// Verify the stored password for a known account ID.
    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        let password_hash = account.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }

    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Whether another account (different ID) already uses this email.
    pub async fn email_in_use_by_other(&self, email: &str, excluding_id: i32) -> Result<bool> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .filter(accounts::Column::Id.ne(excluding_id))
            .count(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(count > 0)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    /// Update display name and email. Returns `false` when the account is
    /// gone, `None`-style duplicate handling is the caller's job via
    /// [`Self::email_in_use_by_other`].
    pub async fn update_profile(&self, id: i32, username: &str, email: &str) -> Result<bool> {
        let Some(account) = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for profile update")?
        else {
            return Ok(false);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.username = Set(username.to_string());
        active.email = Set(email.to_lowercase());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn set_avatar(&self, id: i32, avatar_url: &str) -> Result<bool> {
        let Some(account) = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for avatar update")?
        else {
            return Ok(false);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.avatar = Set(Some(avatar_url.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn set_status(&self, id: i32, status: AccountStatus) -> Result<Option<Account>> {
        let Some(account) = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for status update")?
        else {
            return Ok(None);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(status);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(Account::from(updated)))
    }

    pub async fn set_role(&self, id: i32, role: Role) -> Result<bool> {
        let Some(account) = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for role update")?
        else {
            return Ok(false);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.role = Set(role);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = accounts::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = accounts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete account")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        accounts::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count accounts")
    }

    pub async fn count_by_status(&self, status: AccountStatus) -> Result<u64> {
        accounts::Entity::find()
            .filter(accounts::Column::Status.eq(status))
            .count(&self.conn)
            .await
            .context("Failed to count accounts by status")
    }
}

/// Hash a password using Argon2id with the configured parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let config = SecurityConfig::default();
        let hash = hash_password("hunter2", &config).unwrap();

        assert!(verify_hash("hunter2", &hash).unwrap());
        assert!(!verify_hash("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let config = SecurityConfig::default();
        let a = hash_password("same-password", &config).unwrap();
        let b = hash_password("same-password", &config).unwrap();
        assert_ne!(a, b);
    }
}
