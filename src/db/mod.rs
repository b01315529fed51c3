use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::accounts::{AccountStatus, Role};
use crate::entities::upload_history::{self, ChartType};

pub mod migrator;
pub mod repositories;

pub use repositories::account::Account;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn upload_repo(&self) -> repositories::upload::UploadRepository {
        repositories::upload::UploadRepository::new(self.conn.clone())
    }

    // ========== Accounts ==========

    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        config: &SecurityConfig,
    ) -> Result<Option<Account>> {
        self.account_repo()
            .create(username, email, password, role, config)
            .await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().find_by_email(email).await
    }

    pub async fn verify_credentials(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        self.account_repo()
            .verify_credentials(identity, password)
            .await
    }

    pub async fn verify_account_password(&self, id: i32, password: &str) -> Result<bool> {
        self.account_repo().verify_password(id, password).await
    }

    pub async fn update_account_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.account_repo()
            .update_password(id, new_password, config)
            .await
    }

    pub async fn email_in_use_by_other(&self, email: &str, excluding_id: i32) -> Result<bool> {
        self.account_repo()
            .email_in_use_by_other(email, excluding_id)
            .await
    }

    pub async fn update_account_profile(
        &self,
        id: i32,
        username: &str,
        email: &str,
    ) -> Result<bool> {
        self.account_repo().update_profile(id, username, email).await
    }

    pub async fn set_account_avatar(&self, id: i32, avatar_url: &str) -> Result<bool> {
        self.account_repo().set_avatar(id, avatar_url).await
    }

    pub async fn set_account_status(
        &self,
        id: i32,
        status: AccountStatus,
    ) -> Result<Option<Account>> {
        self.account_repo().set_status(id, status).await
    }

    pub async fn set_account_role(&self, id: i32, role: Role) -> Result<bool> {
        self.account_repo().set_role(id, role).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list().await
    }

    pub async fn remove_account(&self, id: i32) -> Result<bool> {
        self.account_repo().remove(id).await
    }

    pub async fn count_accounts(&self) -> Result<u64> {
        self.account_repo().count_all().await
    }

    pub async fn count_accounts_by_status(&self, status: AccountStatus) -> Result<u64> {
        self.account_repo().count_by_status(status).await
    }

    // ========== Upload history ==========

    pub async fn record_upload(
        &self,
        account_id: i32,
        file_name: &str,
        stored_name: &str,
    ) -> Result<Option<upload_history::Model>> {
        self.upload_repo()
            .record(account_id, file_name, stored_name)
            .await
    }

    pub async fn find_upload_by_owner_and_name(
        &self,
        account_id: i32,
        file_name: &str,
    ) -> Result<Option<upload_history::Model>> {
        self.upload_repo()
            .find_by_owner_and_name(account_id, file_name)
            .await
    }

    pub async fn upsert_chart_metadata(
        &self,
        account_id: i32,
        file_name: &str,
        x_axis: &str,
        y_axis: &str,
        chart_type: ChartType,
        chart_download_url: &str,
    ) -> Result<upload_history::Model> {
        self.upload_repo()
            .upsert_chart(
                account_id,
                file_name,
                x_axis,
                y_axis,
                chart_type,
                chart_download_url,
            )
            .await
    }

    pub async fn get_upload_with_owner(
        &self,
        id: i32,
    ) -> Result<Option<(upload_history::Model, Option<Account>)>> {
        self.upload_repo().get_with_owner(id).await
    }

    pub async fn list_uploads_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<(upload_history::Model, Option<Account>)>> {
        self.upload_repo().list_for_account(account_id).await
    }

    pub async fn list_all_uploads(
        &self,
    ) -> Result<Vec<(upload_history::Model, Option<Account>)>> {
        self.upload_repo().list_all().await
    }

    pub async fn remove_upload(&self, id: i32) -> Result<bool> {
        self.upload_repo().remove(id).await
    }

    pub async fn count_uploads(&self) -> Result<u64> {
        self.upload_repo().count_all().await
    }

    pub async fn count_uploads_by_chart_type(&self) -> Result<Vec<(ChartType, i64)>> {
        self.upload_repo().count_by_chart_type().await
    }

    pub async fn count_uploads_by_chart_type_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<(ChartType, i64)>> {
        self.upload_repo()
            .count_by_chart_type_for_account(account_id)
            .await
    }
}
