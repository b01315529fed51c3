use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::account::{Account, is_unique_violation};
use crate::entities::prelude::*;
use crate::entities::upload_history::{self, ChartType};

const AXIS_PLACEHOLDER: &str = "-";

pub struct UploadRepository {
    conn: DatabaseConnection,
}

impl UploadRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a ledger entry for a fresh upload with placeholder chart
    /// metadata. Returns `None` when the (owner, filename) pair already
    /// exists — either found by the caller's pre-check or surfaced by the
    /// unique index when two identical uploads race.
    pub async fn record(
        &self,
        account_id: i32,
        file_name: &str,
        stored_name: &str,
    ) -> Result<Option<upload_history::Model>> {
        let active = upload_history::ActiveModel {
            account_id: Set(account_id),
            file_name: Set(file_name.to_string()),
            stored_name: Set(Some(stored_name.to_string())),
            upload_date: Set(chrono::Utc::now().to_rfc3339()),
            x_axis: Set(AXIS_PLACEHOLDER.to_string()),
            y_axis: Set(AXIS_PLACEHOLDER.to_string()),
            chart_type: Set(ChartType::Unset),
            chart_download_url: Set(String::new()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err).context("Failed to insert upload record"),
        }
    }

    pub async fn find_by_owner_and_name(
        &self,
        account_id: i32,
        file_name: &str,
    ) -> Result<Option<upload_history::Model>> {
        UploadHistory::find()
            .filter(upload_history::Column::AccountId.eq(account_id))
            .filter(upload_history::Column::FileName.eq(file_name))
            .one(&self.conn)
            .await
            .context("Failed to query upload by owner and filename")
    }

    /// Replace the chart selection on the (owner, filename) entry, creating
    /// it when absent. The upload date is refreshed either way; concurrent
    /// calls for the same key are last-write-wins.
    pub async fn upsert_chart(
        &self,
        account_id: i32,
        file_name: &str,
        x_axis: &str,
        y_axis: &str,
        chart_type: ChartType,
        chart_download_url: &str,
    ) -> Result<upload_history::Model> {
        if let Some(existing) = self.find_by_owner_and_name(account_id, file_name).await? {
            return self
                .replace_chart(existing, x_axis, y_axis, chart_type, chart_download_url)
                .await;
        }

        let active = upload_history::ActiveModel {
            account_id: Set(account_id),
            file_name: Set(file_name.to_string()),
            stored_name: Set(None),
            upload_date: Set(chrono::Utc::now().to_rfc3339()),
            x_axis: Set(x_axis.to_string()),
            y_axis: Set(y_axis.to_string()),
            chart_type: Set(chart_type),
            chart_download_url: Set(chart_download_url.to_string()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(model),
            // Lost a race against a concurrent upsert for the same key;
            // last write wins.
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_by_owner_and_name(account_id, file_name)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Upload record vanished during upsert"))?;
                self.replace_chart(existing, x_axis, y_axis, chart_type, chart_download_url)
                    .await
            }
            Err(err) => Err(err).context("Failed to insert chart metadata"),
        }
    }

    async fn replace_chart(
        &self,
        existing: upload_history::Model,
        x_axis: &str,
        y_axis: &str,
        chart_type: ChartType,
        chart_download_url: &str,
    ) -> Result<upload_history::Model> {
        let mut active: upload_history::ActiveModel = existing.into();
        active.x_axis = Set(x_axis.to_string());
        active.y_axis = Set(y_axis.to_string());
        active.chart_type = Set(chart_type);
        active.chart_download_url = Set(chart_download_url.to_string());
        active.upload_date = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;
        Ok(model)
    }

    pub async fn get_with_owner(
        &self,
        id: i32,
    ) -> Result<Option<(upload_history::Model, Option<Account>)>> {
        let row = UploadHistory::find_by_id(id)
            .find_also_related(Accounts)
            .one(&self.conn)
            .await
            .context("Failed to query upload by ID")?;

        Ok(row.map(|(upload, owner)| (upload, owner.map(Account::from))))
    }

    pub async fn list_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<(upload_history::Model, Option<Account>)>> {
        let rows = UploadHistory::find()
            .filter(upload_history::Column::AccountId.eq(account_id))
            .find_also_related(Accounts)
            .order_by_desc(upload_history::Column::UploadDate)
            .all(&self.conn)
            .await
            .context("Failed to list uploads for account")?;

        Ok(rows
            .into_iter()
            .map(|(upload, owner)| (upload, owner.map(Account::from)))
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<(upload_history::Model, Option<Account>)>> {
        let rows = UploadHistory::find()
            .find_also_related(Accounts)
            .order_by_desc(upload_history::Column::UploadDate)
            .all(&self.conn)
            .await
            .context("Failed to list all uploads")?;

        Ok(rows
            .into_iter()
            .map(|(upload, owner)| (upload, owner.map(Account::from)))
            .collect())
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = UploadHistory::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete upload record")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        UploadHistory::find()
            .count(&self.conn)
            .await
            .context("Failed to count uploads")
    }

    /// Upload counts grouped by chart type, across all accounts.
    pub async fn count_by_chart_type(&self) -> Result<Vec<(ChartType, i64)>> {
        UploadHistory::find()
            .select_only()
            .column(upload_history::Column::ChartType)
            .column_as(upload_history::Column::Id.count(), "count")
            .group_by(upload_history::Column::ChartType)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate uploads by chart type")
    }

    /// Upload counts grouped by chart type for one account.
    pub async fn count_by_chart_type_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<(ChartType, i64)>> {
        UploadHistory::find()
            .filter(upload_history::Column::AccountId.eq(account_id))
            .select_only()
            .column(upload_history::Column::ChartType)
            .column_as(upload_history::Column::Id.count(), "count")
            .group_by(upload_history::Column::ChartType)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate account uploads by chart type")
    }
}
