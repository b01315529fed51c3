use crate::entities::prelude::*;
use crate::entities::upload_history;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Built by hand instead of from the entity: there is deliberately no
        // foreign key on account_id, so deleting an account leaves its
        // ledger rows in place.
        manager
            .create_table(
                Table::create()
                    .table(UploadHistory)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(upload_history::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(upload_history::Column::StoredName).string())
                    .col(
                        ColumnDef::new(upload_history::Column::UploadDate)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::XAxis)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::YAxis)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::ChartType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(upload_history::Column::ChartDownloadUrl)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One ledger entry per (owner, original filename). The upload handler
        // also checks before inserting; this index is the backstop for
        // concurrent identical uploads.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_upload_history_account_file")
                    .table(UploadHistory)
                    .col(upload_history::Column::AccountId)
                    .col(upload_history::Column::FileName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UploadHistory).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
