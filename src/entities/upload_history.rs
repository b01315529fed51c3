use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "upload_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_id: i32,

    /// Filename as the client supplied it. Unique per account (enforced by
    /// an index created in the initial migration).
    pub file_name: String,

    /// On-disk name (timestamp-prefixed). Absent for records created by the
    /// chart-metadata upsert without a prior upload.
    pub stored_name: Option<String>,

    pub upload_date: String,

    pub x_axis: String,

    pub y_axis: String,

    pub chart_type: ChartType,

    pub chart_download_url: String,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[sea_orm(string_value = "bar")]
    Bar,
    #[sea_orm(string_value = "line")]
    Line,
    #[sea_orm(string_value = "pie")]
    Pie,
    /// Placeholder for uploads with no chart selected yet.
    #[sea_orm(string_value = "-")]
    #[serde(rename = "-")]
    Unset,
}

impl ChartType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Unset => "-",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
