use serde::{Deserialize, Serialize};

use crate::db::Account;
use crate::entities::accounts::{AccountStatus, Role};
use crate::entities::upload_history::{self, ChartType};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// Wire DTOs stay camelCase: the API serves the same JSON contract the
// original JavaScript frontend consumes.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            status: account.status,
            avatar: account.avatar,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadOwnerDto {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<Account> for UploadOwnerDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AxesDto {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDto {
    pub id: i32,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_name: Option<String>,
    pub upload_date: String,
    pub selected_axes: AxesDto,
    pub chart_type: ChartType,
    pub chart_download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UploadOwnerDto>,
}

impl UploadDto {
    #[must_use]
    pub fn from_record(record: upload_history::Model, owner: Option<Account>) -> Self {
        Self {
            id: record.id,
            file_name: record.file_name,
            stored_name: record.stored_name,
            upload_date: record.upload_date,
            selected_axes: AxesDto {
                x: record.x_axis,
                y: record.y_axis,
            },
            chart_type: record.chart_type,
            chart_download_url: record.chart_download_url,
            user: owner.map(UploadOwnerDto::from),
        }
    }
}

impl From<upload_history::Model> for UploadDto {
    fn from(record: upload_history::Model) -> Self {
        Self::from_record(record, None)
    }
}
