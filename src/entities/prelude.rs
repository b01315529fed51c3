pub use super::accounts::Entity as Accounts;
pub use super::upload_history::Entity as UploadHistory;
