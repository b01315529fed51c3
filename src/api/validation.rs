use std::sync::LazyLock;

use regex::Regex;

use super::ApiError;
use crate::entities::accounts::{AccountStatus, Role};
use crate::entities::upload_history::ChartType;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email regex")
});

/// Reject empty (or whitespace-only) required fields.
pub fn require_field<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::validation("Please enter a valid email address"));
    }
    Ok(email)
}

pub fn parse_chart_type(value: &str) -> Result<ChartType, ApiError> {
    match value {
        "bar" => Ok(ChartType::Bar),
        "line" => Ok(ChartType::Line),
        "pie" => Ok(ChartType::Pie),
        "-" => Ok(ChartType::Unset),
        _ => Err(ApiError::validation(format!("Invalid chart type: {value}"))),
    }
}

pub fn parse_role(value: &str) -> Result<Role, ApiError> {
    match value {
        "user" => Ok(Role::User),
        "admin" => Ok(Role::Admin),
        _ => Err(ApiError::validation("Invalid role")),
    }
}

pub fn parse_status(value: &str) -> Result<AccountStatus, ApiError> {
    match value {
        "active" => Ok(AccountStatus::Active),
        "blocked" => Ok(AccountStatus::Blocked),
        _ => Err(ApiError::validation("Invalid status value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("username", " bob ").unwrap(), "bob");
        assert!(require_field("username", "").is_err());
        assert!(require_field("username", "   ").is_err());
    }

    #[test]
    fn test_parse_chart_type() {
        assert_eq!(parse_chart_type("bar").unwrap(), ChartType::Bar);
        assert_eq!(parse_chart_type("-").unwrap(), ChartType::Unset);
        assert!(parse_chart_type("scatter").is_err());
    }

    #[test]
    fn test_parse_role_and_status() {
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
        assert!(parse_role("root").is_err());
        assert_eq!(parse_status("blocked").unwrap(), AccountStatus::Blocked);
        assert!(parse_status("suspended").is_err());
    }
}
