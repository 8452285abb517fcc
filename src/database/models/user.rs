use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Compact user shape embedded in auth responses
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
        }
    }
}

/// Full user shape returned by `/usuarios` (staff only)
#[derive(Debug, Clone, Serialize)]
pub struct UserDetailResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDetailResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Staff-managed user creation/update via `/usuarios`
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Validate username format and requirements
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() < 3 {
        return Err("Username must be at least 3 characters".to_string());
    }
    if username.len() > 150 {
        return Err("Username must be less than 150 characters".to_string());
    }
    // Allow alphanumeric, underscore, hyphen
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err("Username can only contain letters, numbers, underscore, and hyphen".to_string());
    }
    // Must start with alphanumeric
    if !username.chars().next().unwrap().is_alphanumeric() {
        return Err("Username must start with a letter or number".to_string());
    }
    Ok(())
}

/// Basic email format check
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("ghoulia").is_ok());
        assert!(validate_username("ghoulia_y-2").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("_leading").is_err());
        assert!(validate_username("spa ce").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("ghoulia@monsterhigh.edu").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing.local").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("").is_err());
    }
}
