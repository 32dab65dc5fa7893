//! User model
//!
//! Defines the User entity and related types for the Listly backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
///
/// Accounts start unverified; `email_verified_at` is set when the
/// verification token is consumed. `verification_token` doubles as the
/// password-reset token and is cleared on every successful consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// When the email was verified; None means unverified
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Single-use verification/reset token
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    /// Stored profile picture path (relative)
    pub profile_picture: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            role,
            email_verified_at: None,
            verification_token: None,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the account's email address has been verified
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - moderates listings and categories
    Admin,
    /// Regular account - owns listings
    User,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for registering a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_is_unverified() {
        let user = User::new(
            "Test User".to_string(),
            "test@example.com".to_string(),
            "hashed_password".to_string(),
            UserRole::User,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.name, "Test User");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_verified());
        assert!(user.verification_token.is_none());
        assert!(user.profile_picture.is_none());
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new(
            "Admin".to_string(),
            "admin@test.com".to_string(),
            "hash".to_string(),
            UserRole::Admin,
        );
        let user = User::new(
            "User".to_string(),
            "user@test.com".to_string(),
            "hash".to_string(),
            UserRole::User,
        );

        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_is_verified() {
        let mut user = User::new(
            "User".to_string(),
            "user@test.com".to_string(),
            "hash".to_string(),
            UserRole::User,
        );
        assert!(!user.is_verified());

        user.email_verified_at = Some(Utc::now());
        assert!(user.is_verified());
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::User.to_string(), "user");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("ADMIN").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("user").unwrap(), UserRole::User);
        assert!(UserRole::from_str("editor").is_err());
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "User".to_string(),
            "user@test.com".to_string(),
            "super_secret_hash".to_string(),
            UserRole::User,
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("super_secret_hash"));
        assert!(!json.contains("password_hash"));
    }
}
