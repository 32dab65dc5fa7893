//! User service
//!
//! Business logic for account management:
//! - Registration with email verification
//! - Authentication with distinct failure reasons
//! - Verify / password-reset token flows (single-use tokens)
//! - Profile updates and profile pictures
//!
//! Token issuance is NOT done here; callers hand an authenticated user to
//! the `TokenService`. Emails are dispatched fire-and-forget: a failed
//! send never rolls back the write that preceded it.

use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::UserRepository;
use crate::models::{RegisterInput, User, UserRole};
use crate::services::email::EmailService;
use crate::services::images::{ImageStore, ImageStoreError};
use crate::services::password::{hash_password, verify_password};

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User already exists.")]
    EmailExists,

    /// No account with that email
    #[error("Email doesn't exist")]
    EmailNotFound,

    /// Account exists but the email is unverified
    #[error("Please verify your email before logging in.")]
    EmailUnverified,

    /// Password mismatch
    #[error("Password is incorrect.")]
    InvalidPassword,

    /// Verification/reset token mismatch
    #[error("Invalid or expired token.")]
    InvalidToken,

    /// Account already verified
    #[error("Account is already verified.")]
    AlreadyVerified,

    /// Account not found by id
    #[error("User not found")]
    NotFound,

    /// Image upload rejected or failed
    #[error(transparent)]
    Image(#[from] ImageStoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service
pub struct UserService {
    users: Arc<dyn UserRepository>,
    email: Arc<EmailService>,
    images: Arc<ImageStore>,
}

impl UserService {
    /// Create a new user service
    pub fn new(
        users: Arc<dyn UserRepository>,
        email: Arc<EmailService>,
        images: Arc<ImageStore>,
    ) -> Self {
        Self {
            users,
            email,
            images,
        }
    }

    /// Register a new account.
    ///
    /// Rejects duplicate emails, stores a salted hash (never the
    /// plaintext), generates a single-use verification token, and
    /// dispatches the verification email in the background.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        if input.name.trim().is_empty()
            || input.email.trim().is_empty()
            || input.password.is_empty()
        {
            return Err(UserServiceError::ValidationError(
                "Name, email, and password are required.".to_string(),
            ));
        }

        if self
            .users
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::EmailExists);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let verification_token = Uuid::new_v4().to_string();

        let mut user = User::new(input.name, input.email, password_hash, UserRole::User);
        user.verification_token = Some(verification_token.clone());

        let created = self
            .users
            .create(&user)
            .await
            .context("Failed to create user")?;

        // Fire-and-forget; a failed send does not roll back the account
        self.email
            .clone()
            .dispatch_verification_email(created.email.clone(), verification_token);

        Ok(created)
    }

    /// Authenticate credentials, failing distinctly for unknown email,
    /// unverified account, and password mismatch.
    ///
    /// Success returns the account; issuing a token is the caller's job.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::EmailNotFound)?;

        if !user.is_verified() {
            return Err(UserServiceError::EmailUnverified);
        }

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::InvalidPassword);
        }

        Ok(user)
    }

    /// Consume a verification token. The token must match exactly and the
    /// account must be currently unverified; a second attempt reports
    /// "already verified".
    pub async fn verify_email(&self, email: &str, token: &str) -> Result<(), UserServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::EmailNotFound)?;

        if user.is_verified() {
            return Err(UserServiceError::AlreadyVerified);
        }

        let verified = self
            .users
            .verify_email(email, token)
            .await
            .context("Failed to verify email")?;

        if verified {
            Ok(())
        } else {
            Err(UserServiceError::InvalidToken)
        }
    }

    /// Generate and store a new single-use reset token and dispatch the
    /// reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), UserServiceError> {
        let token = Uuid::new_v4().to_string();

        let stored = self
            .users
            .set_verification_token(email, &token)
            .await
            .context("Failed to store reset token")?;

        if !stored {
            return Err(UserServiceError::EmailNotFound);
        }

        self.email
            .clone()
            .dispatch_password_reset_email(email.to_string(), token);

        Ok(())
    }

    /// Consume a reset token: re-hash and store the new password, clearing
    /// the token.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password is required.".to_string(),
            ));
        }

        let password_hash =
            hash_password(new_password).context("Failed to hash password")?;

        let reset = self
            .users
            .reset_password(email, token, &password_hash)
            .await
            .context("Failed to reset password")?;

        if reset {
            Ok(())
        } else {
            Err(UserServiceError::InvalidToken)
        }
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .users
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Get a user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    /// List accounts with the `user` role
    pub async fn list_members(&self) -> Result<Vec<User>, UserServiceError> {
        let users = self
            .users
            .list_members()
            .await
            .context("Failed to list users")?;

        Ok(users)
    }

    /// Resolve a stored profile-picture path to an absolute URL, with the
    /// placeholder fallback when the file is absent.
    pub fn profile_picture_url(&self, picture: Option<&str>) -> String {
        self.images.profile_picture_url(picture)
    }

    /// Update name and email, rejecting an email already used by another
    /// account.
    pub async fn update_profile(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
    ) -> Result<(), UserServiceError> {
        if name.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "name is required".to_string(),
            ));
        }
        if email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "email is required".to_string(),
            ));
        }

        if let Some(existing) = self
            .users
            .get_by_email(email)
            .await
            .context("Failed to check email")?
        {
            if existing.id != user_id {
                return Err(UserServiceError::EmailExists);
            }
        }

        let updated = self
            .users
            .update_profile(user_id, name, email)
            .await
            .context("Failed to update profile")?;

        if updated {
            Ok(())
        } else {
            Err(UserServiceError::NotFound)
        }
    }

    /// Store a new profile picture and point the account at it, deleting
    /// the previously stored file after the row update.
    pub async fn update_profile_picture(
        &self,
        user_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, UserServiceError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        let stored = self.images.store_profile_picture(filename, bytes).await?;

        let updated = self
            .users
            .update_profile_picture(user_id, &stored)
            .await
            .context("Failed to update profile picture")?;
        if !updated {
            return Err(UserServiceError::NotFound);
        }

        // Old file goes away only after the row points at the new one
        if let Some(old_path) = user.profile_picture {
            if let Err(e) = self.images.delete(&old_path).await {
                tracing::warn!(user_id, "Failed to delete replaced profile picture: {}", e);
            }
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmailConfig, UploadConfig};
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use tempfile::TempDir;

    struct Fixture {
        service: UserService,
        users: Arc<dyn UserRepository>,
        images: Arc<ImageStore>,
        _pool: DynDatabasePool,
        _dir: TempDir,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload = UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 1024 * 1024,
        };
        let images = Arc::new(ImageStore::new(&upload, "http://localhost:5067"));

        // SMTP host left empty: sends are logged no-ops
        let email = Arc::new(EmailService::new(EmailConfig::default()));

        let users = SqlxUserRepository::boxed(pool.clone());
        let service = UserService::new(users.clone(), email, images.clone());

        Fixture {
            service,
            users,
            images,
            _pool: pool,
            _dir: dir,
        }
    }

    fn register_input() -> RegisterInput {
        RegisterInput::new("A", "a@x.com", "secret")
    }

    async fn register_and_verify(fixture: &Fixture) -> User {
        let user = fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");
        let token = user
            .verification_token
            .clone()
            .expect("Token should be set");
        fixture
            .service
            .verify_email(&user.email, &token)
            .await
            .expect("Failed to verify");
        user
    }

    #[tokio::test]
    async fn test_register_creates_unverified_user_with_token() {
        let fixture = setup().await;

        let user = fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");

        assert!(user.id > 0);
        assert!(!user.is_verified());
        assert!(user.verification_token.is_some());
        assert_eq!(user.role, UserRole::User);
        // Plaintext is never stored
        assert_ne!(user.password_hash, "secret");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let fixture = setup().await;

        fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");

        let result = fixture
            .service
            .register(RegisterInput::new("B", "a@x.com", "other"))
            .await;
        assert!(matches!(result, Err(UserServiceError::EmailExists)));

        // No second record was created
        let members = fixture.users.list_members().await.expect("Failed to list");
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn test_register_validates_required_fields() {
        let fixture = setup().await;

        let result = fixture
            .service
            .register(RegisterInput::new("", "a@x.com", "secret"))
            .await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_before_verification_reports_unverified() {
        let fixture = setup().await;
        fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");

        // Correct password, but the account is unverified: the failure must
        // be "unverified", not "password incorrect"
        let result = fixture.service.authenticate("a@x.com", "secret").await;
        assert!(matches!(result, Err(UserServiceError::EmailUnverified)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let fixture = setup().await;

        let result = fixture.service.authenticate("ghost@x.com", "secret").await;
        assert!(matches!(result, Err(UserServiceError::EmailNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let fixture = setup().await;
        register_and_verify(&fixture).await;

        let result = fixture.service.authenticate("a@x.com", "wrong").await;
        assert!(matches!(result, Err(UserServiceError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_authenticate_success_after_verification() {
        let fixture = setup().await;
        register_and_verify(&fixture).await;

        let user = fixture
            .service
            .authenticate("a@x.com", "secret")
            .await
            .expect("Should authenticate");
        assert_eq!(user.email, "a@x.com");
        assert!(user.is_verified());
    }

    #[tokio::test]
    async fn test_verify_email_wrong_token_leaves_unverified() {
        let fixture = setup().await;
        fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");

        let result = fixture
            .service
            .verify_email("a@x.com", "not-the-token")
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidToken)));

        let user = fixture
            .service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists");
        assert!(!user.is_verified());
    }

    #[tokio::test]
    async fn test_verify_email_second_attempt_reports_already_verified() {
        let fixture = setup().await;
        let user = fixture
            .service
            .register(register_input())
            .await
            .expect("Failed to register");
        let token = user.verification_token.clone().expect("Token set");

        fixture
            .service
            .verify_email("a@x.com", &token)
            .await
            .expect("First verify should succeed");

        let result = fixture.service.verify_email("a@x.com", &token).await;
        assert!(matches!(result, Err(UserServiceError::AlreadyVerified)));
    }

    #[tokio::test]
    async fn test_request_password_reset_stores_new_token() {
        let fixture = setup().await;
        register_and_verify(&fixture).await;

        fixture
            .service
            .request_password_reset("a@x.com")
            .await
            .expect("Failed to request reset");

        let user = fixture
            .service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists");
        assert!(user.verification_token.is_some());
    }

    #[tokio::test]
    async fn test_request_password_reset_unknown_email() {
        let fixture = setup().await;

        let result = fixture.service.request_password_reset("ghost@x.com").await;
        assert!(matches!(result, Err(UserServiceError::EmailNotFound)));
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let fixture = setup().await;
        register_and_verify(&fixture).await;

        fixture
            .service
            .request_password_reset("a@x.com")
            .await
            .expect("Failed to request reset");
        let token = fixture
            .service
            .get_by_email("a@x.com")
            .await
            .expect("Failed to get")
            .expect("User exists")
            .verification_token
            .expect("Token stored");

        fixture
            .service
            .reset_password("a@x.com", &token, "new-secret")
            .await
            .expect("Reset should succeed");

        // Old password no longer authenticates, new one does
        assert!(matches!(
            fixture.service.authenticate("a@x.com", "secret").await,
            Err(UserServiceError::InvalidPassword)
        ));
        fixture
            .service
            .authenticate("a@x.com", "new-secret")
            .await
            .expect("New password should authenticate");

        // Token was single-use
        let result = fixture
            .service
            .reset_password("a@x.com", &token, "another")
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_wrong_token() {
        let fixture = setup().await;
        register_and_verify(&fixture).await;
        fixture
            .service
            .request_password_reset("a@x.com")
            .await
            .expect("Failed to request reset");

        let result = fixture
            .service
            .reset_password("a@x.com", "bogus", "new-secret")
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidToken)));

        // Stored password is unchanged
        fixture
            .service
            .authenticate("a@x.com", "secret")
            .await
            .expect("Old password still valid");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let fixture = setup().await;
        let user = register_and_verify(&fixture).await;
        fixture
            .service
            .register(RegisterInput::new("B", "b@x.com", "secret"))
            .await
            .expect("Failed to register");

        let result = fixture
            .service
            .update_profile(user.id, "A Renamed", "b@x.com")
            .await;
        assert!(matches!(result, Err(UserServiceError::EmailExists)));
    }

    #[tokio::test]
    async fn test_update_profile_allows_keeping_own_email() {
        let fixture = setup().await;
        let user = register_and_verify(&fixture).await;

        fixture
            .service
            .update_profile(user.id, "A Renamed", "a@x.com")
            .await
            .expect("Keeping own email should be allowed");

        let updated = fixture
            .service
            .get_by_id(user.id)
            .await
            .expect("Failed to get")
            .expect("User exists");
        assert_eq!(updated.name, "A Renamed");
    }

    #[tokio::test]
    async fn test_update_profile_picture_replaces_old_file() {
        let fixture = setup().await;
        let user = register_and_verify(&fixture).await;

        let first = fixture
            .service
            .update_profile_picture(user.id, "one.jpg", b"first")
            .await
            .expect("Failed to set picture");
        assert!(fixture.images.exists(&first));

        let second = fixture
            .service
            .update_profile_picture(user.id, "two.png", b"second")
            .await
            .expect("Failed to replace picture");

        assert!(fixture.images.exists(&second));
        assert!(!fixture.images.exists(&first));

        let updated = fixture
            .service
            .get_by_id(user.id)
            .await
            .expect("Failed to get")
            .expect("User exists");
        assert_eq!(updated.profile_picture.as_deref(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn test_update_profile_picture_rejects_bad_extension() {
        let fixture = setup().await;
        let user = register_and_verify(&fixture).await;

        let result = fixture
            .service
            .update_profile_picture(user.id, "script.sh", b"#!/bin/sh")
            .await;
        assert!(matches!(result, Err(UserServiceError::Image(_))));
    }
}
