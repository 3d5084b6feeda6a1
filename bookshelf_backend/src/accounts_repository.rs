pub use in_memory_accounts_repository::InMemoryAccountsRepository;

use crate::api::{LoginRequest, RegisterRequest, ResetPasswordRequest, User};

mod in_memory_accounts_repository;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum AccountsRepositoryError {
    #[error("User with email {0} already exists")]
    UserExists(String),

    #[error("User with email {0} not found")]
    UserNotFound(String),

    #[error("Invalid account data: {}", .0.join(", "))]
    InvalidData(Vec<String>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email {0} not verified")]
    EmailNotVerified(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Session not found")]
    Unauthorized,
}

/// A freshly issued one-time token together with the account it belongs to
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
}

#[async_trait::async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Creates an unverified account, returns the email verification token
    async fn register(&self, registration: RegisterRequest)
        -> Result<IssuedToken, AccountsRepositoryError>;
    /// Issues a new email verification token for an existing account
    async fn issue_verification_token(&self, email: &str)
        -> Result<IssuedToken, AccountsRepositoryError>;
    /// Marks the account owning the token as verified, the token is consumed
    async fn verify_email(&self, token: &str) -> Result<User, AccountsRepositoryError>;
    /// Checks the credentials and opens a session, returns the session token
    async fn login(&self, credentials: LoginRequest) -> Result<String, AccountsRepositoryError>;
    /// Closes the session
    async fn logout(&self, session: &str) -> Result<(), AccountsRepositoryError>;
    /// Resolves the user owning the session
    async fn user_for_session(&self, session: &str) -> Result<User, AccountsRepositoryError>;
    /// Issues a password reset token, None when no account uses the email
    async fn issue_reset_token(&self, email: &str)
        -> Result<Option<IssuedToken>, AccountsRepositoryError>;
    /// Sets a new password for the account owning the reset token, the token is consumed
    async fn reset_password(&self, reset: ResetPasswordRequest)
        -> Result<(), AccountsRepositoryError>;
}

fn password_problems(password: &str, confirm_password: &str) -> Vec<String> {
    let mut problems = vec![];
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if password != confirm_password {
        problems.push("Passwords do not match".to_string());
    }
    problems
}

/// Checks the registration form the way the backend does
pub fn validate_registration(registration: &RegisterRequest) -> Result<(), AccountsRepositoryError> {
    let mut problems = vec![];
    if registration.name.trim().is_empty() {
        problems.push("Name is required".to_string());
    }
    if !registration.email.contains('@') {
        problems.push("Email is invalid".to_string());
    }
    problems.extend(password_problems(
        &registration.password,
        &registration.confirm_password,
    ));

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AccountsRepositoryError::InvalidData(problems))
    }
}

pub fn validate_password_reset(reset: &ResetPasswordRequest) -> Result<(), AccountsRepositoryError> {
    let problems = password_problems(&reset.password, &reset.confirm_password);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AccountsRepositoryError::InvalidData(problems))
    }
}
