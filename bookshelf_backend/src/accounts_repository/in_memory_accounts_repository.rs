use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::accounts_repository::{
    validate_password_reset, validate_registration, AccountsRepository, AccountsRepositoryError,
    IssuedToken,
};
use crate::api::{LoginRequest, RegisterRequest, ResetPasswordRequest, User, UserId};

const TOKEN_LENGTH: usize = 32;

struct Account {
    user: User,
    // Plain text: this repository only backs local development and tests
    password: String,
}

/// Accounts, sessions and one-time tokens kept in process memory
#[derive(Default)]
pub struct InMemoryAccountsRepository {
    user_sequence_generator: AtomicI32,
    accounts: parking_lot::RwLock<HashMap<String, Account>>,
    sessions: parking_lot::RwLock<HashMap<String, UserId>>,
    verification_tokens: parking_lot::Mutex<HashMap<String, String>>,
    reset_tokens: parking_lot::Mutex<HashMap<String, String>>,
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryAccountsRepository {
    fn user_by_email(&self, email: &str) -> Result<User, AccountsRepositoryError> {
        self.accounts
            .read()
            .get(email)
            .map(|account| account.user.clone())
            .ok_or_else(|| AccountsRepositoryError::UserNotFound(email.to_string()))
    }

    fn issue_token(tokens: &parking_lot::Mutex<HashMap<String, String>>, user: User) -> IssuedToken {
        let token = generate_token();
        tokens.lock().insert(token.clone(), user.email.clone());
        IssuedToken { user, token }
    }
}

#[async_trait::async_trait]
impl AccountsRepository for InMemoryAccountsRepository {
    async fn register(
        &self,
        registration: RegisterRequest,
    ) -> Result<IssuedToken, AccountsRepositoryError> {
        validate_registration(&registration)?;
        let email = normalize_email(&registration.email);

        let user = {
            let mut locked_accounts = self.accounts.write();
            if locked_accounts.contains_key(&email) {
                return Err(AccountsRepositoryError::UserExists(email));
            }
            let user = User {
                id: self
                    .user_sequence_generator
                    .fetch_add(1, Ordering::Relaxed)
                    .to_string(),
                email: email.clone(),
                name: registration.name.trim().to_string(),
                email_verified: false,
            };
            locked_accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password: registration.password,
                },
            );
            user
        };

        Ok(Self::issue_token(&self.verification_tokens, user))
    }

    async fn issue_verification_token(
        &self,
        email: &str,
    ) -> Result<IssuedToken, AccountsRepositoryError> {
        let user = self.user_by_email(&normalize_email(email))?;
        Ok(Self::issue_token(&self.verification_tokens, user))
    }

    async fn verify_email(&self, token: &str) -> Result<User, AccountsRepositoryError> {
        let email = self
            .verification_tokens
            .lock()
            .remove(token)
            .ok_or(AccountsRepositoryError::InvalidToken)?;

        let mut locked_accounts = self.accounts.write();
        let account = locked_accounts
            .get_mut(&email)
            .ok_or(AccountsRepositoryError::InvalidToken)?;
        account.user.email_verified = true;
        Ok(account.user.clone())
    }

    async fn login(&self, credentials: LoginRequest) -> Result<String, AccountsRepositoryError> {
        let email = normalize_email(&credentials.email);
        let user_id = {
            let locked_accounts = self.accounts.read();
            let account = locked_accounts
                .get(&email)
                .filter(|account| account.password == credentials.password)
                .ok_or(AccountsRepositoryError::InvalidCredentials)?;
            if !account.user.email_verified {
                return Err(AccountsRepositoryError::EmailNotVerified(email));
            }
            account.user.id.clone()
        };

        let session = generate_token();
        self.sessions.write().insert(session.clone(), user_id);
        Ok(session)
    }

    async fn logout(&self, session: &str) -> Result<(), AccountsRepositoryError> {
        self.sessions
            .write()
            .remove(session)
            .map(|_| ())
            .ok_or(AccountsRepositoryError::Unauthorized)
    }

    async fn user_for_session(&self, session: &str) -> Result<User, AccountsRepositoryError> {
        let user_id = self
            .sessions
            .read()
            .get(session)
            .cloned()
            .ok_or(AccountsRepositoryError::Unauthorized)?;

        self.accounts
            .read()
            .values()
            .find(|account| account.user.id == user_id)
            .map(|account| account.user.clone())
            .ok_or(AccountsRepositoryError::Unauthorized)
    }

    async fn issue_reset_token(
        &self,
        email: &str,
    ) -> Result<Option<IssuedToken>, AccountsRepositoryError> {
        match self.user_by_email(&normalize_email(email)) {
            Ok(user) => Ok(Some(Self::issue_token(&self.reset_tokens, user))),
            Err(AccountsRepositoryError::UserNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn reset_password(
        &self,
        reset: ResetPasswordRequest,
    ) -> Result<(), AccountsRepositoryError> {
        validate_password_reset(&reset)?;
        let email = self
            .reset_tokens
            .lock()
            .remove(&reset.token)
            .ok_or(AccountsRepositoryError::InvalidToken)?;

        let mut locked_accounts = self.accounts.write();
        let account = locked_accounts
            .get_mut(&email)
            .ok_or(AccountsRepositoryError::InvalidToken)?;
        account.password = reset.password;
        Ok(())
    }
}
