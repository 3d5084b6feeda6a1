use anyhow::Context;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{
    BackendError, BackendSuccess, BookId, ComplexBook, EmailRequest, LoginRequest,
    NewBookRequest, RegisterRequest, ResetPasswordRequest, SessionGranted, UpdateBookRequest,
    User,
};

#[derive(Debug, thiserror::Error)]
pub enum BackendClientError {
    #[error("Backend responded with {status}: {error:?}")]
    Backend {
        status: StatusCode,
        error: BackendError,
    },

    #[error("Backend responded with {0} and no error payload")]
    UnexpectedStatus(StatusCode),

    #[error("Request to backend failed {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Failed to decode backend response {0}")]
    Decode(#[source] reqwest::Error),
}

impl BackendClientError {
    /// Payload of the backend error, when the backend sent one
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            BackendClientError::Backend { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendClientError>;

/// Client of the bookshelf backend REST api.
/// Calls that act on behalf of a user take the session token and send it as a bearer token
pub struct BookshelfBackendClient {
    url: String,
    client: ClientWithMiddleware,
}

impl BookshelfBackendClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Calls GET /user/me
    pub async fn current_user(&self, session: &str) -> BackendResult<User> {
        let request = self.client.get(format!("{}/user/me", self.url));
        Self::fetch(request.bearer_auth(session)).await
    }

    /// Calls GET /books
    /// Returns the books of the user owning the session
    pub async fn list_books(&self, session: &str) -> BackendResult<Vec<ComplexBook>> {
        let request = self.client.get(format!("{}/books", self.url));
        Self::fetch(request.bearer_auth(session)).await
    }

    /// Calls POST /books
    /// Returns the created library entry
    pub async fn add_book(&self, session: &str, book: &NewBookRequest) -> BackendResult<ComplexBook> {
        let request = self.client.post(format!("{}/books", self.url)).json(book);
        Self::fetch(request.bearer_auth(session)).await
    }

    /// Calls PATCH /books/{book_id}
    pub async fn update_book(
        &self,
        session: &str,
        book_id: &BookId,
        update: &UpdateBookRequest,
    ) -> BackendResult<()> {
        let request = self
            .client
            .patch(format!("{}/books/{}", self.url, book_id))
            .json(update);
        Self::execute(request.bearer_auth(session)).await
    }

    /// Calls DELETE /books/{book_id}
    pub async fn remove_book(&self, session: &str, book_id: &BookId) -> BackendResult<()> {
        let request = self.client.delete(format!("{}/books/{}", self.url, book_id));
        Self::execute(request.bearer_auth(session)).await
    }

    /// Calls POST /auth/login
    /// Returns the session token granted by the backend
    pub async fn login(&self, credentials: &LoginRequest) -> BackendResult<SessionGranted> {
        let request = self
            .client
            .post(format!("{}/auth/login", self.url))
            .json(credentials);
        Self::fetch(request).await
    }

    /// Calls POST /auth/logout, the session is no longer valid afterwards
    pub async fn logout(&self, session: &str) -> BackendResult<()> {
        let request = self.client.post(format!("{}/auth/logout", self.url));
        Self::execute(request.bearer_auth(session)).await
    }

    /// Calls POST /auth/register
    pub async fn register(&self, registration: &RegisterRequest) -> BackendResult<()> {
        let request = self
            .client
            .post(format!("{}/auth/register", self.url))
            .json(registration);
        Self::execute(request).await
    }

    /// Calls POST /auth/request-reset
    pub async fn request_password_reset(&self, email: &EmailRequest) -> BackendResult<()> {
        let request = self
            .client
            .post(format!("{}/auth/request-reset", self.url))
            .json(email);
        Self::execute(request).await
    }

    /// Calls POST /auth/reset-password
    pub async fn reset_password(&self, reset: &ResetPasswordRequest) -> BackendResult<()> {
        let request = self
            .client
            .post(format!("{}/auth/reset-password", self.url))
            .json(reset);
        Self::execute(request).await
    }

    /// Calls POST /auth/resend-verification
    pub async fn resend_verification(&self, email: &EmailRequest) -> BackendResult<()> {
        let request = self
            .client
            .post(format!("{}/auth/resend-verification", self.url))
            .json(email);
        Self::execute(request).await
    }

    /// Calls GET /auth/verify-email?token={token}
    pub async fn verify_email(&self, token: &str) -> BackendResult<()> {
        let request = self
            .client
            .get(format!("{}/auth/verify-email", self.url))
            .query(&[("token", token)]);
        Self::execute(request).await
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
        let response = Self::checked(request).await?;
        let envelope: BackendSuccess<T> = response
            .json()
            .await
            .map_err(BackendClientError::Decode)?;
        Ok(envelope.data)
    }

    async fn execute(request: RequestBuilder) -> BackendResult<()> {
        Self::checked(request).await.map(|_| ())
    }

    async fn checked(request: RequestBuilder) -> BackendResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match response.json::<BackendError>().await {
            Ok(error) => Err(BackendClientError::Backend { status, error }),
            Err(_) => Err(BackendClientError::UnexpectedStatus(status)),
        }
    }
}
