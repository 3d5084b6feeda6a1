//! Server actions: one backend or catalog call each, always answered with an
//! [`ActionResponse`](crate::api::ActionResponse).

use std::sync::Arc;

use bookshelf_backend::api::BackendErrorCode;
use bookshelf_backend::client::BookshelfBackendClient;

use crate::api::{ActionResponse, SessionToken};
use crate::google_books::GoogleBooksClient;

mod auth;
mod books;
mod search;
mod user;

pub use auth::{LOGIN_ERRORS, REGISTER_ERRORS};
pub use books::{ADD_BOOK_ERRORS, GET_MY_BOOKS_ERRORS, REMOVE_BOOK_ERRORS, UPDATE_BOOK_ERRORS};
pub use search::SEARCH_FAILED_MESSAGE;

pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "User authentication required.";

/// Actions executed on behalf of one visitor, identified by its session if any
#[derive(Clone)]
pub struct ServerActions {
    backend: Arc<BookshelfBackendClient>,
    google_books: Arc<GoogleBooksClient>,
    session: Option<SessionToken>,
}

impl ServerActions {
    pub fn new(backend: Arc<BookshelfBackendClient>, google_books: Arc<GoogleBooksClient>) -> Self {
        Self {
            backend,
            google_books,
            session: None,
        }
    }

    pub fn with_session(&self, session: Option<SessionToken>) -> Self {
        Self {
            session,
            ..self.clone()
        }
    }

    pub fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    fn require_session<T>(&self) -> Result<&SessionToken, ActionResponse<T>> {
        self.session.as_ref().ok_or_else(|| {
            ActionResponse::error(
                AUTHENTICATION_REQUIRED_MESSAGE,
                BackendErrorCode::Unauthorized.as_str(),
            )
        })
    }
}
