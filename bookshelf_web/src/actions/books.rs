use bookshelf_backend::api::{BackendErrorCode, BookId, ComplexBook, ReadStatus, UpdateBookRequest};

use crate::actions::ServerActions;
use crate::api::{ActionResponse, SimpleBook};
use crate::error_normalizer::{handle_api_error, ErrorHandlerOptions, ErrorMapping};
use crate::parallel_action::ParallelAction;

pub const GET_MY_BOOKS_ERRORS: ErrorMapping =
    ErrorMapping::new(&[(BackendErrorCode::NotFound, "User not found.")]);

pub const ADD_BOOK_ERRORS: ErrorMapping = ErrorMapping::new(&[
    (BackendErrorCode::InvalidData, "Invalid book data provided."),
    (
        BackendErrorCode::IsbnAlreadyExist,
        "You already have a book with this ISBN in your library.",
    ),
]);

pub const REMOVE_BOOK_ERRORS: ErrorMapping =
    ErrorMapping::new(&[(BackendErrorCode::NotFound, "This book was not found.")]);

pub const UPDATE_BOOK_ERRORS: ErrorMapping =
    ErrorMapping::new(&[(BackendErrorCode::NotFound, "This book was not found.")]);

const GET_MY_BOOKS: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error getting books").with_mapping(GET_MY_BOOKS_ERRORS);
const ADD_BOOK: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error adding book").with_mapping(ADD_BOOK_ERRORS);
const REMOVE_BOOK: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error removing book").with_mapping(REMOVE_BOOK_ERRORS);
const UPDATE_BOOK: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error updating book").with_mapping(UPDATE_BOOK_ERRORS);

impl ServerActions {
    /// Library of the session owner
    pub fn get_my_books(&self) -> ParallelAction<'_, ActionResponse<Vec<ComplexBook>>> {
        ParallelAction::new(async move {
            let session = match self.require_session() {
                Ok(session) => session,
                Err(response) => return response,
            };

            match self.backend.list_books(session.as_str()).await {
                Ok(books) => ActionResponse::success("Books gotten!", books),
                Err(err) => handle_api_error(err, &GET_MY_BOOKS),
            }
        })
    }

    /// Adds a catalog book to the library, returns the created entry
    pub async fn add_book(
        &self,
        book: &SimpleBook,
        read_status: ReadStatus,
    ) -> ActionResponse<ComplexBook> {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(response) => return response,
        };

        let request = book.to_new_book_request(read_status);
        match self.backend.add_book(session.as_str(), &request).await {
            Ok(created) => ActionResponse::success("Book successfully added!", created),
            Err(err) => handle_api_error(err, &ADD_BOOK),
        }
    }

    pub async fn remove_book(&self, book_id: &BookId) -> ActionResponse {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(response) => return response,
        };

        match self.backend.remove_book(session.as_str(), book_id).await {
            Ok(()) => ActionResponse::done("Book successfully removed!"),
            Err(err) => handle_api_error(err, &REMOVE_BOOK),
        }
    }

    pub async fn update_book(&self, book_id: &BookId, read_status: ReadStatus) -> ActionResponse {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(response) => return response,
        };

        let update = UpdateBookRequest { read_status };
        match self
            .backend
            .update_book(session.as_str(), book_id, &update)
            .await
        {
            Ok(()) => ActionResponse::done("Book successfully updated!"),
            Err(err) => handle_api_error(err, &UPDATE_BOOK),
        }
    }
}
