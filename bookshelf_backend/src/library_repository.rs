pub use in_memory_library_repository::InMemoryLibraryRepository;

use crate::api::{BookId, ComplexBook, NewBookRequest, UpdateBookRequest, UserId};

mod in_memory_library_repository;

#[derive(thiserror::Error, Debug)]
pub enum LibraryRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Book with isbn {0} already in library")]
    IsbnAlreadyExists(String),

    #[error("Invalid book data: {}", .0.join(", "))]
    InvalidData(Vec<String>),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Lists the books of the user, in the order they were added
    async fn list_books(&self, user_id: &UserId) -> Result<Vec<ComplexBook>, LibraryRepositoryError>;
    /// Adds a book to the library of the user, returns the stored entry
    async fn add_book(
        &self,
        user_id: &UserId,
        book: NewBookRequest,
    ) -> Result<ComplexBook, LibraryRepositoryError>;
    /// Updates the read status of a book owned by the user
    async fn update_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        update: UpdateBookRequest,
    ) -> Result<(), LibraryRepositoryError>;
    /// Removes a book owned by the user
    async fn remove_book(&self, user_id: &UserId, book_id: &BookId)
        -> Result<(), LibraryRepositoryError>;
}

/// Checks the fields the backend requires of a new library entry
pub fn validate_new_book(book: &NewBookRequest) -> Result<(), LibraryRepositoryError> {
    let mut problems = vec![];
    if book.title.trim().is_empty() {
        problems.push("Title is required".to_string());
    }
    if book.page_count == 0 {
        problems.push("Page count must be a positive number".to_string());
    }
    if book.isbn.as_deref().map_or(true, |isbn| isbn.trim().is_empty()) {
        problems.push("ISBN is required".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(LibraryRepositoryError::InvalidData(problems))
    }
}
