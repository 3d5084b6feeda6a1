use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::json;

use crate::api::{
    AuthorRecord, BookId, ComplexBook, GenreRecord, NewBookRequest, UpdateBookRequest, UserId,
};
use crate::library_repository::{validate_new_book, LibraryRepository, LibraryRepositoryError};

#[derive(Default)]
pub struct InMemoryLibraryRepository {
    record_sequence_generator: AtomicI32,
    books: parking_lot::RwLock<HashMap<UserId, Vec<ComplexBook>>>,
}

impl InMemoryLibraryRepository {
    fn next_id(&self) -> String {
        self.record_sequence_generator
            .fetch_add(1, Ordering::Relaxed)
            .to_string()
    }
}

#[async_trait::async_trait]
impl LibraryRepository for InMemoryLibraryRepository {
    async fn list_books(&self, user_id: &UserId) -> Result<Vec<ComplexBook>, LibraryRepositoryError> {
        Ok(self.books.read().get(user_id).cloned().unwrap_or_default())
    }

    async fn add_book(
        &self,
        user_id: &UserId,
        book: NewBookRequest,
    ) -> Result<ComplexBook, LibraryRepositoryError> {
        validate_new_book(&book)?;
        let isbn = book.isbn.clone().unwrap_or_default();

        let mut locked_books = self.books.write();
        let user_books = locked_books.entry(user_id.clone()).or_default();
        if user_books
            .iter()
            .any(|existing| existing.isbn.as_deref() == Some(isbn.as_str()))
        {
            return Err(LibraryRepositoryError::IsbnAlreadyExists(isbn));
        }

        let stored = ComplexBook {
            id: self.next_id(),
            title: book.title,
            subtitle: book.subtitle,
            book_desc: book.book_desc,
            isbn: Some(isbn),
            publisher: book.publisher,
            published_date: book.published_date,
            page_count: book.page_count,
            image_url: book.image_url,
            read_status: book.read_status,
            user_id: user_id.clone(),
            authors: book
                .authors
                .into_iter()
                .map(|author_name| AuthorRecord {
                    id: self.next_id(),
                    author_name,
                })
                .collect(),
            genres: book
                .genres
                .into_iter()
                .map(|genre_name| GenreRecord {
                    id: self.next_id(),
                    genre_name,
                })
                .collect(),
        };
        user_books.push(stored.clone());
        Ok(stored)
    }

    async fn update_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        update: UpdateBookRequest,
    ) -> Result<(), LibraryRepositoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(user_id)
            .and_then(|books| books.iter_mut().find(|book| &book.id == book_id))
            .ok_or_else(|| LibraryRepositoryError::NotFound(book_id.clone()))?;

        let mut result_book = json!(book);
        json_patch::merge(&mut result_book, &json!(update));
        *book = serde_json::from_value(result_book)?;
        Ok(())
    }

    async fn remove_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
    ) -> Result<(), LibraryRepositoryError> {
        let mut locked_books = self.books.write();
        let user_books = locked_books
            .get_mut(user_id)
            .ok_or_else(|| LibraryRepositoryError::NotFound(book_id.clone()))?;
        let position = user_books
            .iter()
            .position(|book| &book.id == book_id)
            .ok_or_else(|| LibraryRepositoryError::NotFound(book_id.clone()))?;
        user_books.remove(position);
        Ok(())
    }
}
