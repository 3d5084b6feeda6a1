use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

use bookshelf_backend::api::{ComplexBook, NewBookRequest, ReadStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Book shape shared by search results and library entries
pub struct SimpleBook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publisher: String,
    /// `YYYY-MM-DD` for library entries, as published by the catalog for search results
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub isbn10: String,
    #[serde(default)]
    pub isbn13: String,
    pub page_count: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_status: Option<ReadStatus>,
}

impl SimpleBook {
    /// ISBN-13 when known, ISBN-10 otherwise
    pub fn isbn(&self) -> Option<&str> {
        [self.isbn13.as_str(), self.isbn10.as_str()]
            .into_iter()
            .find(|isbn| !isbn.is_empty())
    }

    /// Body of the backend request adding this book to the library
    pub fn to_new_book_request(&self, read_status: ReadStatus) -> NewBookRequest {
        fn non_empty(value: &str) -> Option<String> {
            (!value.is_empty()).then(|| value.to_string())
        }

        NewBookRequest {
            title: self.title.clone(),
            subtitle: non_empty(&self.subtitle),
            book_desc: non_empty(&self.description),
            image_url: non_empty(&self.image),
            isbn: self.isbn().map(str::to_string),
            publisher: non_empty(&self.publisher),
            published_date: non_empty(&self.published_date),
            page_count: self.page_count,
            read_status,
            authors: self.authors.clone(),
            genres: self.categories.clone(),
        }
    }
}

impl From<&ComplexBook> for SimpleBook {
    fn from(book: &ComplexBook) -> Self {
        let isbn = book.isbn.clone().unwrap_or_default();
        let isbn_of_length = |length: usize| {
            if isbn.chars().count() == length {
                isbn.clone()
            } else {
                String::new()
            }
        };

        SimpleBook {
            id: book.id.clone(),
            title: book.title.clone(),
            subtitle: book.subtitle.clone().unwrap_or_default(),
            description: book.book_desc.clone().unwrap_or_default(),
            publisher: book.publisher.clone().unwrap_or_default(),
            published_date: book
                .published_date
                .as_deref()
                .map(format_published_date)
                .unwrap_or_default(),
            isbn10: isbn_of_length(10),
            isbn13: isbn_of_length(13),
            page_count: book.page_count,
            image: book.image_url.clone().unwrap_or_default(),
            authors: book
                .authors
                .iter()
                .map(|author| author.author_name.clone())
                .collect(),
            categories: book
                .genres
                .iter()
                .map(|genre| genre.genre_name.clone())
                .collect(),
            read_status: Some(book.read_status),
        }
    }
}

/// Formats a backend date as `YYYY-MM-DD`, empty when it can not be parsed.
/// Partial dates (`2004`, `2004-05`) resolve to the first day of the period
pub fn format_published_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|date_time| date_time.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d"));

    date.map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
/// Envelope returned by every action.
/// Error responses carry an error code and never data
pub enum ActionResponse<T = ()> {
    Success {
        details: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<T>,
    },
    Info {
        details: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<T>,
    },
    Error {
        details: String,
        #[serde(rename = "errorCode")]
        error_code: String,
    },
}

impl<T> ActionResponse<T> {
    pub fn success(details: impl Into<String>, data: T) -> Self {
        ActionResponse::Success {
            details: details.into(),
            data: Some(data),
        }
    }

    pub fn done(details: impl Into<String>) -> Self {
        ActionResponse::Success {
            details: details.into(),
            data: None,
        }
    }

    pub fn info(details: impl Into<String>) -> Self {
        ActionResponse::Info {
            details: details.into(),
            data: None,
        }
    }

    pub fn error(details: impl Into<String>, error_code: impl Into<String>) -> Self {
        ActionResponse::Error {
            details: details.into(),
            error_code: error_code.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResponse::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ActionResponse::Error { .. })
    }

    pub fn details(&self) -> &str {
        match self {
            ActionResponse::Success { details, .. }
            | ActionResponse::Info { details, .. }
            | ActionResponse::Error { details, .. } => details,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            ActionResponse::Error { error_code, .. } => Some(error_code),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ActionResponse::Success { data, .. } | ActionResponse::Info { data, .. } => {
                data.as_ref()
            }
            ActionResponse::Error { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ActionResponse::Success { data, .. } | ActionResponse::Info { data, .. } => data,
            ActionResponse::Error { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResponse<U> {
        match self {
            ActionResponse::Success { details, data } => ActionResponse::Success {
                details,
                data: data.map(f),
            },
            ActionResponse::Info { details, data } => ActionResponse::Info {
                details,
                data: data.map(f),
            },
            ActionResponse::Error {
                details,
                error_code,
            } => ActionResponse::Error {
                details,
                error_code,
            },
        }
    }

    /// Same status and details, without the payload
    pub fn without_data<U>(&self) -> ActionResponse<U> {
        match self {
            ActionResponse::Success { details, .. } => ActionResponse::done(details.clone()),
            ActionResponse::Info { details, .. } => ActionResponse::info(details.clone()),
            ActionResponse::Error {
                details,
                error_code,
            } => ActionResponse::error(details.clone(), error_code.clone()),
        }
    }

    /// Same error with another payload type, None for success and info
    pub fn cast_error<U>(&self) -> Option<ActionResponse<U>> {
        match self {
            ActionResponse::Error {
                details,
                error_code,
            } => Some(ActionResponse::error(details.clone(), error_code.clone())),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Opaque token identifying a backend session
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Book picked from the search results together with the status it is added with
pub struct AddBookForm {
    pub book: SimpleBook,
    #[serde(default)]
    pub read_status: ReadStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookForm {
    pub read_status: ReadStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: Option<String>,
}
