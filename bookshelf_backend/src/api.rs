use std::fmt;

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type BookId = String;
pub type UserId = String;

/// Name of the cookie carrying the session token between the browser and the web front end
pub const SESSION_COOKIE_NAME: &str = "books_gd_session_token";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
#[serde(rename_all = "UPPERCASE")]
/// Reading progress of a library entry, any status may change to any other
pub enum ReadStatus {
    #[default]
    #[serde(alias = "unread")]
    Unread,
    #[serde(alias = "reading")]
    Reading,
    #[serde(alias = "read")]
    Read,
}

impl ReadStatus {
    pub const ALL: [ReadStatus; 3] = [ReadStatus::Unread, ReadStatus::Reading, ReadStatus::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::Unread => "UNREAD",
            ReadStatus::Reading => "READING",
            ReadStatus::Read => "READ",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRecord {
    pub id: String,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct GenreRecord {
    pub id: String,
    pub genre_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Library entry as stored by the backend, with its author and genre records
pub struct ComplexBook {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub book_desc: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    /// ISO date or date-time, as the backend received it
    #[serde(default)]
    pub published_date: Option<String>,
    pub page_count: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub read_status: ReadStatus,
    pub user_id: UserId,
    #[serde(default)]
    pub authors: Vec<AuthorRecord>,
    #[serde(default)]
    pub genres: Vec<GenreRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Body of POST /books
pub struct NewBookRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub book_desc: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    pub page_count: u32,
    #[serde(default)]
    pub read_status: ReadStatus,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Body of PATCH /books/{book_id}
pub struct UpdateBookRequest {
    pub read_status: ReadStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of the endpoints that only need an email address (request-reset, resend-verification)
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Data returned by POST /auth/login
pub struct SessionGranted {
    pub token: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Envelope of every successful backend response
pub struct BackendSuccess<T> {
    pub status: BackendStatus,
    pub data: T,
}

impl<T> BackendSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: BackendStatus::Success,
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Error codes reported by the backend. Codes this crate does not know keep their raw text
pub enum BackendErrorCode {
    NotFound,
    InvalidData,
    IsbnAlreadyExist,
    InvalidCredentials,
    EmailNotVerified,
    UserExists,
    Unauthorized,
    InvalidToken,
    #[default]
    Missing,
    Unrecognized(String),
}

impl BackendErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            BackendErrorCode::NotFound => "NOT_FOUND",
            BackendErrorCode::InvalidData => "INVALID_DATA",
            BackendErrorCode::IsbnAlreadyExist => "ISBN_ALREADY_EXIST",
            BackendErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            BackendErrorCode::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            BackendErrorCode::UserExists => "USER_EXISTS",
            BackendErrorCode::Unauthorized => "UNAUTHORIZED",
            BackendErrorCode::InvalidToken => "INVALID_TOKEN",
            BackendErrorCode::Missing => "",
            BackendErrorCode::Unrecognized(code) => code,
        }
    }
}

impl From<String> for BackendErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "NOT_FOUND" => BackendErrorCode::NotFound,
            "INVALID_DATA" => BackendErrorCode::InvalidData,
            "ISBN_ALREADY_EXIST" => BackendErrorCode::IsbnAlreadyExist,
            "INVALID_CREDENTIALS" => BackendErrorCode::InvalidCredentials,
            "EMAIL_NOT_VERIFIED" => BackendErrorCode::EmailNotVerified,
            "USER_EXISTS" => BackendErrorCode::UserExists,
            "UNAUTHORIZED" => BackendErrorCode::Unauthorized,
            "INVALID_TOKEN" => BackendErrorCode::InvalidToken,
            "" => BackendErrorCode::Missing,
            _ => BackendErrorCode::Unrecognized(code),
        }
    }
}

impl From<BackendErrorCode> for String {
    fn from(code: BackendErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetails {
    Message(String),
    Messages(Vec<String>),
}

impl Default for ErrorDetails {
    fn default() -> Self {
        ErrorDetails::Message(String::new())
    }
}

impl ErrorDetails {
    /// First non-empty message, if any
    pub fn first(&self) -> Option<&str> {
        match self {
            ErrorDetails::Message(message) => Some(message.as_str()),
            ErrorDetails::Messages(messages) => messages.first().map(String::as_str),
        }
        .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Error payload returned by the backend together with a non-2xx status
pub struct BackendError {
    pub status: BackendStatus,
    #[serde(default)]
    pub code: BackendErrorCode,
    #[serde(default)]
    pub details: ErrorDetails,
}

impl BackendError {
    pub fn new(code: BackendErrorCode, details: impl Into<String>) -> Self {
        Self {
            status: BackendStatus::Error,
            code,
            details: ErrorDetails::Message(details.into()),
        }
    }

    pub fn with_messages(code: BackendErrorCode, messages: Vec<String>) -> Self {
        Self {
            status: BackendStatus::Error,
            code,
            details: ErrorDetails::Messages(messages),
        }
    }
}

#[cfg(test)]
mod api_tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn read_status_accepts_both_cases() {
        let upper: ReadStatus = serde_json::from_value(json!("READING")).unwrap();
        let lower: ReadStatus = serde_json::from_value(json!("reading")).unwrap();
        assert_eq!(upper, ReadStatus::Reading);
        assert_eq!(lower, ReadStatus::Reading);
        assert_eq!(json!(ReadStatus::Read), json!("READ"));
    }

    #[test]
    fn unknown_error_codes_keep_raw_text() {
        let error: BackendError = serde_json::from_value(json!({
            "status": "error",
            "code": "RATE_LIMITED",
            "details": ["slow down", "really"]
        }))
        .unwrap();

        assert_eq!(
            error.code,
            BackendErrorCode::Unrecognized("RATE_LIMITED".to_string())
        );
        assert_eq!(error.details.first(), Some("slow down"));
        assert_eq!(json!(error)["code"], json!("RATE_LIMITED"));
    }

    #[test]
    fn error_payload_without_code_or_details() {
        let error: BackendError = serde_json::from_value(json!({ "status": "error" })).unwrap();
        assert_eq!(error.code, BackendErrorCode::Missing);
        assert_eq!(error.details.first(), None);
    }
}
