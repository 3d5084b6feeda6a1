//! Turns failed backend calls into error [`ActionResponse`]s.
//!
//! Order of precedence: message mapped for the backend error code, then the
//! details sent by the backend, then the default message. Transport failures
//! and unexpected failures get fixed messages.

use bookshelf_backend::api::BackendErrorCode;
use bookshelf_backend::client::BackendClientError;

use crate::api::ActionResponse;

pub const GENERIC_ERROR_CODE: &str = "ERROR";
pub const DEFAULT_MESSAGE: &str = "Something went wrong.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred. Please try again later.";

/// Static table of user facing messages per backend error code
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapping(&'static [(BackendErrorCode, &'static str)]);

impl ErrorMapping {
    pub const EMPTY: ErrorMapping = ErrorMapping(&[]);

    pub const fn new(entries: &'static [(BackendErrorCode, &'static str)]) -> Self {
        Self(entries)
    }

    pub fn message_for(&self, code: &BackendErrorCode) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(mapped_code, _)| mapped_code == code)
            .map(|(_, message)| *message)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorHandlerOptions {
    /// What was attempted, used in logs
    pub description: &'static str,
    pub default_message: &'static str,
    pub mapping: ErrorMapping,
}

impl ErrorHandlerOptions {
    pub const fn new(description: &'static str) -> Self {
        Self {
            description,
            default_message: DEFAULT_MESSAGE,
            mapping: ErrorMapping::EMPTY,
        }
    }

    pub const fn with_mapping(self, mapping: ErrorMapping) -> Self {
        Self { mapping, ..self }
    }

    pub const fn with_default_message(self, default_message: &'static str) -> Self {
        Self {
            default_message,
            ..self
        }
    }
}

/// Failure of an action before it could produce a response
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Backend(#[from] BackendClientError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Builds the error response for a failed action. Never panics
pub fn handle_api_error<T>(
    error: impl Into<ActionError>,
    options: &ErrorHandlerOptions,
) -> ActionResponse<T> {
    let error = error.into();

    match &error {
        ActionError::Backend(BackendClientError::Backend {
            error: backend_error,
            status,
        }) => {
            tracing::warn!(
                "{}: backend responded {} {:?}",
                options.description,
                status,
                backend_error
            );
            let code = &backend_error.code;

            if let Some(message) = options.mapping.message_for(code) {
                return ActionResponse::error(message, code.as_str());
            }

            if let Some(details) = backend_error.details.first() {
                let error_code = match code {
                    BackendErrorCode::Missing => GENERIC_ERROR_CODE,
                    code => code.as_str(),
                };
                return ActionResponse::error(details, error_code);
            }

            ActionResponse::error(options.default_message, GENERIC_ERROR_CODE)
        }
        ActionError::Backend(BackendClientError::UnexpectedStatus(status)) => {
            tracing::warn!(
                "{}: backend responded {} without error payload",
                options.description,
                status
            );
            ActionResponse::error(options.default_message, GENERIC_ERROR_CODE)
        }
        ActionError::Backend(BackendClientError::Transport(err)) if is_network_error(err) => {
            tracing::warn!("{}: {}", options.description, err);
            ActionResponse::error(NETWORK_ERROR_MESSAGE, GENERIC_ERROR_CODE)
        }
        _ => {
            tracing::error!("{}: unexpected error {}", options.description, error);
            ActionResponse::error(UNEXPECTED_ERROR_MESSAGE, GENERIC_ERROR_CODE)
        }
    }
}

fn is_network_error(err: &reqwest_middleware::Error) -> bool {
    match err {
        reqwest_middleware::Error::Reqwest(_) => true,
        reqwest_middleware::Error::Middleware(_) => false,
    }
}
