use bookshelf_backend::api::{
    BackendErrorCode, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};

use crate::actions::ServerActions;
use crate::api::{ActionResponse, SessionToken};
use crate::error_normalizer::{handle_api_error, ErrorHandlerOptions, ErrorMapping};

pub const LOGIN_ERRORS: ErrorMapping = ErrorMapping::new(&[
    (
        BackendErrorCode::InvalidCredentials,
        "The email or password is invalid.",
    ),
    (
        BackendErrorCode::EmailNotVerified,
        "This email is not verified. A verification email has been sent.",
    ),
]);

pub const REGISTER_ERRORS: ErrorMapping = ErrorMapping::new(&[(
    BackendErrorCode::UserExists,
    "This email belongs to another user.",
)]);

const LOGIN: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error logging in").with_mapping(LOGIN_ERRORS);
const REGISTER: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error registering user").with_mapping(REGISTER_ERRORS);
const LOGOUT: ErrorHandlerOptions = ErrorHandlerOptions::new("Error logging out");
const REQUEST_PASSWORD_RESET: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error requesting password reset");
const RESET_PASSWORD: ErrorHandlerOptions = ErrorHandlerOptions::new("Error resetting password");
const RESEND_VERIFICATION: ErrorHandlerOptions =
    ErrorHandlerOptions::new("Error resending verification email");
const VERIFY_EMAIL: ErrorHandlerOptions = ErrorHandlerOptions::new("Error verifying email");

impl ServerActions {
    /// Returns the session granted by the backend, the caller stores it in the session cookie
    pub async fn login(&self, credentials: LoginRequest) -> ActionResponse<SessionToken> {
        match self.backend.login(&credentials).await {
            Ok(granted) => ActionResponse::success(
                "User successfully logged in!",
                SessionToken::new(granted.token),
            ),
            Err(err) => handle_api_error(err, &LOGIN),
        }
    }

    pub async fn register(&self, registration: RegisterRequest) -> ActionResponse {
        match self.backend.register(&registration).await {
            Ok(()) => ActionResponse::done("User successfully registered!"),
            Err(err) => handle_api_error(err, &REGISTER),
        }
    }

    pub async fn logout(&self) -> ActionResponse {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(response) => return response,
        };

        match self.backend.logout(session.as_str()).await {
            Ok(()) => ActionResponse::done("User successfully logged out!"),
            Err(err) => handle_api_error(err, &LOGOUT),
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> ActionResponse {
        let request = EmailRequest {
            email: email.to_string(),
        };
        match self.backend.request_password_reset(&request).await {
            Ok(()) => ActionResponse::done("Password reset email successfully sent!"),
            Err(err) => handle_api_error(err, &REQUEST_PASSWORD_RESET),
        }
    }

    pub async fn reset_password(&self, reset: ResetPasswordRequest) -> ActionResponse {
        match self.backend.reset_password(&reset).await {
            Ok(()) => ActionResponse::done("Password successfully reset!"),
            Err(err) => handle_api_error(err, &RESET_PASSWORD),
        }
    }

    pub async fn resend_verification_email(&self, email: &str) -> ActionResponse {
        let request = EmailRequest {
            email: email.to_string(),
        };
        match self.backend.resend_verification(&request).await {
            Ok(()) => ActionResponse::done("Verification email successfully resent!"),
            Err(err) => handle_api_error(err, &RESEND_VERIFICATION),
        }
    }

    pub async fn verify_email(&self, token: &str) -> ActionResponse {
        match self.backend.verify_email(token).await {
            Ok(()) => ActionResponse::done("Email successfully verified!"),
            Err(err) => handle_api_error(err, &VERIFY_EMAIL),
        }
    }
}
