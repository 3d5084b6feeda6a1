use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::accounts_repository::{AccountsRepository, AccountsRepositoryError};
use crate::api::{
    BackendError, BackendErrorCode, BackendSuccess, BookId, EmailRequest, LoginRequest,
    NewBookRequest, RegisterRequest, ResetPasswordRequest, SessionGranted, TokenQuery,
    UpdateBookRequest, User,
};
use crate::library_repository::{LibraryRepository, LibraryRepositoryError};
use crate::mailer::{EmailTemplates, Mailer};

type Accounts = Data<Arc<dyn AccountsRepository>>;
type Library = Data<Arc<dyn LibraryRepository>>;
type MailerData = Data<Arc<dyn Mailer>>;

fn success<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(BackendSuccess::new(data))
}

fn no_content() -> HttpResponse {
    HttpResponse::Ok().json(BackendSuccess::new(()))
}

fn accounts_error(err: AccountsRepositoryError) -> HttpResponse {
    match err {
        AccountsRepositoryError::UserExists(_) => HttpResponse::Conflict().json(BackendError::new(
            BackendErrorCode::UserExists,
            "User already exists",
        )),
        AccountsRepositoryError::UserNotFound(_) => HttpResponse::NotFound()
            .json(BackendError::new(BackendErrorCode::NotFound, "User not found")),
        AccountsRepositoryError::InvalidData(problems) => HttpResponse::BadRequest()
            .json(BackendError::with_messages(BackendErrorCode::InvalidData, problems)),
        AccountsRepositoryError::InvalidCredentials => HttpResponse::Unauthorized().json(
            BackendError::new(BackendErrorCode::InvalidCredentials, "Invalid credentials"),
        ),
        AccountsRepositoryError::EmailNotVerified(_) => HttpResponse::Forbidden().json(
            BackendError::new(BackendErrorCode::EmailNotVerified, "Email not verified"),
        ),
        AccountsRepositoryError::InvalidToken => HttpResponse::BadRequest().json(
            BackendError::new(BackendErrorCode::InvalidToken, "Invalid or expired token"),
        ),
        AccountsRepositoryError::Unauthorized => HttpResponse::Unauthorized().json(
            BackendError::new(BackendErrorCode::Unauthorized, "Authentication required"),
        ),
    }
}

fn library_error(err: LibraryRepositoryError) -> HttpResponse {
    match err {
        LibraryRepositoryError::NotFound(book_id) => HttpResponse::NotFound().json(
            BackendError::new(BackendErrorCode::NotFound, format!("Book {book_id} not found")),
        ),
        LibraryRepositoryError::IsbnAlreadyExists(isbn) => HttpResponse::Conflict().json(
            BackendError::new(
                BackendErrorCode::IsbnAlreadyExist,
                format!("Book with ISBN {isbn} already exists"),
            ),
        ),
        LibraryRepositoryError::InvalidData(problems) => HttpResponse::BadRequest()
            .json(BackendError::with_messages(BackendErrorCode::InvalidData, problems)),
        err => {
            tracing::error!("Library operation failed {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn bearer_token(request: &HttpRequest) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authenticated_user(
    request: &HttpRequest,
    accounts: &Accounts,
) -> Result<User, HttpResponse> {
    let session = bearer_token(request)
        .ok_or_else(|| accounts_error(AccountsRepositoryError::Unauthorized))?;
    accounts
        .user_for_session(session)
        .await
        .map_err(accounts_error)
}

async fn send_verification_email(
    accounts: &Accounts,
    mailer: &MailerData,
    templates: &EmailTemplates,
    email: &str,
) -> Result<(), AccountsRepositoryError> {
    let issued = accounts.issue_verification_token(email).await?;
    if let Err(err) = mailer
        .send(templates.verification(&issued.user.email, &issued.token))
        .await
    {
        tracing::error!("Sending verification email failed {:#}", err);
    }
    Ok(())
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_current_user(request: HttpRequest, accounts: Accounts) -> Result<HttpResponse, Error> {
    Ok(match authenticated_user(&request, &accounts).await {
        Ok(user) => success(user),
        Err(response) => response,
    })
}

#[api_v2_operation]
pub async fn get_books(
    request: HttpRequest,
    accounts: Accounts,
    library: Library,
) -> Result<HttpResponse, Error> {
    let user = match authenticated_user(&request, &accounts).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    Ok(match library.list_books(&user.id).await {
        Ok(books) => success(books),
        Err(err) => library_error(err),
    })
}

#[api_v2_operation]
pub async fn add_book(
    request: HttpRequest,
    accounts: Accounts,
    library: Library,
    book: web::Json<NewBookRequest>,
) -> Result<HttpResponse, Error> {
    let user = match authenticated_user(&request, &accounts).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    Ok(match library.add_book(&user.id, book.into_inner()).await {
        Ok(book) => HttpResponse::Created().json(BackendSuccess::new(book)),
        Err(err) => library_error(err),
    })
}

#[api_v2_operation]
pub async fn update_book(
    request: HttpRequest,
    accounts: Accounts,
    library: Library,
    book_id: web::Path<BookId>,
    update: web::Json<UpdateBookRequest>,
) -> Result<HttpResponse, Error> {
    let user = match authenticated_user(&request, &accounts).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    Ok(
        match library
            .update_book(&user.id, &book_id.into_inner(), update.into_inner())
            .await
        {
            Ok(()) => no_content(),
            Err(err) => library_error(err),
        },
    )
}

#[api_v2_operation]
pub async fn remove_book(
    request: HttpRequest,
    accounts: Accounts,
    library: Library,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let user = match authenticated_user(&request, &accounts).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    Ok(match library.remove_book(&user.id, &book_id.into_inner()).await {
        Ok(()) => no_content(),
        Err(err) => library_error(err),
    })
}

#[api_v2_operation]
pub async fn login(
    accounts: Accounts,
    mailer: MailerData,
    templates: Data<EmailTemplates>,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error> {
    Ok(match accounts.login(credentials.into_inner()).await {
        Ok(token) => success(SessionGranted { token }),
        Err(AccountsRepositoryError::EmailNotVerified(email)) => {
            if let Err(err) = send_verification_email(&accounts, &mailer, &templates, &email).await
            {
                tracing::error!("Issuing verification token failed {}", err);
            }
            accounts_error(AccountsRepositoryError::EmailNotVerified(email))
        }
        Err(err) => accounts_error(err),
    })
}

#[api_v2_operation]
pub async fn logout(request: HttpRequest, accounts: Accounts) -> Result<HttpResponse, Error> {
    let Some(session) = bearer_token(&request) else {
        return Ok(accounts_error(AccountsRepositoryError::Unauthorized));
    };
    Ok(match accounts.logout(session).await {
        Ok(()) => no_content(),
        Err(err) => accounts_error(err),
    })
}

#[api_v2_operation]
pub async fn register(
    accounts: Accounts,
    mailer: MailerData,
    templates: Data<EmailTemplates>,
    registration: web::Json<RegisterRequest>,
) -> Result<HttpResponse, Error> {
    Ok(match accounts.register(registration.into_inner()).await {
        Ok(issued) => {
            if let Err(err) = mailer
                .send(templates.verification(&issued.user.email, &issued.token))
                .await
            {
                tracing::error!("Sending verification email failed {:#}", err);
            }
            HttpResponse::Created().json(BackendSuccess::new(issued.user))
        }
        Err(err) => accounts_error(err),
    })
}

#[api_v2_operation]
pub async fn request_password_reset(
    accounts: Accounts,
    mailer: MailerData,
    templates: Data<EmailTemplates>,
    email: web::Json<EmailRequest>,
) -> Result<HttpResponse, Error> {
    // Replies the same way whether or not the account exists
    Ok(match accounts.issue_reset_token(&email.email).await {
        Ok(Some(issued)) => {
            if let Err(err) = mailer
                .send(templates.password_reset(&issued.user.email, &issued.token))
                .await
            {
                tracing::error!("Sending password reset email failed {:#}", err);
            }
            no_content()
        }
        Ok(None) => no_content(),
        Err(err) => accounts_error(err),
    })
}

#[api_v2_operation]
pub async fn reset_password(
    accounts: Accounts,
    reset: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, Error> {
    Ok(match accounts.reset_password(reset.into_inner()).await {
        Ok(()) => no_content(),
        Err(err) => accounts_error(err),
    })
}

#[api_v2_operation]
pub async fn resend_verification(
    accounts: Accounts,
    mailer: MailerData,
    templates: Data<EmailTemplates>,
    email: web::Json<EmailRequest>,
) -> Result<HttpResponse, Error> {
    Ok(
        match send_verification_email(&accounts, &mailer, &templates, &email.email).await {
            Ok(()) => no_content(),
            Err(err) => accounts_error(err),
        },
    )
}

#[api_v2_operation]
pub async fn verify_email(
    accounts: Accounts,
    query: web::Query<TokenQuery>,
) -> Result<HttpResponse, Error> {
    Ok(match accounts.verify_email(&query.token).await {
        Ok(user) => success(user),
        Err(err) => accounts_error(err),
    })
}
