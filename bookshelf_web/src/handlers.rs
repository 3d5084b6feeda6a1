use std::future::Future;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse};
use paperclip::actix::{api_v2_operation, web};
use serde::Serialize;

use bookshelf_backend::api::{
    BookId, ComplexBook, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SESSION_COOKIE_NAME,
};

use crate::action_state::{ActionState, BookControls};
use crate::actions::ServerActions;
use crate::api::{
    ActionResponse, AddBookForm, SearchQuery, SessionToken, SimpleBook, UpdateBookForm,
    VerifyEmailQuery,
};
use crate::pages::{home_redirect, verify_email_page, Redirect};
use crate::portfolio::PortfolioSummary;
use crate::query_cache::LibraryCache;

type Actions = Data<ServerActions>;
type Cache = Data<LibraryCache>;
type Controls = Data<BookControls>;

fn session_from(request: &HttpRequest) -> Option<SessionToken> {
    request
        .cookie(SESSION_COOKIE_NAME)
        .map(|cookie| SessionToken::new(cookie.value()))
        .filter(|session| !session.as_str().is_empty())
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn envelope<T: Serialize>(response: ActionResponse<T>) -> HttpResponse {
    HttpResponse::Ok().json(response)
}

fn see_other(redirect: Redirect) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, redirect.path()))
        .finish()
}

fn to_simple_books(
    response: ActionResponse<Vec<ComplexBook>>,
) -> ActionResponse<Vec<SimpleBook>> {
    response.map(|books| books.iter().map(SimpleBook::from).collect())
}

/// Library of the session, through the cache
async fn cached_my_books(
    actions: &ServerActions,
    cache: &LibraryCache,
) -> ActionResponse<Vec<ComplexBook>> {
    match actions.session() {
        Some(session) => {
            cache
                .my_books
                .get_or_fetch(session.clone(), || actions.get_my_books().run())
                .await
        }
        None => actions.get_my_books().await,
    }
}

/// Runs a mutation of `book_id`, tracking its state for the session
async fn tracked<T>(
    controls: &BookControls,
    actions: &ServerActions,
    book_id: &str,
    action: impl Future<Output = ActionResponse<T>>,
) -> ActionResponse<T> {
    match actions.session() {
        Some(session) => {
            controls
                .run((session.clone(), book_id.to_string()), action)
                .await
        }
        None => action.await,
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn home(request: HttpRequest, actions: Actions) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    Ok(see_other(home_redirect(&actions).await))
}

#[api_v2_operation]
pub async fn verify_email(
    actions: Actions,
    query: web::Query<VerifyEmailQuery>,
) -> Result<HttpResponse, Error> {
    Ok(see_other(
        verify_email_page(&actions, query.token.as_deref()).await,
    ))
}

#[api_v2_operation]
pub async fn get_user(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = match actions.session() {
        Some(session) => {
            cache
                .user
                .get_or_fetch(session.clone(), || actions.get_user().run())
                .await
        }
        None => actions.get_user().await,
    };
    Ok(envelope(response))
}

#[api_v2_operation]
pub async fn get_my_books(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = cached_my_books(&actions, &cache).await;
    Ok(envelope(to_simple_books(response)))
}

#[api_v2_operation]
pub async fn get_portfolio(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = cached_my_books(&actions, &cache).await;
    Ok(envelope(
        response.map(|books| PortfolioSummary::from_books(&books)),
    ))
}

#[api_v2_operation]
pub async fn add_book(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
    controls: Controls,
    form: web::Json<AddBookForm>,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = tracked(
        &controls,
        &actions,
        &form.book.id,
        actions.add_book(&form.book, form.read_status),
    )
    .await;
    if let (true, Some(session)) = (response.is_success(), actions.session()) {
        cache.invalidate_my_books(session);
    }
    Ok(envelope(response.map(|book| SimpleBook::from(&book))))
}

#[api_v2_operation]
pub async fn update_book(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
    controls: Controls,
    book_id: web::Path<BookId>,
    form: web::Json<UpdateBookForm>,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = tracked(
        &controls,
        &actions,
        &book_id,
        actions.update_book(&book_id, form.read_status),
    )
    .await;
    if let (true, Some(session)) = (response.is_success(), actions.session()) {
        cache.invalidate_my_books(session);
    }
    Ok(envelope(response))
}

#[api_v2_operation]
pub async fn remove_book(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
    controls: Controls,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = tracked(&controls, &actions, &book_id, actions.remove_book(&book_id)).await;
    if let (true, Some(session)) = (response.is_success(), actions.session()) {
        cache.invalidate_my_books(session);
    }
    Ok(envelope(response))
}

/// State of the last add, update or remove of the book by this session
#[api_v2_operation]
pub async fn book_state(
    request: HttpRequest,
    controls: Controls,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let state = match session_from(&request) {
        Some(session) => controls.state(&(session, book_id.into_inner())),
        None => ActionState::Idle,
    };
    Ok(HttpResponse::Ok().json(state))
}

#[api_v2_operation]
pub async fn search(
    actions: Actions,
    cache: Cache,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, Error> {
    let query = query.q.trim().to_string();
    let response = if query.is_empty() {
        actions.search_book(&query).await
    } else {
        cache
            .search
            .get_or_fetch(query.clone(), || actions.search_book(&query).run())
            .await
    };
    Ok(envelope(response))
}

#[api_v2_operation]
pub async fn login(
    actions: Actions,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error> {
    let response = actions.login(credentials.into_inner()).await;
    let body: ActionResponse = response.without_data();

    Ok(match response.into_data() {
        Some(session) => HttpResponse::Ok()
            .cookie(session_cookie(session.as_str().to_string()))
            .json(body),
        None => envelope(body),
    })
}

#[api_v2_operation]
pub async fn logout(
    request: HttpRequest,
    actions: Actions,
    cache: Cache,
) -> Result<HttpResponse, Error> {
    let actions = actions.with_session(session_from(&request));
    let response = actions.logout().await;
    if let Some(session) = actions.session() {
        cache.forget_session(session);
    }

    let mut removal = session_cookie(String::new());
    removal.make_removal();
    Ok(HttpResponse::Ok().cookie(removal).json(response))
}

#[api_v2_operation]
pub async fn register(
    actions: Actions,
    registration: web::Json<RegisterRequest>,
) -> Result<HttpResponse, Error> {
    Ok(envelope(actions.register(registration.into_inner()).await))
}

#[api_v2_operation]
pub async fn request_password_reset(
    actions: Actions,
    email: web::Json<EmailRequest>,
) -> Result<HttpResponse, Error> {
    Ok(envelope(actions.request_password_reset(&email.email).await))
}

#[api_v2_operation]
pub async fn reset_password(
    actions: Actions,
    reset: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, Error> {
    Ok(envelope(actions.reset_password(reset.into_inner()).await))
}

#[api_v2_operation]
pub async fn resend_verification(
    actions: Actions,
    email: web::Json<EmailRequest>,
) -> Result<HttpResponse, Error> {
    Ok(envelope(actions.resend_verification_email(&email.email).await))
}
