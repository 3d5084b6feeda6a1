//! Page loads: which actions run when a page is requested and where the
//! visitor is sent afterwards.

use bookshelf_backend::api::{ComplexBook, User};

use crate::actions::ServerActions;
use crate::api::ActionResponse;
use crate::parallel_action::run_parallel_action;
use crate::query_cache::LibraryCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    SignIn,
    MyBooks,
    Search,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::SignIn => "/sign-in",
            Redirect::MyBooks => "/my-books",
            Redirect::Search => "/search",
        }
    }
}

/// Home page target: sign in without a user, the library when it has books, search otherwise
pub fn decide_home(
    my_books: &ActionResponse<Vec<ComplexBook>>,
    user: &ActionResponse<User>,
) -> Redirect {
    if user.data().is_none() {
        return Redirect::SignIn;
    }
    match my_books.data() {
        Some(books) if !books.is_empty() => Redirect::MyBooks,
        _ => Redirect::Search,
    }
}

/// Data every signed-in page is rendered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInLayout {
    pub user: User,
    pub my_books: Vec<ComplexBook>,
}

async fn load_session_data(
    actions: &ServerActions,
) -> (ActionResponse<Vec<ComplexBook>>, ActionResponse<User>) {
    futures_util::join!(
        run_parallel_action(actions.get_my_books()),
        run_parallel_action(actions.get_user())
    )
}

pub async fn home_redirect(actions: &ServerActions) -> Redirect {
    let (my_books, user) = load_session_data(actions).await;
    decide_home(&my_books, &user)
}

/// Loads the user and its library, and seeds the cache with them.
/// Without a signed-in user, returns where to send the visitor instead
pub async fn signed_in_layout(
    actions: &ServerActions,
    cache: &LibraryCache,
) -> Result<SignedInLayout, Redirect> {
    let session = actions.session().ok_or(Redirect::SignIn)?;
    let (my_books, user) = load_session_data(actions).await;

    let Some(signed_in_user) = user.data().cloned() else {
        return Err(Redirect::SignIn);
    };

    let books = my_books.data().cloned().unwrap_or_default();
    cache.my_books.set_query_data(session.clone(), my_books);
    cache.user.set_query_data(session.clone(), user);

    Ok(SignedInLayout {
        user: signed_in_user,
        my_books: books,
    })
}

/// Verifies the email when the link carries a token, then always sends to sign in
pub async fn verify_email_page(actions: &ServerActions, token: Option<&str>) -> Redirect {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Redirect::SignIn;
    };

    let response = actions.verify_email(token).await;
    if response.is_error() {
        tracing::warn!("Email verification failed: {}", response.details());
    }
    Redirect::SignIn
}

#[cfg(test)]
mod pages_tests {
    use bookshelf_backend::api::ReadStatus;

    use super::*;
    use crate::actions::test_support::TestBackend;
    use crate::api::SimpleBook;

    #[test]
    fn home_decision() {
        let user: ActionResponse<User> = ActionResponse::success(
            "User gotten!",
            User {
                id: "1".to_string(),
                email: "reader@example.com".to_string(),
                name: "Reader".to_string(),
                email_verified: true,
            },
        );
        let no_user: ActionResponse<User> = ActionResponse::error("No", "UNAUTHORIZED");
        let empty: ActionResponse<Vec<ComplexBook>> = ActionResponse::success("Books gotten!", vec![]);
        let failed: ActionResponse<Vec<ComplexBook>> = ActionResponse::error("No", "ERROR");

        assert_eq!(decide_home(&empty, &no_user), Redirect::SignIn);
        assert_eq!(decide_home(&empty, &user), Redirect::Search);
        assert_eq!(decide_home(&failed, &user), Redirect::Search);
    }

    #[actix_web::test]
    async fn home_follows_sign_in_and_library() {
        // Steps:
        // 1. Anonymous visitor is sent to sign in
        // 2. Signed in with an empty library, sent to search
        // 3. After adding a book, sent to the library
        let backend = TestBackend::start();
        assert_eq!(home_redirect(&backend.actions).await, Redirect::SignIn);

        let actions = backend.signed_in("home@example.com").await;
        assert_eq!(home_redirect(&actions).await, Redirect::Search);

        let book = SimpleBook {
            title: "Dune".to_string(),
            isbn13: "9780441013593".to_string(),
            page_count: 412,
            authors: vec!["Frank Herbert".to_string()],
            ..SimpleBook::default()
        };
        assert!(actions.add_book(&book, ReadStatus::Unread).await.is_success());
        assert_eq!(home_redirect(&actions).await, Redirect::MyBooks);
        assert_eq!(Redirect::MyBooks.path(), "/my-books");
    }

    #[actix_web::test]
    async fn layout_hydrates_cache() {
        let backend = TestBackend::start();
        let cache = LibraryCache::default();

        assert_eq!(
            signed_in_layout(&backend.actions, &cache).await,
            Err(Redirect::SignIn)
        );

        let actions = backend.signed_in("layout@example.com").await;
        let layout = signed_in_layout(&actions, &cache).await.unwrap();
        assert_eq!(layout.user.email, "layout@example.com");
        assert!(layout.my_books.is_empty());

        let session = actions.session().unwrap();
        assert!(cache.my_books.get(session).is_some());
        assert_eq!(
            cache.user.get(session).and_then(|r| r.into_data()),
            Some(layout.user)
        );
    }

    #[actix_web::test]
    async fn verify_email_page_redirects_to_sign_in() {
        let backend = TestBackend::start();
        assert_eq!(verify_email_page(&backend.actions, None).await, Redirect::SignIn);
        assert_eq!(
            verify_email_page(&backend.actions, Some("bogus")).await,
            Redirect::SignIn
        );

        backend
            .actions
            .register(bookshelf_backend::api::RegisterRequest {
                name: "Reader".to_string(),
                email: "link@example.com".to_string(),
                password: "correct horse".to_string(),
                confirm_password: "correct horse".to_string(),
            })
            .await;
        let token = backend.verification_token("link@example.com");
        assert_eq!(
            verify_email_page(&backend.actions, Some(&token)).await,
            Redirect::SignIn
        );

        // The token was consumed by the page
        assert!(backend.actions.verify_email(&token).await.is_error());
    }
}
