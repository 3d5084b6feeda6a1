use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde_json::json;

use bookshelf_backend::api::{BackendErrorCode, LoginRequest, RegisterRequest};
use bookshelf_backend::client::BookshelfBackendClient;
use bookshelf_web::api::{ActionResponse, SimpleBook};

const BACKEND_URL: &str = "http://127.0.0.1:8081";
const WEB_URL: &str = "http://127.0.0.1:8080";

fn unique_email() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("system-{}@example.com", suffix.to_lowercase())
}

fn web_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create client")
}

#[tokio::test]
/// Registers through the backend client
/// Login is refused until the email is verified
/// Registering the same email again is refused
async fn backend_registration_e2e_test() {
    let client = BookshelfBackendClient::new(BACKEND_URL).expect("Failed to create client");
    let email = unique_email();

    client
        .register(&RegisterRequest {
            name: "System".to_string(),
            email: email.clone(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
        })
        .await
        .expect("Failed to register");

    let refused = client
        .login(&LoginRequest {
            email: email.clone(),
            password: "correct horse".to_string(),
        })
        .await
        .expect_err("Login of unverified email succeeded");
    assert_eq!(
        refused.backend_error().map(|error| error.code.clone()),
        Some(BackendErrorCode::EmailNotVerified)
    );

    let duplicated = client
        .register(&RegisterRequest {
            name: "System".to_string(),
            email,
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
        })
        .await
        .expect_err("Registered the same email twice");
    assert_eq!(
        duplicated.backend_error().map(|error| error.code.clone()),
        Some(BackendErrorCode::UserExists)
    );
}

#[tokio::test]
/// Anonymous visitor of the web front end
/// Home redirects to sign in, library reads require authentication
/// Login with unknown credentials is reported with the mapped message
async fn web_anonymous_e2e_test() {
    let client = web_client();

    let home = client
        .get(format!("{WEB_URL}/"))
        .send()
        .await
        .expect("Failed to get home");
    assert_eq!(home.status(), StatusCode::SEE_OTHER);
    assert_eq!(home.headers()[LOCATION], "/sign-in");

    let my_books: ActionResponse<Vec<SimpleBook>> = client
        .get(format!("{WEB_URL}/api/my-books"))
        .send()
        .await
        .expect("Failed to get books")
        .json()
        .await
        .expect("Failed to decode response");
    assert_eq!(my_books.error_code(), Some("UNAUTHORIZED"));

    let login: ActionResponse = client
        .post(format!("{WEB_URL}/api/auth/login"))
        .json(&json!({ "email": unique_email(), "password": "wrong password" }))
        .send()
        .await
        .expect("Failed to login")
        .json()
        .await
        .expect("Failed to decode response");
    assert_eq!(
        login,
        ActionResponse::error("The email or password is invalid.", "INVALID_CREDENTIALS")
    );
}

#[tokio::test]
/// Register through the web front end, then login
/// The unverified email is reported with the mapped message
async fn web_registration_e2e_test() {
    let client = web_client();
    let email = unique_email();

    let registered: ActionResponse = client
        .post(format!("{WEB_URL}/api/auth/register"))
        .json(&json!({
            "name": "System",
            "email": email,
            "password": "correct horse",
            "confirmPassword": "correct horse"
        }))
        .send()
        .await
        .expect("Failed to register")
        .json()
        .await
        .expect("Failed to decode response");
    assert_eq!(registered, ActionResponse::done("User successfully registered!"));

    let login: ActionResponse = client
        .post(format!("{WEB_URL}/api/auth/login"))
        .json(&json!({ "email": email, "password": "correct horse" }))
        .send()
        .await
        .expect("Failed to login")
        .json()
        .await
        .expect("Failed to decode response");
    assert_eq!(login.error_code(), Some("EMAIL_NOT_VERIFIED"));
}
