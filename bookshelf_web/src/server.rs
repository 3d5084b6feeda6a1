use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer};
use anyhow::Context;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;

use bookshelf_backend::client::BookshelfBackendClient;

use crate::action_state::BookControls;
use crate::actions::ServerActions;
use crate::app_config::config_app;
use crate::google_books::GoogleBooksClient;
use crate::query_cache::LibraryCache;
use crate::settings::WebSettings;

/// Everything the web handlers share
#[derive(Clone)]
pub struct WebState {
    pub actions: ServerActions,
    pub cache: Arc<LibraryCache>,
    pub controls: BookControls,
}

impl WebState {
    pub fn from_settings(settings: &WebSettings) -> anyhow::Result<Self> {
        let backend = BookshelfBackendClient::new(&settings.backend_url)
            .context("Failed to create backend client")?;
        let google_books = GoogleBooksClient::new(
            &settings.google_books_url,
            settings.google_books_api_key.clone(),
        )
        .context("Failed to create Google Books client")?;

        Ok(Self {
            actions: ServerActions::new(Arc::new(backend), Arc::new(google_books)),
            cache: Arc::new(LibraryCache::new(
                settings.my_books_stale_time(),
                settings.search_stale_time(),
            )),
            controls: BookControls::default(),
        })
    }
}

/// Binds the web http server, returns the server future and the address it listens on
pub fn start_server(state: WebState, address: (&str, u16)) -> anyhow::Result<(Server, SocketAddr)> {
    let http_server = HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(state.actions.clone()))
            .app_data(web::Data::from(state.cache.clone()))
            .app_data(web::Data::new(state.controls.clone()))
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(address)
    .context("Failed to bind web server")?;

    let bound_address = *http_server
        .addrs()
        .first()
        .context("Web server bound to no address")?;

    Ok((http_server.run(), bound_address))
}

#[cfg(test)]
mod web_server_tests {
    use std::sync::Arc;

    use reqwest::header::{LOCATION, SET_COOKIE};
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    use bookshelf_backend::api::SESSION_COOKIE_NAME;
    use bookshelf_backend::mailer::{token_from_email, EmailTemplates, InMemoryMailer};
    use bookshelf_backend::server::BackendState;

    use super::*;

    struct Deployment {
        url: String,
        mailer: Arc<InMemoryMailer>,
        client: reqwest::Client,
    }

    /// Backend stand-in and web front end, both in process
    fn deploy() -> Deployment {
        let mailer = Arc::new(InMemoryMailer::default());
        let backend_state = BackendState::in_memory(
            mailer.clone(),
            EmailTemplates::new("Book Inventory <books@example.com>", "http://localhost:8080"),
        );
        let (backend, backend_address) =
            bookshelf_backend::server::start_server(backend_state, ("127.0.0.1", 0)).unwrap();
        actix_web::rt::spawn(backend);

        let settings = WebSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            backend_url: format!("http://{backend_address}"),
            google_books_url: "http://127.0.0.1:1".to_string(),
            google_books_api_key: None,
            search_stale_secs: 43200,
            my_books_stale_secs: 60,
        };
        let state = WebState::from_settings(&settings).unwrap();
        let (web, web_address) = start_server(state, ("127.0.0.1", 0)).unwrap();
        actix_web::rt::spawn(web);

        Deployment {
            url: format!("http://{web_address}"),
            mailer,
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        }
    }

    impl Deployment {
        async fn post(&self, path: &str, body: Value, cookie: Option<&str>) -> reqwest::Response {
            let mut request = self.client.post(format!("{}{}", self.url, path)).json(&body);
            if let Some(cookie) = cookie {
                request = request.header(reqwest::header::COOKIE, cookie);
            }
            request.send().await.unwrap()
        }

        async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
            let mut request = self.client.get(format!("{}{}", self.url, path));
            if let Some(cookie) = cookie {
                request = request.header(reqwest::header::COOKIE, cookie);
            }
            request.send().await.unwrap()
        }

        async fn patch(&self, path: &str, body: Value, cookie: &str) -> Value {
            self.client
                .patch(format!("{}{}", self.url, path))
                .header(reqwest::header::COOKIE, cookie)
                .json(&body)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap()
        }

        async fn delete(&self, path: &str, cookie: &str) -> Value {
            self.client
                .delete(format!("{}{}", self.url, path))
                .header(reqwest::header::COOKIE, cookie)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap()
        }

        async fn get_json(&self, path: &str, cookie: &str) -> Value {
            self.get(path, Some(cookie)).await.json().await.unwrap()
        }
    }

    #[actix_web::test]
    async fn sign_up_and_manage_library_over_http() {
        // Steps:
        // 1. Anonymous home visit is redirected to sign in
        // 2. Register, follow the verification link, login, a session cookie is set
        // 3. Home redirects to search while the library is empty
        // 4. Add a book, the cached library is refreshed and home redirects to the library
        // 5. Update the read status, the cached library shows it
        // 6. Remove the book, the cached library is empty again
        // 7. Logout clears the cookie
        let deployment = deploy();

        let home = deployment.get("/", None).await;
        assert_eq!(home.status(), StatusCode::SEE_OTHER);
        assert_eq!(home.headers()[LOCATION], "/sign-in");

        let registered: Value = deployment
            .post(
                "/api/auth/register",
                json!({
                    "name": "Reader",
                    "email": "http@example.com",
                    "password": "correct horse",
                    "confirmPassword": "correct horse"
                }),
                None,
            )
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(registered["status"], "success");

        let email = deployment.mailer.last_sent_to("http@example.com").unwrap();
        let token = token_from_email(&email).unwrap();
        let verified = deployment
            .get(&format!("/verify-email?token={token}"), None)
            .await;
        assert_eq!(verified.status(), StatusCode::SEE_OTHER);
        assert_eq!(verified.headers()[LOCATION], "/sign-in");

        let login = deployment
            .post(
                "/api/auth/login",
                json!({ "email": "http@example.com", "password": "correct horse" }),
                None,
            )
            .await;
        let set_cookie = login.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        let body: Value = login.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "status": "success", "details": "User successfully logged in!" })
        );

        let home = deployment.get("/", Some(&cookie)).await;
        assert_eq!(home.headers()[LOCATION], "/search");

        let empty: Value = deployment
            .get("/api/my-books", Some(&cookie))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(empty["data"], json!([]));

        let added: Value = deployment
            .post(
                "/api/books",
                json!({
                    "book": {
                        "id": "google-id",
                        "title": "Dune",
                        "isbn13": "9780441013593",
                        "pageCount": 412,
                        "authors": ["Frank Herbert"]
                    },
                    "readStatus": "READING"
                }),
                Some(&cookie),
            )
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(added["details"], "Book successfully added!");

        let listed: Value = deployment
            .get("/api/my-books", Some(&cookie))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(listed["data"][0]["title"], "Dune");
        assert_eq!(listed["data"][0]["readStatus"], "READING");

        let portfolio: Value = deployment
            .get("/api/portfolio", Some(&cookie))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(
            portfolio["data"],
            json!({ "unread": 0, "reading": 1, "read": 0, "total": 1 })
        );

        let home = deployment.get("/", Some(&cookie)).await;
        assert_eq!(home.headers()[LOCATION], "/my-books");

        let book_id = listed["data"][0]["id"].as_str().unwrap().to_string();
        let updated = deployment
            .patch(
                &format!("/api/books/{book_id}"),
                json!({ "readStatus": "READ" }),
                &cookie,
            )
            .await;
        assert_eq!(updated["details"], "Book successfully updated!");
        let listed = deployment.get_json("/api/my-books", &cookie).await;
        assert_eq!(listed["data"][0]["readStatus"], "READ");
        assert_eq!(
            deployment
                .get_json(&format!("/api/books/{book_id}/state"), &cookie)
                .await,
            json!({ "state": "success", "details": "Book successfully updated!" })
        );

        let removed = deployment
            .delete(&format!("/api/books/{book_id}"), &cookie)
            .await;
        assert_eq!(removed["details"], "Book successfully removed!");
        let listed = deployment.get_json("/api/my-books", &cookie).await;
        assert_eq!(listed["data"], json!([]));
        let portfolio = deployment.get_json("/api/portfolio", &cookie).await;
        assert_eq!(portfolio["data"]["total"], 0);
        assert_eq!(
            deployment.get("/", Some(&cookie)).await.headers()[LOCATION],
            "/search"
        );

        let logout = deployment.post("/api/auth/logout", json!({}), Some(&cookie)).await;
        let cleared = logout.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cleared.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
        let body: Value = logout.json().await.unwrap();
        assert_eq!(body["details"], "User successfully logged out!");

        let user: Value = deployment
            .get("/api/user", Some(&cookie))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(user["errorCode"], "UNAUTHORIZED");
    }

    #[actix_web::test]
    async fn anonymous_requests_get_error_envelopes() {
        let deployment = deploy();

        let response = deployment.get("/api/my-books", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "status": "error",
                "details": "User authentication required.",
                "errorCode": "UNAUTHORIZED"
            })
        );

        let search: Value = deployment
            .get("/api/search?q=%20%20", None)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(search["data"], json!([]));

        let state: Value = deployment
            .get("/api/books/1/state", None)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(state, json!({ "state": "idle" }));

        let failed: Value = deployment
            .get("/api/search?q=dune", None)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(failed["details"], "Failed to fetch books");

        assert_eq!(
            deployment.get("/health", None).await.status(),
            StatusCode::OK
        );
    }
}
