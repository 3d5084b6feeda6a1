use crate::actions::ServerActions;
use crate::api::{ActionResponse, SimpleBook};
use crate::error_normalizer::GENERIC_ERROR_CODE;
use crate::parallel_action::ParallelAction;

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to fetch books";

impl ServerActions {
    /// Searches the public catalog, an empty query finds nothing without calling it
    pub fn search_book<'a>(&'a self, query: &'a str) -> ParallelAction<'a, ActionResponse<Vec<SimpleBook>>> {
        ParallelAction::new(async move {
            let query = query.trim();
            if query.is_empty() {
                return ActionResponse::success("Books found!", vec![]);
            }

            match self.google_books.search(query).await {
                Ok(books) => ActionResponse::success("Books found!", books),
                Err(err) => {
                    tracing::error!("Google Books search for '{}' failed {}", query, err);
                    ActionResponse::error(SEARCH_FAILED_MESSAGE, GENERIC_ERROR_CODE)
                }
            }
        })
    }
}

#[cfg(test)]
mod search_tests {
    use std::sync::Arc;

    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;

    use crate::actions::test_support::TestBackend;
    use crate::actions::{ServerActions, SEARCH_FAILED_MESSAGE};
    use crate::api::ActionResponse;
    use crate::google_books::GoogleBooksClient;

    async fn volumes(query: web::Query<std::collections::HashMap<String, String>>) -> HttpResponse {
        assert_eq!(query.get("maxResults").map(String::as_str), Some("20"));
        assert_eq!(query.get("orderBy").map(String::as_str), Some("relevance"));
        HttpResponse::Ok().json(json!({
            "items": [
                {
                    "id": "dune",
                    "volumeInfo": {
                        "title": query.get("q").cloned().unwrap_or_default(),
                        "authors": ["Frank Herbert"],
                        "pageCount": 412,
                        "industryIdentifiers": [{ "type": "ISBN_10", "identifier": "0441013597" }]
                    }
                },
                { "id": "pamphlet", "volumeInfo": { "title": "Pamphlet", "authors": ["Anon"] } }
            ]
        }))
    }

    /// Actions searching a fake catalog served in process
    fn with_fake_catalog() -> ServerActions {
        let server = HttpServer::new(|| App::new().route("/books/v1/volumes", web::get().to(volumes)))
            .bind(("127.0.0.1", 0))
            .unwrap();
        let address = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let catalog = GoogleBooksClient::new(&format!("http://{address}"), Some("key".to_string()))
            .unwrap();
        let backend = TestBackend::start();
        ServerActions {
            google_books: Arc::new(catalog),
            ..backend.actions
        }
    }

    #[actix_web::test]
    async fn search_returns_addable_books() {
        let actions = with_fake_catalog();

        let response = actions.search_book("  Dune ").await;
        assert_eq!(response.details(), "Books found!");
        let books = response.into_data().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].isbn10, "0441013597");
    }

    #[actix_web::test]
    async fn empty_query_finds_nothing() {
        let backend = TestBackend::start();
        assert_eq!(
            backend.actions.search_book("   ").await,
            ActionResponse::success("Books found!", vec![])
        );
    }

    #[actix_web::test]
    async fn unreachable_catalog_fails() {
        let backend = TestBackend::start();
        assert_eq!(
            backend.actions.search_book("dune").await,
            ActionResponse::error(SEARCH_FAILED_MESSAGE, "ERROR")
        );
    }
}
