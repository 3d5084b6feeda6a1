use anyhow::Context;
use itertools::Itertools;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

use bookshelf_backend::api::ReadStatus;

use crate::api::SimpleBook;

pub const MAX_RESULTS: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum GoogleBooksError {
    #[error("Request to Google Books failed {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Google Books responded with {0}")]
    Status(StatusCode),

    #[error("Failed to decode Google Books response {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleBookResponse {
    #[serde(default)]
    pub items: Vec<GoogleVolume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolume {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
}

impl VolumeInfo {
    fn identifier(&self, kind: &str) -> String {
        self.industry_identifiers
            .iter()
            .find(|identifier| identifier.kind == kind)
            .map(|identifier| identifier.identifier.clone())
            .unwrap_or_default()
    }
}

impl From<GoogleVolume> for SimpleBook {
    fn from(volume: GoogleVolume) -> Self {
        let isbn10 = volume.volume_info.identifier("ISBN_10");
        let isbn13 = volume.volume_info.identifier("ISBN_13");
        let info = volume.volume_info;

        SimpleBook {
            id: volume.id,
            title: info.title,
            subtitle: info.subtitle.unwrap_or_default(),
            description: info.description.unwrap_or_default(),
            publisher: info.publisher.unwrap_or_default(),
            published_date: info.published_date.unwrap_or_default(),
            isbn10,
            isbn13,
            page_count: info.page_count,
            image: info
                .image_links
                .and_then(|links| links.thumbnail)
                .unwrap_or_default(),
            authors: info.authors,
            categories: info.categories,
            read_status: Some(ReadStatus::Unread),
        }
    }
}

/// Projects catalog volumes to books that can be added to a library:
/// at least one author, a page count and an ISBN. Duplicated volumes are dropped
pub fn to_simple_books(response: GoogleBookResponse) -> Vec<SimpleBook> {
    response
        .items
        .into_iter()
        .map(SimpleBook::from)
        .filter(|book| !book.authors.is_empty() && book.page_count > 0 && book.isbn().is_some())
        .unique_by(|book| book.id.clone())
        .collect()
}

pub struct GoogleBooksClient {
    url: String,
    api_key: Option<String>,
    client: ClientWithMiddleware,
}

impl GoogleBooksClient {
    pub fn new(url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Calls GET /books/v1/volumes ordered by relevance
    pub async fn search(&self, query: &str) -> Result<Vec<SimpleBook>, GoogleBooksError> {
        let mut request = self
            .client
            .get(format!("{}/books/v1/volumes", self.url))
            .query(&[("q", query)]);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("key", api_key)]);
        }
        let response = request
            .query(&[("maxResults", MAX_RESULTS.to_string().as_str()), ("orderBy", "relevance")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleBooksError::Status(status));
        }

        let body: GoogleBookResponse = response.json().await.map_err(GoogleBooksError::Decode)?;
        Ok(to_simple_books(body))
    }
}
