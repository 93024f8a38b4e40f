//! Package search on libraries.io.
//!
//! The search endpoint returns one page of projects as a JSON array; the
//! total number of matches comes in the `total` response header.

use std::fmt;

use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

use crate::services::{ServiceError, check_status};

/// Results returned per page.
pub const RESULTS_PER_PAGE: u32 = 10;

/// Package registries that can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Bower,
    Npm,
    Cargo,
}

impl Platform {
    /// Identifier used by the libraries.io `platforms` filter.
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Bower => "bower",
            Platform::Npm => "npm",
            Platform::Cargo => "cargo",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Bower => write!(f, "Bower"),
            Platform::Npm => write!(f, "npm"),
            Platform::Cargo => write!(f, "crates.io"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stars: u64,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub projects: Vec<Project>,
    /// Number of matches over all pages
    pub total: u64,
}

impl SearchPage {
    /// Matches left after page `page`.
    pub fn remaining(&self, page: u32) -> u64 {
        self.total
            .saturating_sub(u64::from(page) * u64::from(RESULTS_PER_PAGE))
    }
}

#[automock]
pub trait PackageSearcher {
    /// Searches `query` on `platform`, `page` starts at 1.
    async fn search(
        &self,
        platform: Platform,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, ServiceError>;
}

pub struct LibrariesIoRequester {
    url: String,
    api_key: String,
    client: Client,
}

impl LibrariesIoRequester {
    /// Create a new [LibrariesIoRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - Base url, `https://libraries.io` in production
    /// * `api_key` - libraries.io API key
    pub fn new(url: &str, api_key: &str) -> Self {
        LibrariesIoRequester {
            url: url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            client: Client::new(),
        }
    }
}

impl PackageSearcher for LibrariesIoRequester {
    async fn search(
        &self,
        platform: Platform,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, ServiceError> {
        info!("search \"{query}\" on {platform}, page {page}");

        let url = format!("{}/api/search", self.url);
        let page = page.to_string();
        let per_page = RESULTS_PER_PAGE.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("platforms", platform.key()),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = check_status(response)?;

        let total = response_total(&response);
        let projects: Vec<Project> = response.json().await?;
        let total = total.unwrap_or(projects.len() as u64);

        debug!("{} projects on this page, {total} in total", projects.len());
        Ok(SearchPage { projects, total })
    }
}

fn response_total(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("total")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_remaining() {
        let page = SearchPage {
            projects: vec![],
            total: 25,
        };
        assert_eq!(page.remaining(1), 15);
        assert_eq!(page.remaining(2), 5);
        assert_eq!(page.remaining(3), 0);
        assert_eq!(page.remaining(10), 0);
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Cargo.key(), "cargo");
        assert_eq!(Platform::Cargo.to_string(), "crates.io");
        assert_eq!(Platform::Bower.to_string(), "Bower");
        assert_eq!(Platform::Npm.key(), "npm");
    }

    #[tokio::test]
    async fn test_search() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".to_owned(), "serde".to_owned()),
                Matcher::UrlEncoded("platforms".to_owned(), "cargo".to_owned()),
                Matcher::UrlEncoded("page".to_owned(), "2".to_owned()),
                Matcher::UrlEncoded("per_page".to_owned(), "10".to_owned()),
                Matcher::UrlEncoded("api_key".to_owned(), "key".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("total", "42")
            .with_body(
                r#"[{"name": "serde", "description": "A serialization framework", "homepage": "https://serde.rs", "language": "Rust", "stars": 9000, "platform": "Cargo"},
                    {"name": "serde_json", "description": null, "homepage": null, "language": null, "stars": 0}]"#,
            )
            .create_async()
            .await;

        let requester = LibrariesIoRequester::new(&server.url(), "key");
        let page = requester.search(Platform::Cargo, "serde", 2).await.unwrap();

        assert_eq!(page.total, 42);
        assert_eq!(page.projects.len(), 2);
        assert_eq!(page.projects[0].language.as_deref(), Some("Rust"));
        assert_eq!(page.projects[0].stars, 9000);
        assert_eq!(page.projects[1].description, None);
    }

    #[tokio::test]
    async fn test_search_without_total_header() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"name": "left-pad"}]"#)
            .create_async()
            .await;

        let requester = LibrariesIoRequester::new(&server.url(), "key");
        let page = requester.search(Platform::Npm, "pad", 1).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.remaining(1), 0);
    }

    #[tokio::test]
    async fn test_search_forbidden() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let requester = LibrariesIoRequester::new(&server.url(), "bad");
        let result = requester.search(Platform::Bower, "jquery", 1).await;
        assert!(matches!(
            result,
            Err(ServiceError::Status(reqwest::StatusCode::FORBIDDEN))
        ));
    }
}
