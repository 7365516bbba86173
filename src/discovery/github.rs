//! GitHub repository listing
//!
//! API endpoint: {endpoint}/user/repos or {endpoint}/users/{owner}/repos

use crate::discovery::{DiscoveryFilter, Discoverer};
use crate::domain::Repository;
use crate::error::DiscoveryError;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// GitHub REST API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// Repositories requested per page
const PER_PAGE: usize = 100;

const PLATFORM: &str = "github";

/// GitHub repository as returned by the list endpoints
#[derive(Debug, Clone, Deserialize)]
struct GitHubRepo {
    name: String,
    full_name: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Lists repositories visible to the token, or owned by a user or organization
pub struct GitHubDiscoverer {
    client: HttpClient,
    endpoint: String,
    token: String,
    owner: String,
    filter: DiscoveryFilter,
}

impl GitHubDiscoverer {
    /// Create a new GitHub discoverer; an empty endpoint means github.com
    pub fn new(
        client: HttpClient,
        endpoint: &str,
        token: impl Into<String>,
        owner: impl Into<String>,
        filter: DiscoveryFilter,
    ) -> Self {
        let endpoint = if endpoint.is_empty() {
            GITHUB_API_URL
        } else {
            endpoint
        };
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
            owner: owner.into(),
            filter,
        }
    }

    /// Build the list URL
    fn list_url(&self) -> String {
        if self.owner.is_empty() {
            format!("{}/user/repos", self.endpoint)
        } else {
            format!("{}/users/{}/repos", self.endpoint, self.owner)
        }
    }

    /// Keep the repositories passing the topic and name filters
    fn select(&self, repos: Vec<GitHubRepo>) -> Vec<Repository> {
        repos
            .into_iter()
            .filter(|r| self.filter.matches_topics(&r.topics))
            .filter(|r| self.filter.matches_name(&r.name))
            .map(|r| Repository::new(r.full_name).with_platform(PLATFORM))
            .collect()
    }
}

#[async_trait]
impl Discoverer for GitHubDiscoverer {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    async fn discover(&self) -> Result<Vec<Repository>, DiscoveryError> {
        let url = self.list_url();
        let mut found = Vec::new();

        for page in 1.. {
            let query = [("per_page", PER_PAGE.to_string()), ("page", page.to_string())];
            let listing = self
                .client
                .get_page::<GitHubRepo, _>(PLATFORM, |client| {
                    let request = client
                        .get(&url)
                        .query(&query)
                        .header(reqwest::header::ACCEPT, "application/vnd.github+json");
                    if self.token.is_empty() {
                        request
                    } else {
                        request.bearer_auth(&self.token)
                    }
                })
                .await?;

            let count = listing.items.len();
            debug!(page, count, "Listed GitHub repositories");
            found.extend(self.select(listing.items));
            if count < PER_PAGE {
                break;
            }
        }

        Ok(found)
    }
}
