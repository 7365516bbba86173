//! GitLab project listing
//!
//! API endpoint: {endpoint}/projects (endpoint defaults to https://gitlab.com/api/v4)

use crate::discovery::{DiscoveryFilter, Discoverer};
use crate::domain::Repository;
use crate::error::DiscoveryError;
use crate::http::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

/// GitLab REST API base URL
const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// Projects requested per page
const PER_PAGE: usize = 100;

const PLATFORM: &str = "gitlab";

/// GitLab project in the `simple` representation
#[derive(Debug, Clone, Deserialize)]
struct GitLabProject {
    name: String,
    path_with_namespace: String,
}

/// Lists projects the token is a member of
pub struct GitLabDiscoverer {
    client: HttpClient,
    endpoint: String,
    token: String,
    owner: String,
    filter: DiscoveryFilter,
}

/// Read the next page number from the `x-next-page` header
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl GitLabDiscoverer {
    /// Create a new GitLab discoverer; an empty endpoint means gitlab.com
    pub fn new(
        client: HttpClient,
        endpoint: &str,
        token: impl Into<String>,
        owner: impl Into<String>,
        filter: DiscoveryFilter,
    ) -> Self {
        let endpoint = if endpoint.is_empty() {
            GITLAB_API_URL
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

    /// Query parameters for one page; topics are filtered server-side
    fn query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("simple", "true".to_string()),
            ("membership", "true".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ];
        if !self.filter.topics().is_empty() {
            query.push(("topic", self.filter.topics().join(",")));
        }
        query
    }

    /// Keep the projects under the owner that pass the name filters
    fn select(&self, projects: Vec<GitLabProject>) -> Vec<Repository> {
        let prefix = format!("{}/", self.owner);
        projects
            .into_iter()
            .filter(|p| self.owner.is_empty() || p.path_with_namespace.starts_with(&prefix))
            .filter(|p| self.filter.matches_name(&p.name))
            .map(|p| Repository::new(p.path_with_namespace).with_platform(PLATFORM))
            .collect()
    }
}

#[async_trait]
impl Discoverer for GitLabDiscoverer {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    async fn discover(&self) -> Result<Vec<Repository>, DiscoveryError> {
        let url = format!("{}/projects", self.endpoint);
        let mut found = Vec::new();
        let mut page = 1;

        loop {
            let query = self.query(page);
            let listing = self
                .client
                .get_page::<GitLabProject, _>(PLATFORM, |client| {
                    let request = client.get(&url).query(&query);
                    if self.token.is_empty() {
                        request
                    } else {
                        request.header("PRIVATE-TOKEN", self.token.as_str())
                    }
                })
                .await?;

            let count = listing.items.len();
            debug!(page, count, "Listed GitLab projects");
            found.extend(self.select(listing.items));

            match next_page(&listing.headers) {
                Some(next) if next > page => page = next,
                Some(_) => break,
                None if count == PER_PAGE && !listing.headers.contains_key("x-next-page") => {
                    page += 1
                }
                None => break,
            }
        }

        Ok(found)
    }
}
