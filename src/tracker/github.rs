use reqwest::{
    StatusCode,
    blocking::Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::instrument;

use super::{IssueTracker, TrackerError};
use crate::domain::{IssueInfo, TrackerConfig};

const PAGE_SIZE: usize = 100;

/// A client for the issues of one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: Client,
    api_url: String,
    repository: String,
}

/// An issue or pull request as returned by the GitHub REST API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubIssue {
    number: u64,
    title: String,
    html_url: String,
}

impl IssueInfo for GitHubIssue {
    fn number(&self) -> u64 {
        self.number
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.html_url
    }
}

impl GitHub {
    /// Create a client authenticating with the token in the configured
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingToken`] if the variable is unset or
    /// empty.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| TrackerError::MissingToken(config.token_env.clone()))?;

        Self::new(&config.api_url, &config.repository, token.trim())
    }

    /// Create a client for `repository` (`owner/name`) at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(api_url: &str, repository: &str, token: &str) -> Result<Self, TrackerError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| TrackerError::InvalidToken)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        })
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_url, self.repository)
    }
}

impl IssueTracker for GitHub {
    type Issue = GitHubIssue;

    #[instrument(level = "debug", skip(self), fields(repository = %self.repository))]
    fn issues(&self, include_closed: bool) -> Result<Vec<GitHubIssue>, TrackerError> {
        let state = if include_closed { "all" } else { "open" };
        let url = self.issues_url();
        let per_page = PAGE_SIZE.to_string();
        let mut issues = Vec::new();

        for page in 1_u32.. {
            let batch: Vec<GitHubIssue> = self
                .client
                .get(&url)
                .query(&[("state", state), ("per_page", per_page.as_str())])
                .query(&[("page", page)])
                .send()?
                .error_for_status()?
                .json()?;

            tracing::trace!("Page {page} has {} issues", batch.len());
            let last = batch.len() < PAGE_SIZE;
            issues.extend(batch);
            if last {
                break;
            }
        }

        tracing::info!("Fetched {} issues from {}", issues.len(), self.repository);
        Ok(issues)
    }

    #[instrument(level = "debug", skip(self))]
    fn issue(&self, number: u64) -> Result<Option<GitHubIssue>, TrackerError> {
        let response = self
            .client
            .get(format!("{}/{number}", self.issues_url()))
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(response.error_for_status()?.json()?))
    }
}
