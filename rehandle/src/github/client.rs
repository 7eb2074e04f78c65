use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::rate_limit::{self, QuotaExhausted};
use super::service::HostingService;
use super::types::{
    AuthenticatedUser, CommitRecord, ContentResponse, FileContent, PendingEdit, RepositoryMetadata,
    RepositoryRef, TreeEntry, TreeResponse, WriteResponse,
};
use crate::config::{Config, GitHubConfig, RetryConfig};
use crate::error::{RehandleError, Result};
use crate::pacing::{Pacer, Pause};

const API_VERSION: &str = "2022-11-28";

/// GitHub REST client that waits out exhausted quotas and retries.
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    token: Option<String>,
    per_page: u32,
    retry: RetryConfig,
    pacer: Pacer,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, retry: RetryConfig, pacer: Pacer) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_base = Url::parse(&config.api_base)?;
        if api_base.cannot_be_a_base() {
            return Err(RehandleError::Config(format!(
                "github.api_base is not a usable base URL: {}",
                config.api_base
            )));
        }

        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        Ok(Self {
            client,
            api_base,
            token,
            per_page: config.per_page,
            retry,
            pacer,
        })
    }

    pub fn from_config(config: &Config, pacer: Pacer) -> Result<Self> {
        Self::new(&config.github, config.retry.clone(), pacer)
    }

    /// Build an API URL from raw path segments; each one is percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RehandleError::Config(format!("cannot append to API base {}", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url> {
        self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.split('/').filter(|s| !s.is_empty())),
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, sleeping through exhausted quotas and retrying.
    ///
    /// Non-rate-limit failures are handed back untouched so callers can map
    /// their status codes.
    async fn execute_with_retry<F>(&self, request_fn: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            let response = self.authorize(request_fn()).send().await?;
            let status = response.status();

            if let Some(left) = rate_limit::remaining(response.headers()) {
                tracing::debug!("{} {} (quota left: {})", status.as_u16(), response.url(), left);
            }

            if status.is_success() {
                return Ok(response);
            }

            let now = Utc::now().timestamp();
            let Some(quota) = QuotaExhausted::detect(status, response.headers(), now) else {
                return Ok(response);
            };

            if attempt >= self.retry.max_retries || quota.wait > self.retry.max_wait() {
                return Err(RehandleError::RateLimited {
                    reset_in_secs: quota.wait.as_secs(),
                });
            }
            attempt += 1;

            let wait = quota.wait.saturating_add(self.retry.safety_margin());
            tracing::warn!(
                "Rate limit exceeded. Waiting {} minute(s) before retry {}/{}",
                wait.as_secs().div_ceil(60),
                attempt,
                self.retry.max_retries
            );
            self.pacer.wait(wait).await;
        }
    }

    /// Turn a non-success response into a transport error carrying GitHub's message.
    async fn failure(response: Response) -> RehandleError {
        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status));

        RehandleError::Transport { status, message }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .execute_with_retry(|| self.client.get(url.clone()))
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl HostingService for GitHubClient {
    async fn verify_auth(&self) -> Result<AuthenticatedUser> {
        if self.token.is_none() {
            return Err(RehandleError::Auth("no GitHub token configured".to_string()));
        }

        let url = self.endpoint(["user"])?;
        let response = self
            .execute_with_retry(|| self.client.get(url.clone()))
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RehandleError::Auth(Self::failure(response).await.to_string()))
            }
            _ => Err(Self::failure(response).await),
        }
    }

    async fn list_all_repositories(&self) -> Result<Vec<RepositoryRef>> {
        let mut repos = Vec::new();
        let mut page = 1u32;

        loop {
            let mut url = self.endpoint(["user", "repos"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &self.per_page.to_string())
                .append_pair("page", &page.to_string())
                .append_pair("sort", "updated")
                .append_pair("direction", "desc");

            let batch: Vec<RepositoryRef> = self.get_json(url).await?;
            let has_more = batch.len() == self.per_page as usize;
            tracing::debug!("Repository page {}: {} entries", page, batch.len());
            repos.extend(batch);

            if !has_more {
                break;
            }
            page += 1;
            self.pacer.pause(Pause::ListingPage).await;
        }

        Ok(repos)
    }

    async fn list_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>> {
        let metadata: RepositoryMetadata = self.get_json(self.endpoint(["repos", owner, repo])?).await?;

        let mut url = self.endpoint(
            ["repos", owner, repo, "git", "trees"]
                .into_iter()
                .chain(metadata.default_branch.split('/')),
        )?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self
            .execute_with_retry(|| self.client.get(url.clone()))
            .await?;

        // GitHub answers 409 for a repository without any commits.
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("{}/{} is empty", owner, repo);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let tree: TreeResponse = response.json().await?;
        if tree.truncated {
            tracing::warn!(
                "Tree of {}/{} was truncated by GitHub; some files will not be scanned",
                owner,
                repo
            );
        }

        Ok(tree.tree.into_iter().filter(TreeEntry::is_blob).collect())
    }

    async fn read_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<FileContent>> {
        let data: ContentResponse = self.get_json(self.contents_url(owner, repo, path)?).await?;

        let encoding = data.encoding.unwrap_or_default();
        if encoding != "base64" {
            tracing::warn!("{}: unsupported encoding '{}'", path, encoding);
            return Ok(None);
        }

        // GitHub wraps the payload at 60 columns.
        let payload: String = data
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| RehandleError::Decode(format!("{}: {}", path, e)))?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(FileContent {
                path: data.path,
                text,
                sha: data.sha,
                encoding,
            })),
            Err(_) => {
                tracing::warn!("{}: not valid UTF-8, treating as binary", path);
                Ok(None)
            }
        }
    }

    async fn write_file(
        &self,
        owner: &str,
        repo: &str,
        edit: &PendingEdit,
        message: &str,
    ) -> Result<CommitRecord> {
        let url = self.contents_url(owner, repo, &edit.path)?;
        let body = json!({
            "message": message,
            "content": STANDARD.encode(edit.content.as_bytes()),
            "sha": edit.sha,
        });

        let response = self
            .execute_with_retry(|| self.client.put(url.clone()).json(&body))
            .await?;
        let status = response.status();

        if status.is_success() {
            let written: WriteResponse = response.json().await?;
            return Ok(written.into());
        }

        if status == StatusCode::CONFLICT {
            return Err(RehandleError::Conflict {
                path: edit.path.clone(),
            });
        }

        match Self::failure(response).await {
            RehandleError::Transport { status: 422, message }
                if message.to_lowercase().contains("sha") =>
            {
                Err(RehandleError::Conflict {
                    path: edit.path.clone(),
                })
            }
            other => Err(other),
        }
    }
}
