use crate::domain::models::GitHubRepo;
use crate::infrastructure::error::GitHubApiError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const GITHUB_API_BASE: &str = "https://api.github.com/";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

// Every call is individually time-bounded so a hung remote can never pin
// the sync status in a loading state.
const USER_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const REPO_LIST_TIMEOUT: Duration = Duration::from_secs(15);
const FILE_READ_TIMEOUT: Duration = Duration::from_secs(15);
const FILE_WRITE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubUser {
    pub login: String,
}

/// A fetched remote file: decoded text content plus the version token
/// (sha) identifying the exact prior content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone)]
pub struct PutFile {
    pub message: String,
    /// Raw text; the client base64-encodes it for the wire.
    pub content: String,
    /// Version token of the content being replaced, when known.
    pub sha: Option<String>,
}

/// Tagged result of an optimistic-concurrency upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Committed { sha: String },
    Conflict,
}

#[async_trait]
pub trait GitHubClient: Send + Sync {
    async fn current_user(&self, access_token: &str) -> Result<GitHubUser, GitHubApiError>;

    async fn list_repositories(
        &self,
        access_token: &str,
    ) -> Result<Vec<GitHubRepo>, GitHubApiError>;

    /// Returns `None` on 404; a missing snapshot is a normal condition.
    async fn fetch_file(
        &self,
        access_token: &str,
        repo_full_name: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, GitHubApiError>;

    async fn put_file(
        &self,
        access_token: &str,
        repo_full_name: &str,
        path: &str,
        request: PutFile,
    ) -> Result<PutOutcome, GitHubApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestGitHubClient {
    client: Client,
}

impl ReqwestGitHubClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), GitHubApiError> {
        if value.trim().is_empty() {
            return Err(GitHubApiError::Payload(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn api_url(segments: &[&str]) -> Result<Url, GitHubApiError> {
        let mut url = Url::parse(GITHUB_API_BASE)
            .map_err(|error| GitHubApiError::Payload(format!("invalid api base url: {error}")))?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| GitHubApiError::Payload("api base URL cannot be a base".to_string()))?;
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    /// `/repos/{owner}/{name}/contents/{path}`; the repo full name is
    /// split so the owner/name separator survives URL encoding.
    fn contents_endpoint(repo_full_name: &str, path: &str) -> Result<Url, GitHubApiError> {
        let mut segments = vec!["repos"];
        segments.extend(repo_full_name.split('/'));
        segments.push("contents");
        segments.push(path);
        Self::api_url(&segments)
    }

    fn status_error(status: StatusCode, body: &str) -> GitHubApiError {
        match status.as_u16() {
            401 => GitHubApiError::Unauthorized,
            403 => GitHubApiError::Forbidden,
            409 => GitHubApiError::Conflict,
            code => GitHubApiError::Status {
                status: code,
                body: body.trim().to_string(),
            },
        }
    }

    fn request_error(error: reqwest::Error, context: &str) -> GitHubApiError {
        if error.is_timeout() {
            return GitHubApiError::Timeout;
        }
        GitHubApiError::Network(format!("{context}: {error}"))
    }

    /// Contents API base64 arrives with embedded newlines; strip all
    /// whitespace before decoding.
    fn decode_content(raw: &str) -> Result<String, GitHubApiError> {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|error| GitHubApiError::Payload(format!("invalid base64 content: {error}")))?;
        String::from_utf8(bytes)
            .map_err(|error| GitHubApiError::Payload(format!("content is not utf-8: {error}")))
    }
}

#[derive(Debug, serde::Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, serde::Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Debug, serde::Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, serde::Deserialize)]
struct PutFileResponse {
    content: Option<PutFileContent>,
}

#[derive(Debug, serde::Deserialize)]
struct PutFileContent {
    sha: Option<String>,
}

#[async_trait]
impl GitHubClient for ReqwestGitHubClient {
    async fn current_user(&self, access_token: &str) -> Result<GitHubUser, GitHubApiError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let response = self
            .client
            .get(Self::api_url(&["user"])?)
            .header("Authorization", format!("token {access_token}"))
            .header("Accept", ACCEPT_HEADER)
            .timeout(USER_LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(|error| Self::request_error(error, "user lookup failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| Self::request_error(error, "failed reading user response"))?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let parsed: UserResponse = serde_json::from_str(&body)
            .map_err(|error| GitHubApiError::Payload(format!("invalid user payload: {error}")))?;
        Ok(GitHubUser {
            login: parsed.login,
        })
    }

    async fn list_repositories(
        &self,
        access_token: &str,
    ) -> Result<Vec<GitHubRepo>, GitHubApiError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let response = self
            .client
            .get(Self::api_url(&["user", "repos"])?)
            .query(&[
                ("type", "private"),
                ("sort", "updated"),
                ("per_page", "100"),
            ])
            .header("Authorization", format!("token {access_token}"))
            .header("Accept", ACCEPT_HEADER)
            .timeout(REPO_LIST_TIMEOUT)
            .send()
            .await
            .map_err(|error| Self::request_error(error, "repository listing failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| Self::request_error(error, "failed reading repository response"))?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|error| GitHubApiError::Payload(format!("invalid repository payload: {error}")))
    }

    async fn fetch_file(
        &self,
        access_token: &str,
        repo_full_name: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, GitHubApiError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(repo_full_name, "repository")?;

        let response = self
            .client
            .get(Self::contents_endpoint(repo_full_name, path)?)
            .header("Authorization", format!("token {access_token}"))
            .header("Accept", ACCEPT_HEADER)
            .timeout(FILE_READ_TIMEOUT)
            .send()
            .await
            .map_err(|error| Self::request_error(error, "file read failed"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|error| Self::request_error(error, "failed reading file response"))?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let parsed: ContentsResponse = serde_json::from_str(&body)
            .map_err(|error| GitHubApiError::Payload(format!("invalid file payload: {error}")))?;
        let raw = parsed.content.unwrap_or_default();
        Ok(Some(RemoteFile {
            content: Self::decode_content(&raw)?,
            sha: parsed.sha,
        }))
    }

    async fn put_file(
        &self,
        access_token: &str,
        repo_full_name: &str,
        path: &str,
        request: PutFile,
    ) -> Result<PutOutcome, GitHubApiError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(repo_full_name, "repository")?;

        let body = PutFileRequest {
            message: &request.message,
            content: BASE64.encode(request.content.as_bytes()),
            sha: request.sha.as_deref(),
        };

        let response = self
            .client
            .put(Self::contents_endpoint(repo_full_name, path)?)
            .header("Authorization", format!("token {access_token}"))
            .header("Accept", ACCEPT_HEADER)
            .timeout(FILE_WRITE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|error| Self::request_error(error, "file write failed"))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Ok(PutOutcome::Conflict);
        }
        let body = response
            .text()
            .await
            .map_err(|error| Self::request_error(error, "failed reading write response"))?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let parsed: PutFileResponse = serde_json::from_str(&body)
            .map_err(|error| GitHubApiError::Payload(format!("invalid write payload: {error}")))?;
        let sha = parsed
            .content
            .and_then(|content| content.sha)
            .filter(|sha| !sha.trim().is_empty())
            .ok_or_else(|| {
                GitHubApiError::Payload("write response did not include a sha".to_string())
            })?;
        Ok(PutOutcome::Committed { sha })
    }
}
