use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, RedmineErrorCode};
use crate::models::activity::IssueId;
use crate::models::redmine::{
    Issue, IssueEnvelope, Project, ProjectEnvelope, TimeEntry, TimeEntryPage,
};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read access to the Redmine resources the collector needs.
#[async_trait]
pub trait RedmineSource: Send + Sync {
    async fn get_project(&self, identifier: &str) -> AppResult<Project>;

    async fn list_time_entries(&self, project_id: u64, from: NaiveDate)
        -> AppResult<Vec<TimeEntry>>;

    async fn get_issue_with_journals(&self, issue_id: IssueId) -> AppResult<Issue>;
}

#[derive(Clone, PartialEq, Eq)]
pub enum RedmineCredentials {
    Basic { user: String, password: String },
    ApiKey(String),
    Anonymous,
}

impl std::fmt::Debug for RedmineCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedmineCredentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"********")
                .finish(),
            RedmineCredentials::ApiKey(key) => {
                f.debug_tuple("ApiKey").field(&mask_secret(key)).finish()
            }
            RedmineCredentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedmineClientConfig {
    pub base_url: String,
    pub credentials: RedmineCredentials,
    pub http_timeout: StdDuration,
    pub accept_invalid_certs: bool,
    pub page_size: u32,
    pub retry_delays: Vec<StdDuration>,
}

impl RedmineClientConfig {
    pub fn new(base_url: impl Into<String>, credentials: RedmineCredentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            http_timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
            page_size: DEFAULT_PAGE_SIZE,
            retry_delays: vec![
                StdDuration::from_secs(0),
                StdDuration::from_secs(1),
                StdDuration::from_secs(2),
                StdDuration::from_secs(4),
            ],
        }
    }
}

#[derive(Clone)]
pub struct RedmineClient {
    client: reqwest::Client,
    base_url: String,
    credentials: RedmineCredentials,
    page_size: u32,
    retry_delays: Vec<StdDuration>,
}

impl RedmineClient {
    pub fn try_new(config: RedmineClientConfig) -> AppResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AppError::config("Redmine URL must not be empty"));
        }
        if config.page_size == 0 {
            return Err(AppError::config("page size must be positive"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|err| AppError::other(format!("failed to build Redmine HTTP client: {err}")))?;

        if config.accept_invalid_certs {
            warn!(target: "app::redmine", "TLS certificate verification is disabled");
        }

        let retry_delays = if config.retry_delays.is_empty() {
            vec![StdDuration::from_secs(0)]
        } else {
            config.retry_delays
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            page_size: config.page_size,
            retry_delays,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<AppError> = None;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            if !delay.is_zero() {
                sleep(*delay).await;
            }

            debug!(
                target: "app::redmine",
                %url,
                attempt = attempt + 1,
                correlation_id = %correlation_id,
                "requesting Redmine resource"
            );

            let start = Instant::now();
            let request = self.authorize(self.client.get(&url).query(query));

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        debug!(
                            target: "app::redmine",
                            correlation_id = %correlation_id,
                            latency_ms = start.elapsed().as_millis() as u64,
                            "Redmine responded"
                        );
                        return resp.json::<T>().await.map_err(|err| {
                            AppError::redmine_with_correlation(
                                RedmineErrorCode::InvalidResponse,
                                format!("unexpected Redmine response for {path}: {err}"),
                                Some(correlation_id.as_str()),
                            )
                        });
                    }

                    let (error, retryable) = map_http_error(status, &correlation_id);
                    warn!(
                        target: "app::redmine",
                        correlation_id = %correlation_id,
                        status = status.as_u16(),
                        retryable,
                        "Redmine returned a non-success status"
                    );

                    if !retryable || attempt == self.retry_delays.len() - 1 {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(err) => {
                    let (error, retryable) = error_from_reqwest(err, &correlation_id);
                    warn!(
                        target: "app::redmine",
                        correlation_id = %correlation_id,
                        retryable,
                        "Redmine request failed"
                    );

                    if !retryable || attempt == self.retry_delays.len() - 1 {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::redmine_with_correlation(
                RedmineErrorCode::Unavailable,
                "Redmine request failed",
                Some(correlation_id.as_str()),
            )
        }))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            RedmineCredentials::Basic { user, password } => {
                request.basic_auth(user, Some(password))
            }
            RedmineCredentials::ApiKey(key) => request.header(API_KEY_HEADER, key),
            RedmineCredentials::Anonymous => request,
        }
    }
}

#[async_trait]
impl RedmineSource for RedmineClient {
    async fn get_project(&self, identifier: &str) -> AppResult<Project> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AppError::validation("project identifier must not be empty"));
        }
        let envelope: ProjectEnvelope = self
            .get_json(&format!("/projects/{identifier}.json"), &[])
            .await?;
        Ok(envelope.project)
    }

    async fn list_time_entries(
        &self,
        project_id: u64,
        from: NaiveDate,
    ) -> AppResult<Vec<TimeEntry>> {
        let mut entries = Vec::new();
        let mut offset: u64 = 0;
        let limit = u64::from(self.page_size);

        loop {
            let query = [
                ("project_id", project_id.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ];
            let page: TimeEntryPage = self.get_json("/time_entries.json", &query).await?;
            let received = page.time_entries.len() as u64;
            entries.extend(page.time_entries);
            offset += received;

            let exhausted = match page.total_count {
                Some(total) => offset >= total,
                None => received < limit,
            };
            if received == 0 || exhausted {
                break;
            }
        }

        debug!(
            target: "app::redmine",
            project_id,
            %from,
            count = entries.len(),
            "fetched time entries"
        );
        Ok(entries)
    }

    async fn get_issue_with_journals(&self, issue_id: IssueId) -> AppResult<Issue> {
        let envelope: IssueEnvelope = self
            .get_json(
                &format!("/issues/{issue_id}.json"),
                &[("include", "journals".to_string())],
            )
            .await?;
        Ok(envelope.issue)
    }
}

pub(crate) fn map_http_error(status: StatusCode, correlation_id: &str) -> (AppError, bool) {
    let (code, message, retryable) = match status {
        StatusCode::UNAUTHORIZED => (
            RedmineErrorCode::Unauthorized,
            "Redmine rejected the credentials".to_string(),
            false,
        ),
        StatusCode::FORBIDDEN => (
            RedmineErrorCode::Forbidden,
            "Redmine denied access to the resource".to_string(),
            false,
        ),
        StatusCode::NOT_FOUND => (
            RedmineErrorCode::NotFound,
            "Redmine resource not found".to_string(),
            false,
        ),
        StatusCode::TOO_MANY_REQUESTS => (
            RedmineErrorCode::RateLimited,
            "Redmine is rate limiting requests".to_string(),
            true,
        ),
        status if status.is_server_error() => (
            RedmineErrorCode::Unavailable,
            format!("Redmine is unavailable (status {})", status.as_u16()),
            true,
        ),
        status if status.is_client_error() => (
            RedmineErrorCode::InvalidRequest,
            format!("Redmine rejected the request (status {})", status.as_u16()),
            false,
        ),
        status => (
            RedmineErrorCode::Unknown,
            format!("Redmine returned status {}", status.as_u16()),
            false,
        ),
    };

    (
        AppError::redmine_with_correlation(code, message, Some(correlation_id)),
        retryable,
    )
}

fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> (AppError, bool) {
    if err.is_timeout() {
        (
            AppError::redmine_with_correlation(
                RedmineErrorCode::HttpTimeout,
                "Redmine request timed out",
                Some(correlation_id),
            ),
            true,
        )
    } else if err.is_connect() {
        (
            AppError::redmine_with_correlation(
                RedmineErrorCode::Unavailable,
                format!("cannot connect to Redmine: {err}"),
                Some(correlation_id),
            ),
            true,
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, correlation_id)
    } else {
        (
            AppError::redmine_with_correlation(
                RedmineErrorCode::Unknown,
                format!("Redmine request failed: {err}"),
                Some(correlation_id),
            ),
            false,
        )
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

pub mod testing {
    use super::*;

    /// Exposes the status mapping to integration tests.
    pub fn map_http_error(status: StatusCode) -> (AppError, bool) {
        super::map_http_error(status, "test-correlation-id")
    }

    /// Client without back-off delays, pointed at a mock server.
    pub fn client_for(
        base_url: &str,
        credentials: RedmineCredentials,
        timeout: StdDuration,
        page_size: u32,
    ) -> AppResult<RedmineClient> {
        let mut config = RedmineClientConfig::new(base_url, credentials);
        config.http_timeout = timeout;
        config.page_size = page_size;
        config.retry_delays = vec![StdDuration::ZERO; 3];
        RedmineClient::try_new(config)
    }
}
