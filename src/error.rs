use std::fmt;

use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedmineErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    Unavailable,
    HttpTimeout,
    InvalidResponse,
    InvalidRequest,
    Unknown,
}

impl RedmineErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RedmineErrorCode::Unauthorized => "UNAUTHORIZED",
            RedmineErrorCode::Forbidden => "FORBIDDEN",
            RedmineErrorCode::NotFound => "NOT_FOUND",
            RedmineErrorCode::RateLimited => "RATE_LIMITED",
            RedmineErrorCode::Unavailable => "REDMINE_UNAVAILABLE",
            RedmineErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            RedmineErrorCode::InvalidResponse => "INVALID_RESPONSE",
            RedmineErrorCode::InvalidRequest => "INVALID_REQUEST",
            RedmineErrorCode::Unknown => "UNKNOWN_REDMINE_ERROR",
        }
    }
}

impl fmt::Display for RedmineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("{message}")]
    Redmine {
        code: RedmineErrorCode,
        message: String,
        correlation_id: Option<String>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation { message }
    }

    pub fn config(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::config", %message, "configuration error");
        AppError::Config { message }
    }

    pub fn redmine(code: RedmineErrorCode, message: impl Into<String>) -> Self {
        Self::redmine_with_correlation(code, message, None)
    }

    pub fn redmine_with_correlation(
        code: RedmineErrorCode,
        message: impl Into<String>,
        correlation_id: Option<&str>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match &correlation {
            Some(id) => {
                warn!(
                    target: "app::redmine::error",
                    code = %code,
                    correlation_id = %id,
                    %message
                );
            }
            None => {
                warn!(target: "app::redmine::error", code = %code, %message);
            }
        }

        AppError::Redmine {
            code,
            message,
            correlation_id: correlation,
        }
    }

    pub fn redmine_code(&self) -> Option<RedmineErrorCode> {
        match self {
            AppError::Redmine { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn redmine_correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Redmine { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}
