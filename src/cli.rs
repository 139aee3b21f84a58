use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::services::gamification_engine::GamificationEngine;
use crate::services::gamification_service::{
    GamificationService, ScoreRequest, DEFAULT_DAYS_BACKWARDS,
};
use crate::services::leaderboard_service::LeaderboardService;
use crate::services::redmine_client::{RedmineClient, RedmineClientConfig, RedmineCredentials};
use crate::services::report_writer::ReportWriter;
use crate::services::settings_service::SettingsService;

/// gamification tool exporting Redmine rewards into JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArguments {
    /// also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub op: Operation,
}

#[derive(Clone, Subcommand)]
pub enum Operation {
    /// reads Redmine activity, assigns points and writes the JSON report.
    Score {
        /// URL of the Redmine instance, e.g. https://redmine.example.com/
        #[arg(long)]
        url: String,
        /// project identifier as it appears in /projects/{project}
        #[arg(long)]
        project: String,
        /// user for basic authentication
        #[arg(long)]
        user: Option<String>,
        /// password for basic authentication
        #[arg(long, env = "REDMINE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// API key, used instead of user and password
        #[arg(long, env = "REDMINE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// how many days to analyze, 14 would be the last two weeks
        #[arg(long, default_value_t = DEFAULT_DAYS_BACKWARDS)]
        days: u32,
        /// YAML or JSON file overriding the default weights
        #[arg(long)]
        config: Option<PathBuf>,
        /// accept invalid TLS certificates
        #[arg(long, default_value_t = false)]
        insecure: bool,
        /// HTTP timeout per request in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        /// JSON file location
        file: PathBuf,
    },
    /// prints the ranking of a previously written report.
    Leaderboard {
        /// JSON report location
        file: PathBuf,
        /// day shown as "today", defaults to the current local date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// prints the default weight configuration as YAML.
    Defaults,
}

impl Operation {
    pub async fn run(&self) -> AppResult<()> {
        match self {
            Operation::Score {
                url,
                project,
                user,
                password,
                api_key,
                days,
                config,
                insecure,
                timeout_secs,
                file,
            } => {
                let credentials =
                    credentials_from(user.as_deref(), password.as_deref(), api_key.as_deref())?;
                let mut client_config = RedmineClientConfig::new(url.clone(), credentials);
                client_config.accept_invalid_certs = *insecure;
                client_config.http_timeout = StdDuration::from_secs(*timeout_secs);

                let settings = SettingsService::load_or_default(config.as_deref())?;
                let engine = GamificationEngine::new(settings)?;
                let client = RedmineClient::try_new(client_config)?;
                let service = GamificationService::new(client, engine);

                let request = ScoreRequest {
                    project: project.clone(),
                    days_backwards: *days,
                    today: Local::now().date_naive(),
                };
                let report = service.build_report(&request).await?;
                ReportWriter::write(file, &report)
            }
            Operation::Leaderboard { file, date } => {
                let report = ReportWriter::read(Path::new(file))?;
                let today = date.unwrap_or_else(|| Local::now().date_naive());
                let rows = LeaderboardService::build(&report, today);
                info!(target: "app::leaderboard", users = rows.len(), %today, "ranked users");
                print!("{}", LeaderboardService::render(&rows));
                Ok(())
            }
            Operation::Defaults => {
                let yaml = SettingsService::to_yaml(&Default::default())?;
                print!("{yaml}");
                Ok(())
            }
        }
    }
}

pub fn credentials_from(
    user: Option<&str>,
    password: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<RedmineCredentials> {
    match (user, password, api_key) {
        (_, _, Some(key)) if !key.trim().is_empty() => {
            Ok(RedmineCredentials::ApiKey(key.to_string()))
        }
        (Some(user), Some(password), _) => Ok(RedmineCredentials::Basic {
            user: user.to_string(),
            password: password.to_string(),
        }),
        (Some(_), None, _) => Err(AppError::validation("a password is required with --user")),
        _ => Ok(RedmineCredentials::Anonymous),
    }
}
