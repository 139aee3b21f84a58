use chrono::NaiveDate;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::score::GamificationReport;
use crate::services::activity_collector::ActivityCollector;
use crate::services::gamification_engine::GamificationEngine;
use crate::services::redmine_client::RedmineSource;

pub const DEFAULT_DAYS_BACKWARDS: u32 = 14;

#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub project: String,
    pub days_backwards: u32,
    pub today: NaiveDate,
}

/// Runs collection and scoring end to end for one project.
pub struct GamificationService<S: RedmineSource> {
    collector: ActivityCollector<S>,
    engine: GamificationEngine,
}

impl<S: RedmineSource> GamificationService<S> {
    pub fn new(source: S, engine: GamificationEngine) -> Self {
        Self {
            collector: ActivityCollector::new(source),
            engine,
        }
    }

    pub async fn build_report(&self, request: &ScoreRequest) -> AppResult<GamificationReport> {
        if request.days_backwards == 0 {
            return Err(AppError::validation("at least one day must be analyzed"));
        }

        let project = self.collector.open_project(&request.project).await?;
        let mut analysis = self
            .collector
            .analyze_time_entries(&project, request.days_backwards, request.today)
            .await?;
        let issue_meta = self
            .collector
            .analyze_issues(&mut analysis.entry_meta, &analysis.watched_issues)
            .await?;

        let points = self
            .engine
            .calculate_points(&analysis.entry_meta, &issue_meta)?;

        info!(
            target: "app::gamification",
            project = %request.project,
            users = points.len(),
            "calculated gamification points"
        );

        Ok(GamificationReport {
            points,
            user_names: analysis.user_names,
        })
    }
}
