use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::activity::{DailyActivity, EntryMeta, IssueMetaMap, UserActivity};
use crate::models::score::{Points, PointsTable, ScoreEntry};
use crate::models::settings::GamificationConfig;
use crate::services::scoring_rules::{
    evaluate, time_rules, update_rules, ScoringRule, TimeMeasurements, UpdateMeasurements,
};

/// Assigns gamification points to the collected time entries and issue updates.
pub struct GamificationEngine {
    config: GamificationConfig,
    time_rules: Vec<ScoringRule<TimeMeasurements>>,
    update_rules: Vec<ScoringRule<UpdateMeasurements>>,
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::from_valid_config(GamificationConfig::default())
    }
}

impl GamificationEngine {
    pub fn new(config: GamificationConfig) -> AppResult<Self> {
        ensure_finite_weights(&config)?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GamificationConfig) -> Self {
        let time_rules = time_rules(&config.time);
        let update_rules = update_rules(&config.update);
        Self {
            config,
            time_rules,
            update_rules,
        }
    }

    pub fn config(&self) -> &GamificationConfig {
        &self.config
    }

    pub fn score_time(&self, day: &DailyActivity) -> Points {
        let measurements = TimeMeasurements::from_day(day);
        evaluate(self.config.time.default, &self.time_rules, &measurements)
    }

    pub fn score_update(&self, day: &DailyActivity, issue_meta: &IssueMetaMap) -> Points {
        let measurements = UpdateMeasurements::collect(day, issue_meta, &self.config);
        evaluate(self.config.update.default, &self.update_rules, &measurements)
    }

    pub fn fill_in_time_points(&self, user: &UserActivity) -> BTreeMap<NaiveDate, Points> {
        user.days
            .iter()
            .map(|(date, day)| (*date, self.score_time(day)))
            .collect()
    }

    pub fn fill_in_update_points(
        &self,
        user: &UserActivity,
        issue_meta: &IssueMetaMap,
    ) -> BTreeMap<NaiveDate, Points> {
        user.days
            .iter()
            .map(|(date, day)| (*date, self.score_update(day, issue_meta)))
            .collect()
    }

    /// Weekdays on which anybody logged time; these make up every user's calendar.
    pub fn relevant_days(entry_meta: &EntryMeta) -> BTreeSet<NaiveDate> {
        entry_meta
            .values()
            .flat_map(|user| user.days.iter())
            .filter(|(_, day)| day.is_weekday())
            .map(|(date, _)| *date)
            .collect()
    }

    /// Calculates the points of every user for every relevant day.
    pub fn calculate_points(
        &self,
        entry_meta: &EntryMeta,
        issue_meta: &IssueMetaMap,
    ) -> AppResult<PointsTable> {
        validate_activity(entry_meta)?;
        validate_issue_meta(issue_meta)?;

        let all_days = Self::relevant_days(entry_meta);
        debug!(
            target: "app::engine",
            users = entry_meta.len(),
            issues = issue_meta.len(),
            relevant_days = all_days.len(),
            "calculating points"
        );

        let mut points = PointsTable::new();

        for (user_id, user) in entry_meta {
            let mut user_points: BTreeMap<NaiveDate, ScoreEntry> = all_days
                .iter()
                .map(|day| {
                    (
                        *day,
                        ScoreEntry::absent(self.config.time.default, self.config.update.default),
                    )
                })
                .collect();

            for (date, time_points) in self.fill_in_time_points(user) {
                if let Some(entry) = user_points.get_mut(&date) {
                    entry.time_points = time_points;
                }
            }

            for (date, update_points) in self.fill_in_update_points(user, issue_meta) {
                if let Some(entry) = user_points.get_mut(&date) {
                    entry.update_points = update_points;
                }
            }

            points.insert(*user_id, user_points);
        }

        Ok(points)
    }
}

fn ensure_finite_weights(config: &GamificationConfig) -> AppResult<()> {
    let time = config.time.named().map(|(name, value)| ("time", name, value));
    let update = config
        .update
        .named()
        .map(|(name, value)| ("update", name, value));

    for (group, name, value) in time.into_iter().chain(update) {
        if !value.is_finite() {
            return Err(AppError::validation(format!(
                "weight {group}.{name} must be a finite number, got {value}"
            )));
        }
    }
    Ok(())
}

fn ensure_count(value: f64, what: &str) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{what} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn validate_activity(entry_meta: &EntryMeta) -> AppResult<()> {
    for (user_id, user) in entry_meta {
        for (date, day) in &user.days {
            ensure_count(
                day.total_hours,
                &format!("total hours of user {user_id} on {date}"),
            )?;
            if day.day_of_week > 6 {
                return Err(AppError::validation(format!(
                    "day of week of user {user_id} on {date} must be within 0..=6, got {}",
                    day.day_of_week
                )));
            }
            for (issue_id, issue) in &day.per_issue {
                ensure_count(
                    issue.hours,
                    &format!("hours of user {user_id} on issue #{issue_id} on {date}"),
                )?;
            }
        }
    }
    Ok(())
}

fn validate_issue_meta(issue_meta: &IssueMetaMap) -> AppResult<()> {
    for (issue_id, meta) in issue_meta {
        ensure_count(meta.done_ratio, &format!("done ratio of issue #{issue_id}"))?;
    }
    Ok(())
}
