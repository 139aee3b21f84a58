use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, RedmineErrorCode};
use crate::models::activity::{
    DailyActivity, EntryMeta, IssueId, IssueMeta, IssueMetaMap, UserId,
};
use crate::models::redmine::{Issue, Journal, Project, TimeEntry};
use crate::services::redmine_client::RedmineSource;

/// Links, list markup or polite wording mark a comment as nicely formatted.
static FORMATTED_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)http|\+|\*|please").expect("valid formatted comment pattern"));

/// Result of walking the time entries of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryAnalysis {
    pub entry_meta: EntryMeta,
    pub watched_issues: BTreeSet<IssueId>,
    pub user_names: BTreeMap<UserId, String>,
}

/// Turns Redmine time entries and issue journals into scoring input.
pub struct ActivityCollector<S: RedmineSource> {
    source: S,
}

impl<S: RedmineSource> ActivityCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn open_project(&self, identifier: &str) -> AppResult<Project> {
        let project = self.source.get_project(identifier).await?;
        info!(
            target: "app::collector",
            project_id = project.id,
            name = %project.name,
            "opened project"
        );
        Ok(project)
    }

    /// Collects logged time per user and day, looking `days_backwards` days back from `today`.
    pub async fn analyze_time_entries(
        &self,
        project: &Project,
        days_backwards: u32,
        today: NaiveDate,
    ) -> AppResult<TimeEntryAnalysis> {
        let from = today - Duration::days(i64::from(days_backwards));
        let entries = self.source.list_time_entries(project.id, from).await?;
        let analysis = aggregate_time_entries(&entries);

        info!(
            target: "app::collector",
            entries = entries.len(),
            users = analysis.entry_meta.len(),
            issues = analysis.watched_issues.len(),
            %from,
            "analyzed time entries"
        );
        Ok(analysis)
    }

    /// Fetches every watched issue and adds its journals to the matching user days.
    pub async fn analyze_issues(
        &self,
        entry_meta: &mut EntryMeta,
        watched_issues: &BTreeSet<IssueId>,
    ) -> AppResult<IssueMetaMap> {
        let mut issue_meta = IssueMetaMap::new();

        for issue_id in watched_issues {
            let issue = match self.source.get_issue_with_journals(*issue_id).await {
                Ok(issue) => issue,
                Err(err) if is_unreachable_issue(&err) => {
                    warn!(
                        target: "app::collector",
                        issue_id,
                        error = %err,
                        "skipping issue that is no longer visible"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            apply_issue(entry_meta, &mut issue_meta, &issue);
        }

        info!(
            target: "app::collector",
            issues = issue_meta.len(),
            "analyzed issues"
        );
        Ok(issue_meta)
    }
}

pub fn aggregate_time_entries(entries: &[TimeEntry]) -> TimeEntryAnalysis {
    let mut analysis = TimeEntryAnalysis::default();

    for entry in entries {
        let user_id = entry.user_id();
        analysis
            .user_names
            .entry(user_id)
            .or_insert_with(|| entry.user.name.clone());

        let day = analysis
            .entry_meta
            .entry(user_id)
            .or_default()
            .days
            .entry(entry.spent_on)
            .or_insert_with(|| DailyActivity::for_date(entry.spent_on));

        day.total_hours += entry.hours;

        match entry.issue_id() {
            Some(issue_id) => {
                day.issue_mut(issue_id).hours += entry.hours;
                analysis.watched_issues.insert(issue_id);
            }
            None => debug!(
                target: "app::collector",
                entry_id = entry.id,
                "time entry without issue only counts toward total hours"
            ),
        }
    }

    analysis
}

pub fn issue_meta_of(issue: &Issue) -> IssueMeta {
    IssueMeta {
        done_ratio: issue.done_ratio.unwrap_or(0.0),
        tracker: issue.tracker_id(),
        has_estimate: issue.estimated_hours.is_some_and(|hours| hours > 0.0),
        has_category: issue.category.is_some(),
    }
}

pub fn is_formatted_comment(notes: &str) -> bool {
    FORMATTED_COMMENT.is_match(notes)
}

/// Deleted, moved or private issues keep their logged hours but get no issue meta.
fn is_unreachable_issue(err: &AppError) -> bool {
    matches!(
        err.redmine_code(),
        Some(RedmineErrorCode::NotFound | RedmineErrorCode::Forbidden)
    )
}

fn apply_issue(entry_meta: &mut EntryMeta, issue_meta: &mut IssueMetaMap, issue: &Issue) {
    issue_meta.insert(issue.id, issue_meta_of(issue));

    for journal in &issue.journals {
        apply_journal(entry_meta, issue.id, journal);
    }
}

fn apply_journal(entry_meta: &mut EntryMeta, issue_id: IssueId, journal: &Journal) {
    let created_on = journal.created_on.date_naive();
    let Some(day) = entry_meta
        .get_mut(&journal.user.id)
        .and_then(|user| user.days.get_mut(&created_on))
    else {
        return;
    };

    let issue = day.issue_mut(issue_id);
    issue.updates += 1;

    if let Some(notes) = journal.notes.as_deref().filter(|notes| !notes.is_empty()) {
        issue.comment_length += notes.chars().count() as u32;
        if is_formatted_comment(notes) {
            issue.comment_extra += 1;
        }
    }

    issue.attachments += journal.attachment_count();
}
