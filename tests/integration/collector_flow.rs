use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use redmine_gamification_lib::error::{AppError, AppResult, RedmineErrorCode};
use redmine_gamification_lib::models::redmine::{
    IdRef, Issue, Journal, JournalDetail, NamedRef, Project, TimeEntry,
};
use redmine_gamification_lib::services::activity_collector::ActivityCollector;
use redmine_gamification_lib::services::redmine_client::RedmineSource;

struct InMemoryRedmine {
    project: Project,
    time_entries: Vec<TimeEntry>,
    issues: BTreeMap<u64, Issue>,
    failures: BTreeMap<u64, RedmineErrorCode>,
    requested_from: Arc<Mutex<Option<NaiveDate>>>,
}

#[async_trait]
impl RedmineSource for InMemoryRedmine {
    async fn get_project(&self, identifier: &str) -> AppResult<Project> {
        if self.project.identifier.as_deref() == Some(identifier) {
            Ok(self.project.clone())
        } else {
            Err(AppError::redmine(
                RedmineErrorCode::NotFound,
                "Redmine resource not found",
            ))
        }
    }

    async fn list_time_entries(
        &self,
        project_id: u64,
        from: NaiveDate,
    ) -> AppResult<Vec<TimeEntry>> {
        assert_eq!(project_id, self.project.id);
        *self.requested_from.lock().unwrap() = Some(from);
        Ok(self.time_entries.clone())
    }

    async fn get_issue_with_journals(&self, issue_id: u64) -> AppResult<Issue> {
        if let Some(code) = self.failures.get(&issue_id) {
            return Err(AppError::redmine(*code, format!("issue #{issue_id} failed")));
        }
        self.issues.get(&issue_id).cloned().ok_or_else(|| {
            AppError::redmine(RedmineErrorCode::NotFound, "Redmine resource not found")
        })
    }
}

fn user(id: u64) -> NamedRef {
    NamedRef {
        id,
        name: format!("User {id}"),
    }
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().unwrap()
}

fn time_entry(id: u64, user_id: u64, issue_id: u64, hours: f64) -> TimeEntry {
    TimeEntry {
        id,
        user: user(user_id),
        issue: Some(IdRef { id: issue_id }),
        hours,
        spent_on: monday(),
    }
}

fn journal(id: u64, user_id: u64, created_on: &str, notes: Option<&str>, files: usize) -> Journal {
    Journal {
        id,
        user: user(user_id),
        notes: notes.map(str::to_string),
        created_on: at(created_on),
        details: (0..files)
            .map(|n| JournalDetail {
                property: "attachment".to_string(),
                name: Some(n.to_string()),
            })
            .chain(std::iter::once(JournalDetail {
                property: "attr".to_string(),
                name: Some("status_id".to_string()),
            }))
            .collect(),
    }
}

fn redmine() -> InMemoryRedmine {
    let issue = Issue {
        id: 100,
        tracker: NamedRef {
            id: 2,
            name: "Feature".to_string(),
        },
        done_ratio: Some(20.0),
        estimated_hours: Some(5.0),
        category: None,
        journals: vec![
            journal(1, 5, "2024-03-04T09:00:00Z", Some("Please check http://ci"), 2),
            journal(2, 5, "2024-03-04T17:30:00Z", Some("done"), 0),
            journal(3, 5, "2024-03-04T18:00:00Z", None, 1),
            // nobody logged time on Tuesday
            journal(4, 5, "2024-03-05T08:00:00Z", Some("follow up"), 0),
            // user 9 never logged time
            journal(5, 9, "2024-03-04T10:00:00Z", Some("drive-by"), 3),
        ],
    };

    InMemoryRedmine {
        project: Project {
            id: 7,
            name: "Demo".to_string(),
            identifier: Some("demo".to_string()),
        },
        time_entries: vec![time_entry(1, 5, 100, 3.0), time_entry(2, 6, 100, 2.0)],
        issues: [(100, issue)].into_iter().collect(),
        failures: BTreeMap::new(),
        requested_from: Arc::new(Mutex::new(None)),
    }
}

#[tokio::test]
async fn time_entries_are_requested_from_the_window_start() {
    let source = redmine();
    let requested_from = Arc::clone(&source.requested_from);
    let collector = ActivityCollector::new(source);
    let project = collector.open_project("demo").await.unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let analysis = collector
        .analyze_time_entries(&project, 14, today)
        .await
        .unwrap();

    assert_eq!(
        analysis.user_names.values().cloned().collect::<Vec<_>>(),
        vec!["User 5".to_string(), "User 6".to_string()]
    );
    assert_eq!(analysis.watched_issues, BTreeSet::from([100]));
    assert_eq!(
        *requested_from.lock().unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 1)
    );
}

#[tokio::test]
async fn journals_enrich_only_existing_user_days() {
    let collector = ActivityCollector::new(redmine());
    let project = collector.open_project("demo").await.unwrap();
    let mut analysis = collector
        .analyze_time_entries(&project, 14, monday())
        .await
        .unwrap();

    let issue_meta = collector
        .analyze_issues(&mut analysis.entry_meta, &analysis.watched_issues)
        .await
        .unwrap();

    let meta = &issue_meta[&100];
    assert_eq!(meta.tracker, 2);
    assert_eq!(meta.done_ratio, 20.0);
    assert!(meta.has_estimate);
    assert!(!meta.has_category);

    let user_5 = &analysis.entry_meta[&5];
    assert_eq!(user_5.days.len(), 1);
    let activity = user_5.days[&monday()].per_issue[&100];
    assert_eq!(activity.hours, 3.0);
    assert_eq!(activity.updates, 3);
    assert_eq!(
        activity.comment_length,
        ("Please check http://ci".len() + "done".len()) as u32
    );
    assert_eq!(activity.comment_extra, 1);
    assert_eq!(activity.attachments, 3);

    let user_6 = analysis.entry_meta[&6].days[&monday()].per_issue[&100];
    assert_eq!(user_6.updates, 0);
    assert_eq!(user_6.attachments, 0);

    assert!(!analysis.entry_meta.contains_key(&9));
}

#[tokio::test]
async fn unknown_project_surfaces_not_found() {
    let collector = ActivityCollector::new(redmine());

    let error = collector
        .open_project("missing")
        .await
        .expect_err("project does not exist");

    assert_eq!(error.redmine_code(), Some(RedmineErrorCode::NotFound));
}

#[tokio::test]
async fn missing_and_private_issues_are_skipped() {
    let mut source = redmine();
    source.time_entries.push(time_entry(3, 6, 404, 1.0));
    source.time_entries.push(time_entry(4, 6, 403, 1.5));
    source.failures.insert(403, RedmineErrorCode::Forbidden);

    let collector = ActivityCollector::new(source);
    let project = collector.open_project("demo").await.unwrap();
    let mut analysis = collector
        .analyze_time_entries(&project, 14, monday())
        .await
        .unwrap();

    let issue_meta = collector
        .analyze_issues(&mut analysis.entry_meta, &analysis.watched_issues)
        .await
        .expect("unreachable issues do not fail the run");

    assert_eq!(issue_meta.keys().copied().collect::<Vec<_>>(), vec![100]);
    let day = &analysis.entry_meta[&6].days[&monday()];
    assert_eq!(day.total_hours, 4.5);
    assert_eq!(day.per_issue[&404].hours, 1.0);
    assert_eq!(day.per_issue[&403].hours, 1.5);
}

#[tokio::test]
async fn unavailable_issue_still_fails_the_run() {
    let mut source = redmine();
    source.time_entries.push(time_entry(3, 6, 500, 1.0));
    source.failures.insert(500, RedmineErrorCode::Unavailable);

    let collector = ActivityCollector::new(source);
    let project = collector.open_project("demo").await.unwrap();
    let mut analysis = collector
        .analyze_time_entries(&project, 14, monday())
        .await
        .unwrap();

    let error = collector
        .analyze_issues(&mut analysis.entry_meta, &analysis.watched_issues)
        .await
        .expect_err("server errors are not skipped");

    assert_eq!(error.redmine_code(), Some(RedmineErrorCode::Unavailable));
}
