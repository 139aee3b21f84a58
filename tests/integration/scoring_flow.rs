use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use redmine_gamification_lib::models::score::ABSENT_REASON;
use redmine_gamification_lib::services::gamification_engine::GamificationEngine;
use redmine_gamification_lib::services::gamification_service::{GamificationService, ScoreRequest};
use redmine_gamification_lib::services::leaderboard_service::LeaderboardService;
use redmine_gamification_lib::services::redmine_client::testing::client_for;
use redmine_gamification_lib::services::redmine_client::{RedmineClient, RedmineCredentials};
use redmine_gamification_lib::services::report_writer::ReportWriter;
use redmine_gamification_lib::services::scoring_rules::{REASON_NICE_COMMENTS, REASON_NO_COMMENT};
use serde_json::json;
use tempfile::tempdir;

const EPSILON: f64 = 1e-9;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

async fn mock_redmine(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/projects/demo.json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"project": {"id": 7, "name": "Demo", "identifier": "demo"}}));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/time_entries.json")
                .query_param("project_id", "7")
                .query_param("from", "2024-03-01");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "time_entries": [
                        {
                            "id": 1,
                            "user": {"id": 5, "name": "Alice"},
                            "issue": {"id": 10},
                            "hours": 4.0,
                            "spent_on": "2024-03-04"
                        },
                        {
                            "id": 2,
                            "user": {"id": 6, "name": "Bob"},
                            "issue": {"id": 11},
                            "hours": 8.0,
                            "spent_on": "2024-03-05"
                        }
                    ],
                    "total_count": 2,
                    "offset": 0,
                    "limit": 100
                }));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/issues/10.json")
                .query_param("include", "journals");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "issue": {
                        "id": 10,
                        "tracker": {"id": 1, "name": "Bug"},
                        "done_ratio": 0,
                        "journals": []
                    }
                }));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/issues/11.json")
                .query_param("include", "journals");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "issue": {
                        "id": 11,
                        "tracker": {"id": 2, "name": "Feature"},
                        "done_ratio": 50,
                        "journals": [{
                            "id": 70,
                            "user": {"id": 6, "name": "Bob"},
                            "notes": "Deployed, please verify",
                            "created_on": "2024-03-05T16:00:00Z",
                            "details": []
                        }]
                    }
                }));
        })
        .await;
}

fn client(server: &MockServer) -> RedmineClient {
    client_for(
        &server.base_url(),
        RedmineCredentials::ApiKey("abc123".into()),
        StdDuration::from_secs(2),
        100,
    )
    .expect("client builds")
}

#[tokio::test]
async fn report_covers_every_user_on_every_relevant_day() {
    let server = MockServer::start_async().await;
    mock_redmine(&server).await;

    let service = GamificationService::new(client(&server), GamificationEngine::default());
    let report = service
        .build_report(&ScoreRequest {
            project: "demo".into(),
            days_backwards: 7,
            today: date(8),
        })
        .await
        .expect("report builds");

    assert_eq!(report.user_names[&5], "Alice");
    assert_eq!(report.user_names[&6], "Bob");

    let alice = &report.points[&5];
    assert_eq!(alice.keys().copied().collect::<Vec<_>>(), vec![date(4), date(5)]);
    let monday = &alice[&date(4)];
    assert!((monday.time_points.sum - 0.9).abs() < EPSILON);
    assert!(monday.time_points.reasons.is_empty());
    assert!((monday.update_points.sum - (-0.6)).abs() < EPSILON);
    assert_eq!(monday.update_points.reasons, vec![REASON_NO_COMMENT.to_string()]);
    assert_eq!(alice[&date(5)].time_points.reasons, vec![ABSENT_REASON.to_string()]);

    let bob = &report.points[&6];
    assert_eq!(bob[&date(4)].update_points.sum, -1.0);
    let tuesday = &bob[&date(5)];
    assert!((tuesday.time_points.sum - 0.9).abs() < EPSILON);
    // -1 + 0.6 + 0.4 + 0.3 * (1 - 1 / 1.5)
    assert!((tuesday.update_points.sum - 0.1).abs() < EPSILON);
    assert_eq!(
        tuesday.update_points.reasons,
        vec![REASON_NICE_COMMENTS.to_string()]
    );
}

#[tokio::test]
async fn written_report_feeds_the_leaderboard() {
    let server = MockServer::start_async().await;
    mock_redmine(&server).await;

    let service = GamificationService::new(client(&server), GamificationEngine::default());
    let report = service
        .build_report(&ScoreRequest {
            project: "demo".into(),
            days_backwards: 7,
            today: date(8),
        })
        .await
        .expect("report builds");

    let dir = tempdir().unwrap();
    let path = dir.path().join("data.json");
    ReportWriter::write(&path, &report).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("{\"points\":{\"5\":{\"2024-03-04\":"));

    let restored = ReportWriter::read(&path).unwrap();
    assert_eq!(restored, report);

    let rows = LeaderboardService::build(&restored, date(5));
    assert_eq!(rows[0].name, "Bob");
    assert_eq!(rows[0].total, 100);
    assert_eq!(rows[1].name, "Alice");
    assert_eq!(rows[1].total, 90);
    assert!(rows[1].today.is_some());
}

#[tokio::test]
async fn empty_window_is_rejected_before_calling_redmine() {
    let server = MockServer::start_async().await;
    let project = server
        .mock_async(|when, then| {
            when.method(GET).path("/projects/demo.json");
            then.status(200);
        })
        .await;

    let service = GamificationService::new(client(&server), GamificationEngine::default());
    let error = service
        .build_report(&ScoreRequest {
            project: "demo".into(),
            days_backwards: 0,
            today: date(8),
        })
        .await
        .expect_err("zero days is invalid");

    project.assert_hits_async(0).await;
    assert!(error.to_string().contains("at least one day"));
}
