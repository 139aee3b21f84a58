use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::activity::{IssueId, TrackerId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdRef {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEnvelope {
    pub project: Project,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeEntry {
    pub id: u64,
    pub user: NamedRef,
    /// Time can be logged on a project without an issue.
    #[serde(default)]
    pub issue: Option<IdRef>,
    pub hours: f64,
    pub spent_on: NaiveDate,
}

impl TimeEntry {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn issue_id(&self) -> Option<IssueId> {
        self.issue.as_ref().map(|issue| issue.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryPage {
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalDetail {
    pub property: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Journal {
    pub id: u64,
    pub user: NamedRef,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_on: DateTime<Utc>,
    #[serde(default)]
    pub details: Vec<JournalDetail>,
}

impl Journal {
    pub fn attachment_count(&self) -> u32 {
        self.details
            .iter()
            .filter(|detail| detail.property == "attachment")
            .count() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: IssueId,
    pub tracker: NamedRef,
    #[serde(default)]
    pub done_ratio: Option<f64>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub category: Option<NamedRef>,
    #[serde(default)]
    pub journals: Vec<Journal>,
}

impl Issue {
    pub fn tracker_id(&self) -> TrackerId {
        self.tracker.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEnvelope {
    pub issue: Issue,
}
