use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type IssueId = u64;
pub type TrackerId = u64;

/// Activity collected for one user on one day, per user id.
pub type EntryMeta = BTreeMap<UserId, UserActivity>;

/// Issue attributes keyed by issue id.
pub type IssueMetaMap = BTreeMap<IssueId, IssueMeta>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueActivity {
    pub hours: f64,
    pub updates: u32,
    pub comment_length: u32,
    /// Number of comments that look nicely formatted (links, lists, polite wording).
    pub comment_extra: u32,
    pub attachments: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyActivity {
    pub total_hours: f64,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    #[serde(default)]
    pub per_issue: BTreeMap<IssueId, IssueActivity>,
}

impl DailyActivity {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            total_hours: 0.0,
            day_of_week: date.weekday().num_days_from_monday() as u8,
            per_issue: BTreeMap::new(),
        }
    }

    pub fn is_weekday(&self) -> bool {
        self.day_of_week < 5
    }

    pub fn issue_mut(&mut self, issue_id: IssueId) -> &mut IssueActivity {
        self.per_issue.entry(issue_id).or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserActivity {
    #[serde(default)]
    pub days: BTreeMap<NaiveDate, DailyActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueMeta {
    #[serde(default)]
    pub done_ratio: f64,
    pub tracker: TrackerId,
    #[serde(default)]
    pub has_estimate: bool,
    #[serde(default)]
    pub has_category: bool,
}

impl IssueMeta {
    pub fn new(tracker: TrackerId, done_ratio: f64) -> Self {
        Self {
            done_ratio,
            tracker,
            has_estimate: false,
            has_category: false,
        }
    }
}
