use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::activity::UserId;
use crate::models::score::ScoreEntry;

/// Points of one day scaled to integers (`round(sum * 100)`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayPoints {
    pub time_points: i64,
    pub update_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayPoints {
    pub day: NaiveDate,
    pub points: DayPoints,
    pub reasons: ScoreEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub name: String,
    pub time_points: i64,
    pub update_points: i64,
    pub total: i64,
    pub days: BTreeMap<NaiveDate, DayPoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<TodayPoints>,
}
