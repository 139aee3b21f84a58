use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::activity::UserId;

pub const ABSENT_REASON: &str = "Absent";

/// Weighted sum of one scoring pass together with the reasons it produced.
///
/// Field order matches sorted key order in the written report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Points {
    #[serde(default)]
    pub reasons: Vec<String>,
    pub sum: f64,
}

impl Points {
    pub fn absent(default: f64) -> Self {
        Self {
            reasons: vec![ABSENT_REASON.to_string()],
            sum: default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub time_points: Points,
    pub update_points: Points,
}

impl ScoreEntry {
    /// Fresh entry for a relevant day without any activity.
    pub fn absent(time_default: f64, update_default: f64) -> Self {
        Self {
            time_points: Points::absent(time_default),
            update_points: Points::absent(update_default),
        }
    }
}

pub type UserPoints = BTreeMap<NaiveDate, ScoreEntry>;
pub type PointsTable = BTreeMap<UserId, UserPoints>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GamificationReport {
    pub points: PointsTable,
    pub user_names: BTreeMap<UserId, String>,
}
