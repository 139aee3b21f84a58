use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::activity::TrackerId;

/// Redmine ships trackers with small ids (Bug, Feature, Support, ...);
/// activity on anything above is not rewarded or penalized.
pub const DEFAULT_TRACKER_COUNT: TrackerId = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeWeights {
    pub default: f64,
    pub for_update: f64,
    pub for_update_on_weekday: f64,
    pub for_at_least_3: f64,
    pub for_max_8: f64,
    #[serde(alias = "for_distibuted")]
    pub for_distributed: f64,
}

impl Default for TimeWeights {
    fn default() -> Self {
        Self {
            default: -1.0,
            for_update: 0.8,
            for_update_on_weekday: 0.2,
            for_at_least_3: 0.3,
            for_max_8: 0.5,
            for_distributed: 0.2,
        }
    }
}

impl TimeWeights {
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("default", self.default),
            ("for_update", self.for_update),
            ("for_update_on_weekday", self.for_update_on_weekday),
            ("for_at_least_3", self.for_at_least_3),
            ("for_max_8", self.for_max_8),
            ("for_distributed", self.for_distributed),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateWeights {
    pub default: f64,
    pub for_any_comment: f64,
    pub for_done_ratio: f64,
    pub for_attachment: f64,
    pub for_nice_comments: f64,
    pub for_story_teller: f64,
}

impl Default for UpdateWeights {
    fn default() -> Self {
        Self {
            default: -1.0,
            for_any_comment: 0.6,
            for_done_ratio: 0.4,
            for_attachment: 0.5,
            for_nice_comments: 0.3,
            for_story_teller: 0.2,
        }
    }
}

impl UpdateWeights {
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("default", self.default),
            ("for_any_comment", self.for_any_comment),
            ("for_done_ratio", self.for_done_ratio),
            ("for_attachment", self.for_attachment),
            ("for_nice_comments", self.for_nice_comments),
            ("for_story_teller", self.for_story_teller),
        ]
    }
}

/// Which measurement drives the magnitude of the story teller reward.
///
/// `Attachments` reproduces the historical scores, where the reward grew with
/// the attachment count while its reason was gated on comment volume.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoryTellerBasis {
    #[default]
    Attachments,
    CommentExcess,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GamificationConfig {
    pub time: TimeWeights,
    pub update: UpdateWeights,
    pub trackers: BTreeSet<TrackerId>,
    pub story_teller_basis: StoryTellerBasis,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            time: TimeWeights::default(),
            update: UpdateWeights::default(),
            trackers: (0..DEFAULT_TRACKER_COUNT).collect(),
            story_teller_basis: StoryTellerBasis::default(),
        }
    }
}

impl GamificationConfig {
    pub fn includes_tracker(&self, tracker: TrackerId) -> bool {
        self.trackers.contains(&tracker)
    }
}
