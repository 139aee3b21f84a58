//! Rule tables behind the two scoring passes.
//!
//! A rule multiplies its weight by a curve applied to one measurement of the
//! day. Rules may attach a reason string when their trigger fires; most reasons
//! are only reported while the rule's weight is positive, so that disabling a
//! rule (weight <= 0) also silences it.

use tracing::trace;

use crate::models::activity::{DailyActivity, IssueMetaMap};
use crate::models::score::Points;
use crate::models::settings::{GamificationConfig, StoryTellerBasis, TimeWeights, UpdateWeights};

pub const MIN_HOURS: f64 = 3.0;
pub const MAX_HOURS: f64 = 8.0;
pub const STORY_TELLER_THRESHOLD: f64 = 150.0;
const FORGIVEN_DONE_RATIO_VIOLATIONS: usize = 1;
const FORMATTED_COMMENT_SCALE: f64 = 2.0;
const STORY_TELLER_SCALE: f64 = 50.0;

pub const REASON_NO_LOGGED_TIME: &str = "Penalty for no logged time";
pub const REASON_WEEKEND: &str = "Penalty for logging on weekend";
pub const REASON_LESS_THAN_3: &str = "Penalty for logging less than 3 hours";
pub const REASON_MORE_THAN_8: &str = "Penalty for logging more than 8 hours";
pub const REASON_MULTIPLE_ISSUES: &str = "Reward for logging time on multiple issues";
pub const REASON_NO_COMMENT: &str = "Penalty for not commenting on issues";
pub const REASON_DONE_RATIO: &str =
    "Penalty for not updating done ratio on issue with logged time";
pub const REASON_ATTACHMENTS: &str = "Reward for attaching files";
pub const REASON_NICE_COMMENTS: &str = "Reward for nicely formatted comments";
pub const REASON_STORY_TELLER: &str = "Reward for being a story teller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonGate {
    PositiveWeight,
    Always,
}

pub struct ScoringRule<M> {
    pub name: &'static str,
    pub weight: f64,
    pub measure: fn(&M) -> f64,
    pub curve: fn(f64) -> f64,
    pub reason: &'static str,
    pub triggered: fn(&M) -> bool,
    pub gate: ReasonGate,
}

impl<M> ScoringRule<M> {
    pub fn contribution(&self, measurements: &M) -> f64 {
        self.weight * (self.curve)((self.measure)(measurements))
    }

    pub fn reason_for(&self, measurements: &M) -> Option<&'static str> {
        let open = match self.gate {
            ReasonGate::PositiveWeight => self.weight > 0.0,
            ReasonGate::Always => true,
        };
        (open && (self.triggered)(measurements)).then_some(self.reason)
    }
}

/// Folds the rule table over one day, starting from the baseline.
pub fn evaluate<M>(default: f64, rules: &[ScoringRule<M>], measurements: &M) -> Points {
    let mut sum = default;
    let mut reasons = Vec::new();

    for rule in rules {
        let contribution = rule.contribution(measurements);
        let reason = rule.reason_for(measurements);
        trace!(
            target: "app::engine",
            rule = rule.name,
            weight = rule.weight,
            contribution,
            reason,
            "applied scoring rule"
        );
        sum += contribution;
        if let Some(reason) = reason {
            reasons.push(reason.to_string());
        }
    }

    Points { reasons, sum }
}

pub mod curves {
    use super::{MAX_HOURS, MIN_HOURS};

    pub fn indicator(value: f64) -> f64 {
        if value > 0.0 {
            1.0
        } else {
            0.0
        }
    }

    pub fn weekday(day_of_week: f64) -> f64 {
        if day_of_week < 5.0 {
            1.0
        } else {
            0.0
        }
    }

    /// Full weight from 3 hours up, `1/(1+deficit)` below.
    pub fn minimum_hours(hours: f64) -> f64 {
        let deficit = (MIN_HOURS - hours.min(MIN_HOURS)).max(0.0);
        1.0 / (1.0 + deficit)
    }

    /// Full weight up to 8 hours, `1/(1+overtime)` above.
    pub fn maximum_hours(hours: f64) -> f64 {
        let overtime = (hours - MAX_HOURS).max(0.0);
        1.0 / (1.0 + overtime)
    }

    pub fn decay(count: f64) -> f64 {
        1.0 / (1.0 + count)
    }

    /// Zero at 0, approaching 1 as the count grows.
    pub fn saturating(count: f64) -> f64 {
        1.0 - 1.0 / (1.0 + count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeMeasurements {
    pub total_hours: f64,
    pub day_of_week: u8,
    pub issues_with_hours: usize,
}

impl TimeMeasurements {
    pub fn from_day(day: &DailyActivity) -> Self {
        Self {
            total_hours: day.total_hours,
            day_of_week: day.day_of_week,
            issues_with_hours: day
                .per_issue
                .values()
                .filter(|issue| issue.hours > 0.0)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateMeasurements {
    pub comment_total: f64,
    /// Done ratio violations left after forgiving the first one.
    pub unforgiven_violations: usize,
    pub attachments: f64,
    pub formatted_comments: f64,
    pub story_teller_magnitude: f64,
}

impl UpdateMeasurements {
    pub fn collect(
        day: &DailyActivity,
        issue_meta: &IssueMetaMap,
        config: &GamificationConfig,
    ) -> Self {
        let comment_total: f64 = day
            .per_issue
            .values()
            .map(|issue| f64::from(issue.comment_length))
            .sum();

        let violations = day
            .per_issue
            .iter()
            .filter(|(id, issue)| {
                issue_meta.get(*id).is_some_and(|meta| {
                    config.includes_tracker(meta.tracker)
                        && meta.done_ratio <= 0.0
                        && issue.hours > 0.0
                })
            })
            .count();

        let known = || {
            day.per_issue
                .iter()
                .filter(|(id, _)| issue_meta.contains_key(*id))
                .map(|(_, issue)| issue)
        };
        let attachments: f64 = known().map(|issue| f64::from(issue.attachments)).sum();
        let formatted_comments: f64 = known().map(|issue| f64::from(issue.comment_extra)).sum();

        let story_teller_magnitude = match config.story_teller_basis {
            StoryTellerBasis::Attachments => attachments,
            StoryTellerBasis::CommentExcess => (comment_total - STORY_TELLER_THRESHOLD).max(0.0),
        };

        Self {
            comment_total,
            unforgiven_violations: violations.saturating_sub(FORGIVEN_DONE_RATIO_VIOLATIONS),
            attachments,
            formatted_comments,
            story_teller_magnitude,
        }
    }
}

pub fn time_rules(weights: &TimeWeights) -> Vec<ScoringRule<TimeMeasurements>> {
    vec![
        ScoringRule {
            name: "for_update",
            weight: weights.for_update,
            measure: |m| m.total_hours,
            curve: curves::indicator,
            reason: REASON_NO_LOGGED_TIME,
            triggered: |m| m.total_hours <= 0.0,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_update_on_weekday",
            weight: weights.for_update_on_weekday,
            measure: |m| f64::from(m.day_of_week),
            curve: curves::weekday,
            reason: REASON_WEEKEND,
            triggered: |m| m.day_of_week >= 5,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_at_least_3",
            weight: weights.for_at_least_3,
            measure: |m| m.total_hours,
            curve: curves::minimum_hours,
            reason: REASON_LESS_THAN_3,
            triggered: |m| m.total_hours < MIN_HOURS,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_max_8",
            weight: weights.for_max_8,
            measure: |m| m.total_hours,
            curve: curves::maximum_hours,
            reason: REASON_MORE_THAN_8,
            triggered: |m| m.total_hours > MAX_HOURS,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_distributed",
            weight: weights.for_distributed,
            measure: |m| m.issues_with_hours as f64,
            curve: curves::saturating,
            reason: REASON_MULTIPLE_ISSUES,
            triggered: |m| m.issues_with_hours > 1,
            gate: ReasonGate::PositiveWeight,
        },
    ]
}

pub fn update_rules(weights: &UpdateWeights) -> Vec<ScoringRule<UpdateMeasurements>> {
    vec![
        ScoringRule {
            name: "for_any_comment",
            weight: weights.for_any_comment,
            measure: |m| m.comment_total,
            curve: curves::indicator,
            reason: REASON_NO_COMMENT,
            triggered: |m| m.comment_total <= 0.0,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_done_ratio",
            weight: weights.for_done_ratio,
            measure: |m| m.unforgiven_violations as f64,
            curve: curves::decay,
            reason: REASON_DONE_RATIO,
            triggered: |m| m.unforgiven_violations > 0,
            gate: ReasonGate::Always,
        },
        ScoringRule {
            name: "for_attachment",
            weight: weights.for_attachment,
            measure: |m| m.attachments,
            curve: curves::saturating,
            reason: REASON_ATTACHMENTS,
            triggered: |m| m.attachments > 0.0,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_nice_comments",
            weight: weights.for_nice_comments,
            measure: |m| m.formatted_comments / FORMATTED_COMMENT_SCALE,
            curve: curves::saturating,
            reason: REASON_NICE_COMMENTS,
            triggered: |m| m.formatted_comments > 0.0,
            gate: ReasonGate::PositiveWeight,
        },
        ScoringRule {
            name: "for_story_teller",
            weight: weights.for_story_teller,
            measure: |m| m.story_teller_magnitude / STORY_TELLER_SCALE,
            curve: curves::saturating,
            reason: REASON_STORY_TELLER,
            triggered: |m| m.comment_total - STORY_TELLER_THRESHOLD > 0.0,
            gate: ReasonGate::PositiveWeight,
        },
    ]
}
