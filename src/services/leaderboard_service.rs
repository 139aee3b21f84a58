use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::leaderboard::{DayPoints, LeaderboardRow, TodayPoints};
use crate::models::score::GamificationReport;

/// Ranks users of a report by the sum of their positive daily points.
pub struct LeaderboardService;

impl LeaderboardService {
    pub fn build(report: &GamificationReport, today: NaiveDate) -> Vec<LeaderboardRow> {
        let mut rows: Vec<LeaderboardRow> = report
            .user_names
            .iter()
            .map(|(user_id, name)| {
                let mut days = BTreeMap::new();
                let mut time_total = 0;
                let mut update_total = 0;
                let mut today_points = None;

                if let Some(user_points) = report.points.get(user_id) {
                    for (day, entry) in user_points {
                        let points = DayPoints {
                            time_points: scale(entry.time_points.sum),
                            update_points: scale(entry.update_points.sum),
                        };
                        // negative days do not eat into earned points
                        time_total += points.time_points.max(0);
                        update_total += points.update_points.max(0);

                        if *day == today {
                            today_points = Some(TodayPoints {
                                day: *day,
                                points,
                                reasons: entry.clone(),
                            });
                        }
                        days.insert(*day, points);
                    }
                }

                LeaderboardRow {
                    user_id: *user_id,
                    name: name.clone(),
                    time_points: time_total,
                    update_points: update_total,
                    total: time_total + update_total,
                    days,
                    today: today_points,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.user_id.cmp(&b.user_id)));
        rows
    }

    pub fn render(rows: &[LeaderboardRow]) -> String {
        let name_width = rows
            .iter()
            .map(|row| row.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Name".len());

        let mut out = format!(
            "{:>4}  {:<name_width$}  {:>8}  {:>8}  {:>8}\n",
            "#", "Name", "Time", "Update", "Total"
        );
        for (rank, row) in rows.iter().enumerate() {
            out.push_str(&format!(
                "{:>4}  {:<name_width$}  {:>8}  {:>8}  {:>8}\n",
                rank + 1,
                row.name,
                row.time_points,
                row.update_points,
                row.total
            ));
        }
        out
    }
}

/// Halves round up, so -12.5 becomes -12 as on the dashboard.
fn scale(sum: f64) -> i64 {
    (sum * 100.0 + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_rounds_to_hundredths() {
        assert_eq!(scale(0.47892156862745094), 48);
        assert_eq!(scale(-1.0), -100);
        assert_eq!(scale(0.005), 1);
    }

    #[test]
    fn scale_rounds_negative_halves_up() {
        assert_eq!(scale(-0.125), -12);
        assert_eq!(scale(0.125), 13);
        assert_eq!(scale(-0.375), -37);
    }
}
