pub mod activity;
pub mod leaderboard;
pub mod redmine;
pub mod score;
pub mod settings;
