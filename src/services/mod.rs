pub mod activity_collector;
pub mod gamification_engine;
pub mod gamification_service;
pub mod leaderboard_service;
pub mod redmine_client;
pub mod report_writer;
pub mod scoring_rules;
pub mod settings_service;
