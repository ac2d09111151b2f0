pub mod activity_service;
pub mod journal_service;
pub mod scoring;
pub mod settings_service;
pub mod stats_service;
pub mod streak_service;
