pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod odds;
pub mod power_ranking;
pub mod projector;
pub mod records;
pub mod rolling;
pub mod scoring;
pub mod screens;
pub mod sources;
pub mod team_history;
