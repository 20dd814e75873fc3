pub mod admin;
pub mod aggregator;
pub mod app_state;
pub mod config;
pub mod entities;
pub mod fetcher;
pub mod health;
pub mod jobs;
pub mod repositories;
pub mod resolver;
pub mod router;
pub mod telemetry;
