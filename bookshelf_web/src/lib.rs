pub mod action_state;
pub mod actions;
pub mod api;
pub mod app_config;
pub mod error_normalizer;
pub mod google_books;
mod handlers;
pub mod pages;
pub mod parallel_action;
pub mod portfolio;
pub mod query_cache;
pub mod server;
pub mod settings;
