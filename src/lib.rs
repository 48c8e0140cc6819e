pub mod api;
pub mod clipboard;
pub mod config;
pub mod dashboard;
pub mod http_client;
pub mod notify;
pub mod prefs;
pub mod provider;
pub mod state;
pub mod stats;
pub mod timer;
pub mod ui;
pub mod view;
