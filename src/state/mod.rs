//! Persistent application settings

pub mod config;

pub use config::Config;
