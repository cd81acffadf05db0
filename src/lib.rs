//! Tech Compass: AI-assisted troubleshooting chat with optional screenshots.

pub mod ai;
pub mod capture;
pub mod config;
pub mod controller;
pub mod speech;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;
