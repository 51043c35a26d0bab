//! Projects and todos with priorities, deadlines, tags and manual ordering,
//! persisted as a single JSON record.

pub mod config;
pub mod ids;
pub mod models;
pub mod query;
pub mod services;
pub mod storage;
pub mod ui;
