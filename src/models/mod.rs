// src/models/mod.rs

//! Domain models for the course watcher.

mod config;
mod course;
mod item;

// Re-export all public types
pub use config::{Config, Messages, SinkConfig, SourceConfig, StorageConfig, WatchConfig};
pub use course::{Course, clean_course_title};
pub use item::{Deadline, FOLDER, Item};
