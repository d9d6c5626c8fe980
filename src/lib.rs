// src/lib.rs

//! Course watcher library
//!
//! Polls course snapshots, detects new items and approaching deadlines, and
//! reports them to a notification sink.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
