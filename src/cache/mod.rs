//! Cache module for keeping the latest panel snapshot in memory
//!
//! This module provides a single-entry cache with a fixed TTL (time-to-live).
//! The cache lives in process memory only: a restarted process starts empty,
//! and separate instances never see each other's entries.

mod manager;

pub use manager::{CacheManager, CachedData};
