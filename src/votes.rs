//! # Votes
//!
//! Counts answers to the "is the panel useful?" poll.
//!
//! ## Storage
//!
//! - Three integer counters in an external key-value store:
//!   `votes_yes`, `votes_no`, `votes_needs_improvement`
//! - Reads fetch all three in one batched `MGET`, missing keys count as 0
//! - Writes are a single atomic `INCR`, so concurrent voters never lose updates
//! - Nothing is cached locally; every read reflects the store
//!
//! Without a configured Redis URL the service keeps the counters in process
//! memory instead, which resets on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised by a vote store
#[derive(Debug, Error)]
pub enum VoteStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors raised by the vote counter
#[derive(Debug, Error)]
pub enum VoteError {
    /// The submitted option is not one of the three answers
    #[error("Invalid vote option: '{0}'. Valid options: yes, no, needsImprovement")]
    InvalidOption(String),

    /// The store could not be read or written
    #[error(transparent)]
    Store(#[from] VoteStoreError),
}

/// One of the three poll answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteOption {
    Yes,
    No,
    NeedsImprovement,
}

impl VoteOption {
    pub const ALL: [VoteOption; 3] = [VoteOption::Yes, VoteOption::No, VoteOption::NeedsImprovement];

    /// Parses the exact wire literal of an option
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<VoteOption> {
        match s {
            "yes" => Some(VoteOption::Yes),
            "no" => Some(VoteOption::No),
            "needsImprovement" => Some(VoteOption::NeedsImprovement),
            _ => None,
        }
    }

    /// Key of the counter in the store
    pub fn store_key(self) -> &'static str {
        match self {
            VoteOption::Yes => "votes_yes",
            VoteOption::No => "votes_no",
            VoteOption::NeedsImprovement => "votes_needs_improvement",
        }
    }
}

/// Current counts for each option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub yes: i64,
    pub no: i64,
    pub needs_improvement: i64,
}

/// Key-value store offering batched reads and atomic increments
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Reads several keys at once, `None` for missing keys
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<i64>>, VoteStoreError>;

    /// Atomically increments a key by one, returning the new value
    async fn increment(&self, key: &str) -> Result<i64, VoteStoreError>;
}

/// Redis-backed vote store
#[derive(Clone)]
pub struct RedisVoteStore {
    connection: ConnectionManager,
}

impl RedisVoteStore {
    /// Connects to Redis at `redis_url`
    pub async fn connect(redis_url: &str) -> Result<Self, VoteStoreError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;
        info!("Connected to Redis vote store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl VoteStore for RedisVoteStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<i64>>, VoteStoreError> {
        let mut connection = self.connection.clone();
        let values: Vec<Option<i64>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut connection)
            .await?;
        Ok(values)
    }

    async fn increment(&self, key: &str) -> Result<i64, VoteStoreError> {
        let mut connection = self.connection.clone();
        let value: i64 = connection.incr(key, 1).await?;
        Ok(value)
    }
}

/// Process-local vote store
#[derive(Debug, Default)]
pub struct InMemoryVoteStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl InMemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteStore for InMemoryVoteStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<i64>>, VoteStoreError> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.iter().map(|key| counters.get(*key).copied()).collect())
    }

    async fn increment(&self, key: &str) -> Result<i64, VoteStoreError> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

/// Reads and records poll votes through a [`VoteStore`]
#[derive(Clone)]
pub struct VoteCounter {
    store: Arc<dyn VoteStore>,
}

impl VoteCounter {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Reads all three counters in one batched call
    pub async fn get_tally(&self) -> Result<VoteTally, VoteError> {
        let keys = VoteOption::ALL.map(VoteOption::store_key);
        let values = self.store.get_many(&keys).await?;
        let count = |i: usize| values.get(i).copied().flatten().unwrap_or(0);

        Ok(VoteTally {
            yes: count(0),
            no: count(1),
            needs_improvement: count(2),
        })
    }

    /// Validates `option` and increments its counter
    ///
    /// An invalid option never touches the store.
    pub async fn record_vote(&self, option: &str) -> Result<VoteOption, VoteError> {
        let vote =
            VoteOption::from_str(option).ok_or_else(|| VoteError::InvalidOption(option.to_string()))?;
        let total = self.store.increment(vote.store_key()).await?;
        info!("Recorded {:?} vote, total {}", vote, total);
        Ok(vote)
    }
}
