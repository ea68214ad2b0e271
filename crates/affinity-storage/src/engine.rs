//! StorageEngine: owns the ConnectionPool, runs migrations on open, and
//! implements IActionStorage + ISimilarityStorage.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use affinity_core::config::StorageConfig;
use affinity_core::config::defaults::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_READ_POOL_SIZE};
use affinity_core::errors::AffinityResult;
use affinity_core::models::{EventSimilarity, ItemId, UserAction, UserId};
use affinity_core::traits::{IActionStorage, ISimilarityStorage, UpsertOutcome};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{similarity_ops, user_action_ops};
use crate::transaction::with_immediate_transaction;

/// Row counts for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub user_actions: u64,
    pub similarities: u64,
}

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a file-backed engine with default pool settings.
    pub fn open(path: &Path) -> AffinityResult<Self> {
        Self::open_with(path, DEFAULT_READ_POOL_SIZE, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn open_with_config(config: &StorageConfig) -> AffinityResult<Self> {
        Self::open_with(
            Path::new(&config.db_path),
            config.read_pool_size,
            config.busy_timeout_ms,
        )
    }

    fn open_with(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> AffinityResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open(path, read_pool_size, busy_timeout_ms)?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// In-memory engine for tests; every read is routed through the writer.
    pub fn open_in_memory() -> AffinityResult<Self> {
        let engine = Self {
            pool: ConnectionPool::in_memory()?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> AffinityResult<()> {
        self.pool.write(|conn| {
            let version = migrations::run_migrations(conn)?;
            debug!(version, "storage schema ready");
            Ok(())
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn stats(&self) -> AffinityResult<StoreStats> {
        self.pool.read(|conn| {
            Ok(StoreStats {
                user_actions: user_action_ops::count_user_actions(conn)?,
                similarities: similarity_ops::count_similarities(conn)?,
            })
        })
    }
}

impl IActionStorage for StorageEngine {
    fn upsert_user_actions(&self, actions: &[UserAction]) -> AffinityResult<Vec<UpsertOutcome>> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }
        self.pool.write(|conn| {
            with_immediate_transaction(conn, |tx| {
                actions
                    .iter()
                    .map(|action| user_action_ops::upsert_user_action(tx, action))
                    .collect()
            })
        })
    }

    fn get_user_action(
        &self,
        event_id: ItemId,
        user_id: UserId,
    ) -> AffinityResult<Option<UserAction>> {
        self.pool.read(|conn| user_action_ops::get_user_action(conn, event_id, user_id))
    }

    fn recent_user_actions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AffinityResult<Vec<UserAction>> {
        self.pool.read(|conn| user_action_ops::recent_user_actions(conn, user_id, limit))
    }

    fn interacted_items(&self, user_id: UserId) -> AffinityResult<HashSet<ItemId>> {
        self.pool.read(|conn| user_action_ops::interacted_items(conn, user_id))
    }

    fn interaction_sums(&self, event_ids: &[ItemId]) -> AffinityResult<HashMap<ItemId, f64>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.pool.read(|conn| user_action_ops::interaction_sums(conn, event_ids))
    }
}

impl ISimilarityStorage for StorageEngine {
    fn upsert_similarities(&self, rows: &[EventSimilarity]) -> AffinityResult<Vec<UpsertOutcome>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.pool.write(|conn| {
            with_immediate_transaction(conn, |tx| {
                rows.iter()
                    .map(|row| similarity_ops::upsert_similarity(tx, row))
                    .collect()
            })
        })
    }

    fn get_similarity(&self, a: ItemId, b: ItemId) -> AffinityResult<Option<EventSimilarity>> {
        self.pool.read(|conn| similarity_ops::get_similarity(conn, a, b))
    }

    fn similarities_for(&self, item: ItemId) -> AffinityResult<Vec<EventSimilarity>> {
        self.pool.read(|conn| similarity_ops::similarities_for(conn, item))
    }

    fn similarities_touching(&self, items: &[ItemId]) -> AffinityResult<Vec<EventSimilarity>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.pool.read(|conn| similarity_ops::similarities_touching(conn, items))
    }
}
