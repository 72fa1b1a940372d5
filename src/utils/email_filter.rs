use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use autoscale_cuckoo_filter::CuckooFilter;
use futures::TryStreamExt;
use sqlx::MySqlPool;
use tracing::info;

const DEFAULT_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Addresses already held by some employee, kept lower-cased.
///
/// Answers "certainly free" without a round trip; a hit still has to be
/// confirmed with [`EmailFilter::is_taken`]. Clones share the same filter, so
/// one instance goes into `web::Data` and the warmup task gets another.
#[derive(Clone)]
pub struct EmailFilter {
    seen: Arc<RwLock<CuckooFilter<String>>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

fn lowered(email: &str) -> String {
    email.trim().to_lowercase()
}

impl EmailFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: Arc::new(RwLock::new(CuckooFilter::new(capacity, FALSE_POSITIVE_RATE))),
        }
    }

    pub fn might_exist(&self, email: &str) -> bool {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&lowered(email))
    }

    pub fn insert(&self, email: &str) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&lowered(email));
    }

    pub fn remove(&self, email: &str) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&lowered(email));
    }

    /// Whether an employee already uses `email` (case-insensitive). Only
    /// filter hits reach the database.
    pub async fn is_taken(&self, pool: &MySqlPool, email: &str) -> Result<bool, sqlx::Error> {
        if !self.might_exist(email) {
            return Ok(false);
        }

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE LOWER(email) = LOWER(?) LIMIT 1)",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(taken != 0)
    }

    /// Loads every stored address, taking the write lock once per chunk of
    /// `chunk_size` rows.
    pub async fn warmup(&self, pool: &MySqlPool, chunk_size: usize) -> anyhow::Result<usize> {
        let chunk_size = chunk_size.max(1);
        let mut rows = sqlx::query_scalar::<_, String>("SELECT email FROM employees").fetch(pool);

        let mut chunk = Vec::with_capacity(chunk_size);
        let mut loaded = 0usize;
        while let Some(email) = rows.try_next().await.context("reading employee emails")? {
            chunk.push(lowered(&email));
            if chunk.len() == chunk_size {
                loaded += self.add_all(&mut chunk);
            }
        }
        loaded += self.add_all(&mut chunk);

        info!(loaded, "Email filter warmed up");
        Ok(loaded)
    }

    fn add_all(&self, chunk: &mut Vec<String>) -> usize {
        if chunk.is_empty() {
            return 0;
        }
        let mut seen = self.seen.write().unwrap_or_else(PoisonError::into_inner);
        let added = chunk.len();
        for email in chunk.drain(..) {
            seen.add(&email);
        }
        added
    }
}
