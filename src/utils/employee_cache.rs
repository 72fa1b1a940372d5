use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

/// Ids of employees known to exist, so attendance writes can skip the
/// directory lookup on the hot path.
#[derive(Clone)]
pub struct EmployeeCache {
    known: Cache<String, ()>,
}

impl EmployeeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            known: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn mark_known(&self, employee_id: &str) {
        self.known.insert(employee_id.to_string(), ()).await;
    }

    pub async fn is_known(&self, employee_id: &str) -> bool {
        self.known.get(employee_id).await.is_some()
    }

    pub async fn forget(&self, employee_id: &str) {
        self.known.invalidate(employee_id).await;
    }

    async fn batch_mark(&self, ids: &[String]) {
        let futures: Vec<_> = ids
            .iter()
            .map(|id| self.known.insert(id.clone(), ()))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Existence check: cache first, then the directory table.
    pub async fn exists(&self, pool: &MySqlPool, employee_id: &str) -> Result<bool, sqlx::Error> {
        if self.is_known(employee_id).await {
            return Ok(true);
        }

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
        )
        .bind(employee_id)
        .fetch_one(pool)
        .await?
            != 0;

        if exists {
            self.mark_known(employee_id).await;
        }
        Ok(exists)
    }

    /// Load every employee id into the cache in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT id FROM employees").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            let (id,) = row?;
            batch.push(id);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        log::info!("Employee cache warmup complete: {} employees", total_count);
        Ok(())
    }
}
