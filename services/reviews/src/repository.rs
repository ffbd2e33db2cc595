use std::sync::Mutex;

use chrono::{DateTime, Utc};
use marketplace_platform::repository::{InMemoryStore, RepositoryError};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub author_user_id: String,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub status: String,
    pub moderation_comment: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewListFilter {
    pub product_id: Option<String>,
    pub author_user_id: Option<String>,
    pub status: Option<String>,
}

/// Guards the `(author_user_id, product_id)` uniqueness check-then-insert.
#[derive(Default)]
pub struct ReviewsRepository {
    store: InMemoryStore<String, ReviewRecord>,
    write_lock: Mutex<()>,
}

impl ReviewsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_id(&self, id: &str) -> Result<ReviewRecord, RepositoryError> {
        self.store.get(&id.to_string()).ok_or_else(|| RepositoryError::not_found("review", id))
    }

    pub fn create(&self, record: ReviewRecord) -> Result<ReviewRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        if let Some(product_id) = &record.product_id {
            let exists = self
                .store
                .all()
                .iter()
                .any(|r| r.author_user_id == record.author_user_id && r.product_id.as_deref() == Some(product_id.as_str()));
            if exists {
                return Err(RepositoryError::already_exists(
                    "review",
                    format!("{} already reviewed product {product_id}", record.author_user_id),
                ));
            }
        }
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Version-checked update: fails with `OptimisticLock` if `expected_version`
    /// does not match the stored row, otherwise applies `mutate` and bumps
    /// `version`/`updated_at` atomically under the write lock.
    pub fn update_versioned(
        &self,
        id: &str,
        expected_version: i64,
        mutate: impl FnOnce(&mut ReviewRecord),
    ) -> Result<ReviewRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        if record.version != expected_version {
            return Err(RepositoryError::optimistic_lock("review", id));
        }
        mutate(&mut record);
        record.version += 1;
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Moderation bypasses the caller-supplied version check (admin action,
    /// not subject to the author's optimistic-concurrency contract) but
    /// still bumps `version` so a concurrent author update is forced to
    /// retry.
    pub fn moderate(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut ReviewRecord) -> bool,
    ) -> Result<(ReviewRecord, bool), RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        let changed = mutate(&mut record);
        if changed {
            record.version += 1;
            record.updated_at = Utc::now();
            self.store.insert(record.id.clone(), record.clone());
        }
        Ok((record, changed))
    }

    pub fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        self.store.remove(&id.to_string()).ok_or_else(|| RepositoryError::not_found("review", id))?;
        Ok(())
    }

    pub fn list(&self, filter: &ReviewListFilter, page: u32, limit: u32) -> (Vec<ReviewRecord>, u64) {
        let mut items = self.store.all();
        if let Some(product_id) = &filter.product_id {
            items.retain(|r| r.product_id.as_deref() == Some(product_id.as_str()));
        }
        if let Some(author_user_id) = &filter.author_user_id {
            items.retain(|r| &r.author_user_id == author_user_id);
        }
        if let Some(status) = &filter.status {
            items.retain(|r| &r.status == status);
        }
        items.sort_by_key(|r| std::cmp::Reverse(r.created_at));

        let total = items.len() as u64;
        let offset = ((page.max(1) - 1) * limit) as usize;
        let page_items = items.into_iter().skip(offset).take(limit as usize).collect();
        (page_items, total)
    }

    pub fn average_rating(&self, product_id: &str) -> (f64, i64) {
        let approved: Vec<i32> = self
            .store
            .all()
            .into_iter()
            .filter(|r| r.product_id.as_deref() == Some(product_id) && r.status == "approved")
            .map(|r| r.rating)
            .collect();
        if approved.is_empty() {
            return (0.0, 0);
        }
        let sum: i32 = approved.iter().sum();
        (sum as f64 / approved.len() as f64, approved.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, author: &str, product: &str) -> ReviewRecord {
        let now = Utc::now();
        ReviewRecord {
            id: id.to_string(),
            author_user_id: author.to_string(),
            product_id: Some(product.to_string()),
            seller_id: None,
            rating: 5,
            comment: "great".to_string(),
            status: "pending".to_string(),
            moderation_comment: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn duplicate_author_product_pair_is_rejected() {
        let repo = ReviewsRepository::new();
        repo.create(sample("r1", "alice", "p1")).unwrap();
        let err = repo.create(sample("r2", "alice", "p1")).unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::AlreadyExists);
    }

    #[test]
    fn version_mismatch_on_update_is_optimistic_lock() {
        let repo = ReviewsRepository::new();
        repo.create(sample("r1", "alice", "p1")).unwrap();
        let err = repo.update_versioned("r1", 99, |r| r.comment = "edited".into()).unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::OptimisticLock);
    }

    #[test]
    fn average_rating_only_counts_approved_reviews() {
        let repo = ReviewsRepository::new();
        repo.create(sample("r1", "alice", "p1")).unwrap();
        assert_eq!(repo.average_rating("p1"), (0.0, 0));
        repo.moderate("r1", |r| {
            r.status = "approved".into();
            true
        })
        .unwrap();
        assert_eq!(repo.average_rating("p1"), (5.0, 1));
    }
}
