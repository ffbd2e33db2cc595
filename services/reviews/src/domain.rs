use std::sync::Arc;

use marketplace_platform::cache::{cache_aside, entity_key, CachePort, DEFAULT_TTL};
use marketplace_platform::error::DomainError;
use marketplace_platform::events::EventPublisher;
use marketplace_platform::moderation::ReviewStatus;
use marketplace_platform::repository::Pagination;

use crate::repository::{ReviewListFilter, ReviewRecord, ReviewsRepository};

fn parse_status(s: &str) -> Option<ReviewStatus> {
    match s {
        "pending" => Some(ReviewStatus::Pending),
        "approved" => Some(ReviewStatus::Approved),
        "rejected" => Some(ReviewStatus::Rejected),
        "hidden" => Some(ReviewStatus::Hidden),
        "reported" => Some(ReviewStatus::Reported),
        _ => None,
    }
}

fn status_str(s: ReviewStatus) -> &'static str {
    match s {
        ReviewStatus::Pending => "pending",
        ReviewStatus::Approved => "approved",
        ReviewStatus::Rejected => "rejected",
        ReviewStatus::Hidden => "hidden",
        ReviewStatus::Reported => "reported",
    }
}

pub struct ReviewService<C: CachePort, E: EventPublisher> {
    pub repo: Arc<ReviewsRepository>,
    pub cache: Arc<C>,
    pub events: Arc<E>,
}

impl<C: CachePort, E: EventPublisher> ReviewService<C, E> {
    pub async fn create(
        &self,
        author_user_id: String,
        product_id: Option<String>,
        seller_id: Option<String>,
        rating: i32,
        comment: String,
    ) -> Result<ReviewRecord, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::invalid("rating must be between 1 and 5"));
        }
        if product_id.is_none() && seller_id.is_none() {
            return Err(DomainError::invalid("review must target a product or a seller"));
        }
        let now = chrono::Utc::now();
        let record = ReviewRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            author_user_id,
            product_id,
            seller_id,
            rating,
            comment,
            status: "pending".to_string(),
            moderation_comment: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create(record)?;
        self.events
            .publish_json(
                "review.created",
                &serde_json::json!({
                    "review_id": created.id,
                    "actor_id": created.author_user_id,
                    "product_id": created.product_id,
                }),
            )
            .await;
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> Result<ReviewRecord, DomainError> {
        let key = entity_key("review", id);
        let repo = Arc::clone(&self.repo);
        let id = id.to_string();
        cache_aside(self.cache.as_ref(), &key, DEFAULT_TTL, || async move {
            repo.find_by_id(&id).map_err(DomainError::from)
        })
        .await
    }

    pub async fn update(
        &self,
        review_id: &str,
        caller_id: &str,
        rating: i32,
        comment: String,
        expected_version: i64,
    ) -> Result<ReviewRecord, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::invalid("rating must be between 1 and 5"));
        }
        let existing = self.repo.find_by_id(review_id)?;
        if existing.author_user_id != caller_id {
            return Err(DomainError::forbidden("only the review's author may update it"));
        }
        let updated = self.repo.update_versioned(review_id, expected_version, |r| {
            r.rating = rating;
            r.comment = comment;
        })?;
        self.cache.delete(&entity_key("review", review_id)).await;
        self.events
            .publish_json("review.updated", &serde_json::json!({ "review_id": review_id, "actor_id": caller_id }))
            .await;
        Ok(updated)
    }

    pub async fn delete(&self, review_id: &str, caller_id: &str, caller_is_admin: bool) -> Result<(), DomainError> {
        let existing = self.repo.find_by_id(review_id)?;
        if existing.author_user_id != caller_id && !caller_is_admin {
            return Err(DomainError::forbidden("only the author or an admin may delete this review"));
        }
        self.repo.delete(review_id)?;
        self.cache.delete(&entity_key("review", review_id)).await;
        self.events
            .publish_json("review.deleted", &serde_json::json!({ "review_id": review_id, "actor_id": caller_id }))
            .await;
        Ok(())
    }

    pub async fn moderate(
        &self,
        review_id: &str,
        new_status: &str,
        moderation_comment: String,
    ) -> Result<ReviewRecord, DomainError> {
        let target = parse_status(new_status).ok_or_else(|| DomainError::invalid("unknown review status"))?;
        let (updated, changed) = self.repo.moderate(review_id, |r| {
            let current = parse_status(&r.status).unwrap_or(ReviewStatus::Pending);
            if current == target && r.moderation_comment == moderation_comment {
                return false;
            }
            if current != target && !current.can_transition(target) {
                return false;
            }
            r.status = status_str(target).to_string();
            r.moderation_comment = moderation_comment.clone();
            true
        })?;
        if !changed && updated.status != status_str(target) {
            return Err(DomainError::invalid(format!(
                "cannot transition review from {} to {}",
                updated.status, new_status
            )));
        }
        self.cache.delete(&entity_key("review", review_id)).await;
        if changed {
            self.events
                .publish_json(
                    "review.moderated",
                    &serde_json::json!({ "review_id": review_id, "status": updated.status }),
                )
                .await;
        }
        Ok(updated)
    }

    pub fn list_by_product(&self, product_id: &str, status: Option<String>, page: i64, limit: i64) -> (Vec<ReviewRecord>, u64, u32, u32) {
        let pagination = Pagination::new(page, limit);
        let filter = ReviewListFilter {
            product_id: Some(product_id.to_string()),
            author_user_id: None,
            status: Some(status.unwrap_or_else(|| "approved".to_string())),
        };
        let (items, total) = self.repo.list(&filter, pagination.page, pagination.limit);
        (items, total, pagination.page, pagination.limit)
    }

    pub fn list_by_user(&self, caller_user_id: &str, page: i64, limit: i64) -> (Vec<ReviewRecord>, u64, u32, u32) {
        let pagination = Pagination::new(page, limit);
        let filter = ReviewListFilter {
            product_id: None,
            author_user_id: Some(caller_user_id.to_string()),
            status: None,
        };
        let (items, total) = self.repo.list(&filter, pagination.page, pagination.limit);
        (items, total, pagination.page, pagination.limit)
    }

    pub fn average_rating(&self, product_id: &str) -> (f64, i64) {
        self.repo.average_rating(product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_platform::cache::InMemoryCachePort;
    use marketplace_platform::events::InMemoryEventPublisher;

    fn service() -> ReviewService<InMemoryCachePort, InMemoryEventPublisher> {
        ReviewService {
            repo: Arc::new(ReviewsRepository::new()),
            cache: Arc::new(InMemoryCachePort::new()),
            events: Arc::new(InMemoryEventPublisher::new()),
        }
    }

    #[tokio::test]
    async fn rating_out_of_range_is_invalid_input() {
        let svc = service();
        let err = svc.create("alice".into(), Some("p1".into()), None, 7, "meh".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_product_and_seller_is_invalid_input() {
        let svc = service();
        let err = svc.create("alice".into(), None, None, 5, "meh".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn duplicate_review_for_same_product_is_already_exists() {
        let svc = service();
        svc.create("alice".into(), Some("p1".into()), None, 5, "great".into()).await.unwrap();
        let err = svc.create("alice".into(), Some("p1".into()), None, 4, "again".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn moderation_then_average_rating_reflects_approval() {
        let svc = service();
        let review = svc.create("alice".into(), Some("p1".into()), None, 5, "great".into()).await.unwrap();
        assert_eq!(svc.average_rating("p1"), (0.0, 0));
        svc.moderate(&review.id, "approved", "looks good".into()).await.unwrap();
        assert_eq!(svc.average_rating("p1"), (5.0, 1));
    }

    #[tokio::test]
    async fn approved_cannot_be_moderated_back_to_pending() {
        let svc = service();
        let review = svc.create("alice".into(), Some("p1".into()), None, 5, "great".into()).await.unwrap();
        svc.moderate(&review.id, "approved", String::new()).await.unwrap();
        let err = svc.moderate(&review.id, "pending", String::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn only_author_can_update_review() {
        let svc = service();
        let review = svc.create("alice".into(), Some("p1".into()), None, 5, "great".into()).await.unwrap();
        let err = svc.update(&review.id, "mallory", 1, "bad".into(), review.version).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
