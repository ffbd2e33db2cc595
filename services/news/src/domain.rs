use std::sync::Arc;

use marketplace_platform::cache::{cache_aside, entity_key, CachePort, DEFAULT_TTL};
use marketplace_platform::error::DomainError;
use marketplace_platform::events::EventPublisher;

use crate::repository::{CommentRecord, LikeTarget, NewsRecord, NewsRepository, NewsUpdate};

pub struct NewsService<C: CachePort, E: EventPublisher> {
    pub repo: Arc<NewsRepository>,
    pub cache: Arc<C>,
    pub events: Arc<E>,
}

impl<C: CachePort, E: EventPublisher> NewsService<C, E> {
    pub async fn create_news(
        &self,
        author_user_id: String,
        title: String,
        content: String,
        image_url: String,
        category: String,
    ) -> Result<NewsRecord, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::invalid("title must not be empty"));
        }
        let now = chrono::Utc::now();
        let record = NewsRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title,
            content,
            author_user_id,
            image_url,
            category,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create_news(record);
        self.events
            .publish_json(
                "news.created",
                &serde_json::json!({ "news_id": created.id, "actor_id": created.author_user_id }),
            )
            .await;
        Ok(created)
    }

    pub async fn get_news(&self, id: &str) -> Result<NewsRecord, DomainError> {
        let key = entity_key("news", id);
        let repo = Arc::clone(&self.repo);
        let id = id.to_string();
        cache_aside(self.cache.as_ref(), &key, DEFAULT_TTL, || async move {
            repo.find_news(&id).map_err(DomainError::from)
        })
        .await
    }

    fn check_owner(&self, owner_id: &str, caller_id: &str, caller_is_admin: bool) -> Result<(), DomainError> {
        if owner_id != caller_id && !caller_is_admin {
            return Err(DomainError::forbidden("only the author or an admin may perform this action"));
        }
        Ok(())
    }

    pub async fn update_news(
        &self,
        news_id: &str,
        caller_id: &str,
        caller_is_admin: bool,
        update: NewsUpdate,
    ) -> Result<NewsRecord, DomainError> {
        let existing = self.repo.find_news(news_id)?;
        self.check_owner(&existing.author_user_id, caller_id, caller_is_admin)?;
        let updated = self.repo.update_news(news_id, update)?;
        self.cache.delete(&entity_key("news", news_id)).await;
        self.events
            .publish_json("news.updated", &serde_json::json!({ "news_id": news_id, "actor_id": caller_id }))
            .await;
        Ok(updated)
    }

    pub fn list_news(
        &self,
        category: Option<&str>,
        author_id: Option<&str>,
        page: i64,
        limit: i64,
    ) -> (Vec<NewsRecord>, u64, u32, u32) {
        let pagination = marketplace_platform::repository::Pagination::new(page, limit);
        let (items, total) = self.repo.list_news(category, author_id, pagination.page, pagination.limit);
        (items, total, pagination.page, pagination.limit)
    }

    /// Deletes the news article and every comment and like attached to it as
    /// one step. On failure nothing is removed and no event is published;
    /// the caller sees the original error.
    pub async fn delete_news_and_associated_data(
        &self,
        news_id: &str,
        caller_id: &str,
        caller_is_admin: bool,
    ) -> Result<(), DomainError> {
        let existing = self.repo.find_news(news_id)?;
        self.check_owner(&existing.author_user_id, caller_id, caller_is_admin)?;

        self.repo.delete_news_cascade(news_id).await?;
        self.cache.delete(&entity_key("news", news_id)).await;
        self.events
            .publish_json("news.deleted", &serde_json::json!({ "news_id": news_id, "actor_id": caller_id }))
            .await;
        Ok(())
    }

    pub async fn add_comment(
        &self,
        news_id: &str,
        author_user_id: String,
        content: String,
    ) -> Result<CommentRecord, DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::invalid("comment content must not be empty"));
        }
        let now = chrono::Utc::now();
        let record = CommentRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            news_id: news_id.to_string(),
            author_user_id,
            content,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.add_comment(record)?;
        self.events
            .publish_json(
                "news.comment.created",
                &serde_json::json!({ "news_id": news_id, "comment_id": created.id }),
            )
            .await;
        Ok(created)
    }

    pub async fn delete_comment(&self, comment_id: &str, caller_id: &str, caller_is_admin: bool) -> Result<(), DomainError> {
        let existing = self.repo.find_comment(comment_id)?;
        self.check_owner(&existing.author_user_id, caller_id, caller_is_admin)?;
        self.repo.delete_comment(comment_id)?;
        Ok(())
    }

    pub fn list_comments(&self, news_id: &str) -> Vec<CommentRecord> {
        self.repo.list_comments(news_id)
    }

    pub async fn toggle_like(&self, content_type: &str, content_id: &str, user_id: &str) -> Result<bool, DomainError> {
        let target = LikeTarget::parse(content_type).ok_or_else(|| DomainError::invalid("unknown like target"))?;
        match target {
            LikeTarget::News => {
                self.repo.find_news(content_id)?;
            }
            LikeTarget::Comment => {
                self.repo.find_comment(content_id)?;
            }
        }
        Ok(self.repo.toggle_like(target, content_id, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_platform::cache::InMemoryCachePort;
    use marketplace_platform::events::InMemoryEventPublisher;

    fn service() -> NewsService<InMemoryCachePort, InMemoryEventPublisher> {
        NewsService {
            repo: Arc::new(NewsRepository::new()),
            cache: Arc::new(InMemoryCachePort::new()),
            events: Arc::new(InMemoryEventPublisher::new()),
        }
    }

    #[tokio::test]
    async fn non_author_cannot_update_news() {
        let svc = service();
        let news = svc
            .create_news("alice".into(), "Launch".into(), "body".into(), String::new(), "general".into())
            .await
            .unwrap();
        let err = svc
            .update_news(&news.id, "mallory", false, NewsUpdate { title: Some("hacked".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn deleting_news_cascades_to_comments_and_likes() {
        let svc = service();
        let news = svc
            .create_news("alice".into(), "Launch".into(), "body".into(), String::new(), "general".into())
            .await
            .unwrap();
        let comment = svc.add_comment(&news.id, "bob".into(), "nice".into()).await.unwrap();
        svc.toggle_like("news", &news.id, "carol").await.unwrap();
        svc.toggle_like("comment", &comment.id, "carol").await.unwrap();

        svc.delete_news_and_associated_data(&news.id, "alice", false).await.unwrap();

        assert!(svc.get_news(&news.id).await.is_err());
        assert!(svc.list_comments(&news.id).is_empty());
    }

    #[tokio::test]
    async fn delete_by_non_owner_leaves_news_untouched() {
        let svc = service();
        let news = svc
            .create_news("alice".into(), "Launch".into(), "body".into(), String::new(), "general".into())
            .await
            .unwrap();
        let err = svc.delete_news_and_associated_data(&news.id, "mallory", false).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(svc.get_news(&news.id).await.is_ok());
    }

    #[tokio::test]
    async fn toggle_like_flips_state() {
        let svc = service();
        let news = svc
            .create_news("alice".into(), "Launch".into(), "body".into(), String::new(), "general".into())
            .await
            .unwrap();
        let liked = svc.toggle_like("news", &news.id, "carol").await.unwrap();
        assert!(liked);
        let liked = svc.toggle_like("news", &news.id, "carol").await.unwrap();
        assert!(!liked);
    }

    #[tokio::test]
    async fn comment_on_missing_news_is_not_found() {
        let svc = service();
        let err = svc.add_comment("missing", "bob".into(), "hi".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
