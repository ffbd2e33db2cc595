use chrono::{DateTime, Utc};
use marketplace_platform::repository::{InMemoryStore, RepositoryError, TransactionLock, TransactionalStore};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_user_id: String,
    pub image_url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub news_id: String,
    pub author_user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    News,
    Comment,
}

impl LikeTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "news" => Some(Self::News),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LikeRecord {
    pub target: LikeTarget,
    pub content_id: String,
    pub user_id: String,
}

fn like_key(target: LikeTarget, content_id: &str, user_id: &str) -> String {
    format!("{}:{content_id}:{user_id}", target.as_str())
}

#[derive(Default)]
pub struct NewsRepository {
    news: InMemoryStore<String, NewsRecord>,
    comments: InMemoryStore<String, CommentRecord>,
    likes: InMemoryStore<String, LikeRecord>,
    transaction: TransactionLock,
}

impl NewsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_news(&self, id: &str) -> Result<NewsRecord, RepositoryError> {
        self.news.get(&id.to_string()).ok_or_else(|| RepositoryError::not_found("news", id))
    }

    pub fn create_news(&self, record: NewsRecord) -> NewsRecord {
        self.news.insert(record.id.clone(), record.clone());
        record
    }

    pub fn update_news(&self, id: &str, update: NewsUpdate) -> Result<NewsRecord, RepositoryError> {
        let mut record = self.find_news(id)?;
        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(content) = update.content {
            record.content = content;
        }
        if let Some(image_url) = update.image_url {
            record.image_url = image_url;
        }
        if let Some(category) = update.category {
            record.category = category;
        }
        record.updated_at = Utc::now();
        self.news.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn list_news(&self, category: Option<&str>, author_id: Option<&str>, page: u32, limit: u32) -> (Vec<NewsRecord>, u64) {
        let mut items = self.news.all();
        if let Some(category) = category {
            items.retain(|n| n.category == category);
        }
        if let Some(author_id) = author_id {
            items.retain(|n| n.author_user_id == author_id);
        }
        items.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        let total = items.len() as u64;
        let offset = ((page.max(1) - 1) * limit) as usize;
        let page_items = items.into_iter().skip(offset).take(limit as usize).collect();
        (page_items, total)
    }

    pub fn add_comment(&self, record: CommentRecord) -> Result<CommentRecord, RepositoryError> {
        if !self.news.contains(&record.news_id) {
            return Err(RepositoryError::not_found("news", &record.news_id));
        }
        self.comments.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn find_comment(&self, id: &str) -> Result<CommentRecord, RepositoryError> {
        self.comments.get(&id.to_string()).ok_or_else(|| RepositoryError::not_found("comment", id))
    }

    pub fn delete_comment(&self, id: &str) -> Result<(), RepositoryError> {
        self.comments.remove(&id.to_string()).ok_or_else(|| RepositoryError::not_found("comment", id))?;
        Ok(())
    }

    pub fn list_comments(&self, news_id: &str) -> Vec<CommentRecord> {
        let mut items: Vec<_> = self.comments.all().into_iter().filter(|c| c.news_id == news_id).collect();
        items.sort_by_key(|c| c.created_at);
        items
    }

    /// Toggles a like; returns the new liked state.
    pub fn toggle_like(&self, target: LikeTarget, content_id: &str, user_id: &str) -> bool {
        let key = like_key(target, content_id, user_id);
        if self.likes.contains(&key) {
            self.likes.remove(&key);
            false
        } else {
            self.likes.insert(
                key,
                LikeRecord { target, content_id: content_id.to_string(), user_id: user_id.to_string() },
            );
            true
        }
    }

    /// Deletes `news_id`, all comments under it, and all likes on the news
    /// and those comments, as one all-or-nothing step: the critical section
    /// validates existence before mutating, so no partial state is ever
    /// observable even without true rollback.
    pub async fn delete_news_cascade(&self, news_id: &str) -> Result<(), RepositoryError> {
        let news_id = news_id.to_string();
        self.transaction
            .run_in_transaction(|| {
                if !self.news.contains(&news_id) {
                    return Err(RepositoryError::not_found("news", &news_id));
                }
                let comment_ids: Vec<String> =
                    self.comments.all().into_iter().filter(|c| c.news_id == news_id).map(|c| c.id).collect();

                for comment_id in &comment_ids {
                    self.comments.remove(comment_id);
                }

                let dead_keys: Vec<String> = self
                    .likes
                    .all()
                    .into_iter()
                    .filter(|l| {
                        (l.target == LikeTarget::News && l.content_id == news_id)
                            || (l.target == LikeTarget::Comment && comment_ids.contains(&l.content_id))
                    })
                    .map(|l| like_key(l.target, &l.content_id, &l.user_id))
                    .collect();
                for key in dead_keys {
                    self.likes.remove(&key);
                }

                self.news.remove(&news_id);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_news(id: &str, author: &str) -> NewsRecord {
        let now = Utc::now();
        NewsRecord {
            id: id.to_string(),
            title: "Launch day".to_string(),
            content: "we shipped".to_string(),
            author_user_id: author.to_string(),
            image_url: String::new(),
            category: "general".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_comment(id: &str, news_id: &str) -> CommentRecord {
        let now = Utc::now();
        CommentRecord {
            id: id.to_string(),
            news_id: news_id.to_string(),
            author_user_id: "bob".to_string(),
            content: "nice".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn comment_requires_existing_parent_news() {
        let repo = NewsRepository::new();
        let err = repo.add_comment(sample_comment("c1", "missing")).unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn cascade_delete_removes_news_comments_and_likes() {
        let repo = NewsRepository::new();
        repo.create_news(sample_news("n1", "alice"));
        repo.add_comment(sample_comment("c1", "n1")).unwrap();
        repo.add_comment(sample_comment("c2", "n1")).unwrap();
        repo.toggle_like(LikeTarget::News, "n1", "bob");
        repo.toggle_like(LikeTarget::Comment, "c1", "bob");

        repo.delete_news_cascade("n1").await.unwrap();

        assert!(repo.find_news("n1").is_err());
        assert!(repo.list_comments("n1").is_empty());
        assert!(!repo.likes.contains(&like_key(LikeTarget::News, "n1", "bob")));
        assert!(!repo.likes.contains(&like_key(LikeTarget::Comment, "c1", "bob")));
    }

    #[tokio::test]
    async fn cascade_delete_on_missing_news_leaves_nothing_changed() {
        let repo = NewsRepository::new();
        let err = repo.delete_news_cascade("missing").await.unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::NotFound);
    }
}
