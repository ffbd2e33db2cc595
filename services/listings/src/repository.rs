use std::sync::Mutex;

use chrono::{DateTime, Utc};
use marketplace_platform::repository::{InMemoryStore, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    Active,
    Sold,
    Reserved,
    Inactive,
}

impl ListingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "sold" => Some(Self::Sold),
            "reserved" => Some(Self::Reserved),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Reserved => "reserved",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub owner_user_id: String,
    pub category_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub status: String,
    pub photo_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum SortField {
    CreatedAt,
    Price,
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct ListingSearch {
    pub query: Option<String>,
    pub category_id: Option<String>,
    pub owner_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub status: Option<String>,
}

#[derive(Default)]
pub struct ListingsRepository {
    store: InMemoryStore<String, ListingRecord>,
}

impl ListingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_id(&self, id: &str) -> Result<ListingRecord, RepositoryError> {
        self.store.get(&id.to_string()).ok_or_else(|| RepositoryError::not_found("listing", id))
    }

    pub fn create(&self, record: ListingRecord) -> ListingRecord {
        self.store.insert(record.id.clone(), record.clone());
        record
    }

    pub fn update(&self, id: &str, update: ListingUpdate) -> Result<ListingRecord, RepositoryError> {
        let mut record = self.find_by_id(id)?;
        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(description) = update.description {
            record.description = description;
        }
        if let Some(price) = update.price {
            record.price = price;
        }
        if let Some(category_id) = update.category_id {
            record.category_id = category_id;
        }
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn set_status(&self, id: &str, status: ListingStatus) -> Result<ListingRecord, RepositoryError> {
        let mut record = self.find_by_id(id)?;
        record.status = status.as_str().to_string();
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn append_photo(&self, id: &str, url: String) -> Result<ListingRecord, RepositoryError> {
        let mut record = self.find_by_id(id)?;
        record.photo_urls.push(url);
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.store.remove(&id.to_string()).ok_or_else(|| RepositoryError::not_found("listing", id))?;
        Ok(())
    }

    pub fn search(
        &self,
        filter: &ListingSearch,
        sort_by: SortField,
        sort_order: SortOrder,
        page: u32,
        limit: u32,
    ) -> (Vec<ListingRecord>, u64) {
        let mut items = self.store.all();

        if let Some(q) = &filter.query {
            let q = q.to_lowercase();
            items.retain(|l| l.title.to_lowercase().contains(&q) || l.description.to_lowercase().contains(&q));
        }
        if let Some(category_id) = &filter.category_id {
            items.retain(|l| &l.category_id == category_id);
        }
        if let Some(owner_id) = &filter.owner_id {
            items.retain(|l| &l.owner_user_id == owner_id);
        }
        if let Some(min_price) = filter.min_price {
            items.retain(|l| l.price >= min_price);
        }
        if let Some(max_price) = filter.max_price {
            items.retain(|l| l.price <= max_price);
        }
        if let Some(status) = &filter.status {
            items.retain(|l| &l.status == status);
        }

        match sort_by {
            SortField::CreatedAt => items.sort_by_key(|l| l.created_at),
            SortField::Price => items.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap()),
        }
        if matches!(sort_order, SortOrder::Desc) {
            items.reverse();
        }

        let total = items.len() as u64;
        let offset = ((page.max(1) - 1) * limit) as usize;
        let page_items = items.into_iter().skip(offset).take(limit as usize).collect();
        (page_items, total)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FavoriteRecord {
    pub id: String,
    pub user_id: String,
    pub listing_id: String,
    pub created_at: DateTime<Utc>,
}

/// Guards the `(user_id, listing_id)` uniqueness check-then-insert; the
/// backing `DashMap` alone cannot make that pair atomic.
#[derive(Default)]
pub struct FavoritesRepository {
    store: InMemoryStore<String, FavoriteRecord>,
    write_lock: Mutex<()>,
}

impl FavoritesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str, listing_id: &str) -> String {
        format!("{user_id}:{listing_id}")
    }

    pub fn add(&self, user_id: &str, listing_id: &str) -> Result<FavoriteRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let key = Self::key(user_id, listing_id);
        if self.store.contains(&key) {
            return Err(RepositoryError::already_exists(
                "favorite",
                format!("listing {listing_id} already favorited by {user_id}"),
            ));
        }
        let record = FavoriteRecord {
            id: key.clone(),
            user_id: user_id.to_string(),
            listing_id: listing_id.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert(key, record.clone());
        Ok(record)
    }

    pub fn remove(&self, user_id: &str, listing_id: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let key = Self::key(user_id, listing_id);
        self.store.remove(&key).ok_or_else(|| RepositoryError::not_found("favorite", key))?;
        Ok(())
    }

    pub fn list_for_user(&self, user_id: &str) -> Vec<FavoriteRecord> {
        let mut items: Vec<_> = self.store.all().into_iter().filter(|f| f.user_id == user_id).collect();
        items.sort_by_key(|f| std::cmp::Reverse(f.created_at));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, owner: &str) -> ListingRecord {
        let now = Utc::now();
        ListingRecord {
            id: id.to_string(),
            owner_user_id: owner.to_string(),
            category_id: "electronics".to_string(),
            title: "Vintage Lamp".to_string(),
            description: "a bright brass lamp".to_string(),
            price: 42.0,
            status: "active".to_string(),
            photo_urls: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let repo = ListingsRepository::new();
        repo.create(sample("l1", "u1"));
        let filter = ListingSearch { query: Some("LAMP".into()), ..Default::default() };
        let (items, total) = repo.search(&filter, SortField::CreatedAt, SortOrder::Desc, 1, 10);
        assert_eq!(total, 1);
        assert_eq!(items[0].id, "l1");
    }

    #[test]
    fn price_range_filters_out_of_bounds_listings() {
        let repo = ListingsRepository::new();
        repo.create(sample("l1", "u1"));
        let filter = ListingSearch { min_price: Some(100.0), ..Default::default() };
        let (items, total) = repo.search(&filter, SortField::CreatedAt, SortOrder::Desc, 1, 10);
        assert_eq!(total, 0);
        assert!(items.is_empty());
    }

    #[test]
    fn duplicate_favorite_is_rejected() {
        let repo = FavoritesRepository::new();
        repo.add("u1", "l1").unwrap();
        let err = repo.add("u1", "l1").unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::AlreadyExists);
    }

    #[test]
    fn removing_nonexistent_favorite_is_not_found() {
        let repo = FavoritesRepository::new();
        assert!(repo.remove("u1", "l1").is_err());
    }
}
