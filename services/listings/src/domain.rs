use std::sync::Arc;

use marketplace_platform::cache::{cache_aside, entity_key, CachePort, DEFAULT_TTL};
use marketplace_platform::error::DomainError;
use marketplace_platform::events::EventPublisher;
use marketplace_platform::storage::ObjectStoragePort;

use crate::repository::{
    FavoriteRecord, FavoritesRepository, ListingRecord, ListingSearch, ListingStatus, ListingUpdate,
    ListingsRepository, SortField, SortOrder,
};

pub struct ListingService<C: CachePort, E: EventPublisher, O: ObjectStoragePort> {
    pub listings: Arc<ListingsRepository>,
    pub favorites: Arc<FavoritesRepository>,
    pub cache: Arc<C>,
    pub events: Arc<E>,
    pub storage: Arc<O>,
}

impl<C: CachePort, E: EventPublisher, O: ObjectStoragePort> ListingService<C, E, O> {
    pub async fn create(
        &self,
        owner_user_id: String,
        category_id: String,
        title: String,
        description: String,
        price: f64,
    ) -> Result<ListingRecord, DomainError> {
        if price < 0.0 {
            return Err(DomainError::invalid("price must be non-negative"));
        }
        let now = chrono::Utc::now();
        let record = ListingRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            owner_user_id,
            category_id,
            title,
            description,
            price,
            status: "active".to_string(),
            photo_urls: vec![],
            created_at: now,
            updated_at: now,
        };
        let created = self.listings.create(record);
        self.events
            .publish_json(
                "listing.created",
                &serde_json::json!({ "listing_id": created.id, "actor_id": created.owner_user_id }),
            )
            .await;
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> Result<ListingRecord, DomainError> {
        let key = entity_key("listing", id);
        let listings = Arc::clone(&self.listings);
        let id = id.to_string();
        cache_aside(self.cache.as_ref(), &key, DEFAULT_TTL, || async move {
            listings.find_by_id(&id).map_err(DomainError::from)
        })
        .await
    }

    fn check_owner(&self, record: &ListingRecord, caller_id: &str, caller_is_admin: bool) -> Result<(), DomainError> {
        if record.owner_user_id != caller_id && !caller_is_admin {
            return Err(DomainError::forbidden("only the listing owner or an admin may modify this listing"));
        }
        Ok(())
    }

    pub async fn update(
        &self,
        listing_id: &str,
        caller_id: &str,
        caller_is_admin: bool,
        update: ListingUpdate,
    ) -> Result<ListingRecord, DomainError> {
        if let Some(price) = update.price {
            if price < 0.0 {
                return Err(DomainError::invalid("price must be non-negative"));
            }
        }
        let existing = self.listings.find_by_id(listing_id)?;
        self.check_owner(&existing, caller_id, caller_is_admin)?;
        let updated = self.listings.update(listing_id, update)?;
        self.cache.delete(&entity_key("listing", listing_id)).await;
        self.events
            .publish_json("listing.updated", &serde_json::json!({ "listing_id": listing_id, "actor_id": caller_id }))
            .await;
        Ok(updated)
    }

    pub async fn delete(&self, listing_id: &str, caller_id: &str, caller_is_admin: bool) -> Result<(), DomainError> {
        let existing = self.listings.find_by_id(listing_id)?;
        self.check_owner(&existing, caller_id, caller_is_admin)?;
        self.listings.delete(listing_id)?;
        self.cache.delete(&entity_key("listing", listing_id)).await;
        self.events
            .publish_json("listing.deleted", &serde_json::json!({ "listing_id": listing_id, "actor_id": caller_id }))
            .await;
        Ok(())
    }

    pub async fn update_status(
        &self,
        listing_id: &str,
        caller_id: &str,
        caller_is_admin: bool,
        status: &str,
    ) -> Result<ListingRecord, DomainError> {
        let existing = self.listings.find_by_id(listing_id)?;
        self.check_owner(&existing, caller_id, caller_is_admin)?;
        let status = ListingStatus::parse(status).ok_or_else(|| DomainError::invalid("unknown listing status"))?;
        let updated = self.listings.set_status(listing_id, status)?;
        self.cache.delete(&entity_key("listing", listing_id)).await;
        self.events
            .publish_json(
                "listing.status.updated",
                &serde_json::json!({ "listing_id": listing_id, "actor_id": caller_id, "status": updated.status }),
            )
            .await;
        Ok(updated)
    }

    pub fn search(
        &self,
        filter: ListingSearch,
        sort_by: &str,
        sort_order: &str,
        page: i64,
        limit: i64,
    ) -> (Vec<ListingRecord>, u64, u32, u32) {
        let pagination = marketplace_platform::repository::Pagination::new(page, limit);
        let sort_by = match sort_by {
            "price" => SortField::Price,
            _ => SortField::CreatedAt,
        };
        let sort_order = match sort_order {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        let (items, total) = self.listings.search(&filter, sort_by, sort_order, pagination.page, pagination.limit);
        (items, total, pagination.page, pagination.limit)
    }

    pub async fn upload_photo(
        &self,
        listing_id: &str,
        caller_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, DomainError> {
        let existing = self.listings.find_by_id(listing_id)?;
        if existing.owner_user_id != caller_id {
            return Err(DomainError::forbidden("only the listing owner may upload photos"));
        }
        let url = self.storage.upload(listing_id, content_type, data).await;
        self.listings.append_photo(listing_id, url.clone())?;
        self.cache.delete(&entity_key("listing", listing_id)).await;
        Ok(url)
    }

    pub fn list_photos(&self, listing_id: &str) -> Result<Vec<String>, DomainError> {
        Ok(self.listings.find_by_id(listing_id)?.photo_urls)
    }

    pub async fn add_favorite(&self, user_id: &str, listing_id: &str) -> Result<FavoriteRecord, DomainError> {
        self.listings.find_by_id(listing_id)?;
        let record = self.favorites.add(user_id, listing_id)?;
        Ok(record)
    }

    pub async fn remove_favorite(&self, user_id: &str, listing_id: &str) -> Result<(), DomainError> {
        self.favorites.remove(user_id, listing_id)?;
        Ok(())
    }

    pub fn list_favorites(&self, user_id: &str) -> Vec<FavoriteRecord> {
        self.favorites.list_for_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_platform::cache::InMemoryCachePort;
    use marketplace_platform::events::InMemoryEventPublisher;
    use marketplace_platform::storage::InMemoryObjectStore;

    fn service() -> ListingService<InMemoryCachePort, InMemoryEventPublisher, InMemoryObjectStore> {
        ListingService {
            listings: Arc::new(ListingsRepository::new()),
            favorites: Arc::new(FavoritesRepository::new()),
            cache: Arc::new(InMemoryCachePort::new()),
            events: Arc::new(InMemoryEventPublisher::new()),
            storage: Arc::new(InMemoryObjectStore::new()),
        }
    }

    #[tokio::test]
    async fn non_owner_cannot_update_listing() {
        let svc = service();
        let listing = svc
            .create("owner-1".into(), "electronics".into(), "Lamp".into(), "bright".into(), 10.0)
            .await
            .unwrap();
        let err = svc
            .update(&listing.id, "someone-else", false, ListingUpdate { title: Some("hacked".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_invalidates_cache_so_next_get_reflects_new_value() {
        let svc = service();
        let listing = svc
            .create("owner-1".into(), "electronics".into(), "Lamp".into(), "bright".into(), 10.0)
            .await
            .unwrap();
        let _ = svc.get(&listing.id).await.unwrap();
        svc.update(&listing.id, "owner-1", false, ListingUpdate { price: Some(99.0), ..Default::default() })
            .await
            .unwrap();
        let refreshed = svc.get(&listing.id).await.unwrap();
        assert_eq!(refreshed.price, 99.0);
    }

    #[tokio::test]
    async fn duplicate_favorite_is_already_exists() {
        let svc = service();
        let listing = svc
            .create("owner-1".into(), "electronics".into(), "Lamp".into(), "bright".into(), 10.0)
            .await
            .unwrap();
        svc.add_favorite("u1", &listing.id).await.unwrap();
        let err = svc.add_favorite("u1", &listing.id).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn removing_favorite_twice_is_not_found_second_time() {
        let svc = service();
        let listing = svc
            .create("owner-1".into(), "electronics".into(), "Lamp".into(), "bright".into(), 10.0)
            .await
            .unwrap();
        svc.add_favorite("u1", &listing.id).await.unwrap();
        svc.remove_favorite("u1", &listing.id).await.unwrap();
        let err = svc.remove_favorite("u1", &listing.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
