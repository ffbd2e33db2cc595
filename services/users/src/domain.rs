use std::sync::Arc;

use marketplace_platform::auth::{PasswordHasher, TokenVerifier};
use marketplace_platform::error::DomainError;
use marketplace_platform::events::EventPublisher;

use crate::repository::{UserRecord, UserUpdate, UsersRepository};

pub struct UserService<E: EventPublisher> {
    pub repo: Arc<UsersRepository>,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<TokenVerifier>,
    pub events: Arc<E>,
    pub token_ttl_secs: i64,
}

impl<E: EventPublisher> UserService<E> {
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
        phone: String,
    ) -> Result<UserRecord, DomainError> {
        let password_hash = self.hasher.hash(&password)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = chrono::Utc::now();
        let record = UserRecord {
            id,
            username,
            email,
            phone,
            password_hash,
            role: "customer".to_string(),
            active: true,
            email_verified: false,
            verified_at: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create(record)?;
        self.events.publish_json("user.created", &serde_json::json!({
            "user_id": created.id,
            "actor_id": created.id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })).await;
        Ok(created)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, UserRecord), DomainError> {
        let record = self
            .repo
            .find_by_email(email)
            .ok_or_else(|| DomainError::not_found("no account with that email"))?;
        if !record.active {
            return Err(DomainError::forbidden("account is deactivated"));
        }
        let ok = self.hasher.verify(password, &record.password_hash)?;
        if !ok {
            return Err(DomainError::invalid("incorrect email or password"));
        }
        let token = self
            .tokens
            .issue(&record.id, &record.role, self.token_ttl_secs)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok((token, record))
    }

    pub fn get_profile(&self, user_id: &str) -> Result<UserRecord, DomainError> {
        Ok(self.repo.find_by_id(user_id)?)
    }

    pub async fn update_profile(
        &self,
        caller_id: &str,
        target_id: &str,
        caller_is_admin: bool,
        username: Option<String>,
        phone: Option<String>,
    ) -> Result<UserRecord, DomainError> {
        if caller_id != target_id && !caller_is_admin {
            return Err(DomainError::forbidden("cannot update another user's profile"));
        }
        let updated = self.repo.update(target_id, UserUpdate { username, phone })?;
        self.events
            .publish_json("user.updated", &serde_json::json!({ "user_id": target_id, "actor_id": caller_id }))
            .await;
        Ok(updated)
    }

    pub async fn change_password(
        &self,
        caller_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let record = self.repo.find_by_id(caller_id)?;
        if !self.hasher.verify(old_password, &record.password_hash)? {
            return Err(DomainError::invalid("current password is incorrect"));
        }
        let new_hash = self.hasher.hash(new_password)?;
        self.repo.set_password_hash(caller_id, new_hash)?;
        Ok(())
    }

    pub async fn delete_account(
        &self,
        caller_id: &str,
        target_id: &str,
        caller_is_admin: bool,
    ) -> Result<(), DomainError> {
        if caller_id != target_id && !caller_is_admin {
            return Err(DomainError::forbidden("cannot delete another user's account"));
        }
        self.repo.delete(target_id)?;
        self.events
            .publish_json("user.deleted", &serde_json::json!({ "user_id": target_id, "actor_id": caller_id }))
            .await;
        Ok(())
    }

    pub async fn deactivate_account(&self, caller_id: &str, target_id: &str, caller_is_admin: bool) -> Result<UserRecord, DomainError> {
        if caller_id != target_id && !caller_is_admin {
            return Err(DomainError::forbidden("cannot deactivate another user's account"));
        }
        Ok(self.repo.set_active(target_id, false)?)
    }

    pub fn admin_list(&self, page: u32, limit: u32) -> (Vec<UserRecord>, u64) {
        self.repo.list(None, page, limit)
    }

    pub fn admin_search(&self, query: &str, page: u32, limit: u32) -> (Vec<UserRecord>, u64) {
        self.repo.list(Some(query), page, limit)
    }

    pub async fn admin_delete(&self, target_id: &str) -> Result<(), DomainError> {
        self.repo.delete(target_id)?;
        Ok(())
    }

    pub fn admin_update_role(&self, target_id: &str, role: String) -> Result<UserRecord, DomainError> {
        Ok(self.repo.set_role(target_id, role)?)
    }

    pub fn admin_set_active(&self, target_id: &str, active: bool) -> Result<UserRecord, DomainError> {
        Ok(self.repo.set_active(target_id, active)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_platform::events::InMemoryEventPublisher;

    fn service() -> UserService<InMemoryEventPublisher> {
        UserService {
            repo: Arc::new(UsersRepository::new()),
            hasher: Arc::new(PasswordHasher::default()),
            tokens: Arc::new(TokenVerifier::new("test-secret")),
            events: Arc::new(InMemoryEventPublisher::new()),
            token_ttl_secs: 3600,
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let svc = service();
        let user = svc
            .register("alice".into(), "a@x.com".into(), "password123".into(), "1".into())
            .await
            .unwrap();
        assert_eq!(user.role, "customer");

        let (token, logged_in) = svc.login("a@x.com", "password123").await.unwrap();
        assert!(!token.is_empty());
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_invalid_input() {
        let svc = service();
        svc.register("alice".into(), "a@x.com".into(), "password123".into(), "1".into()).await.unwrap();
        let err = svc.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn non_owner_cannot_update_profile() {
        let svc = service();
        let user = svc.register("alice".into(), "a@x.com".into(), "password123".into(), "1".into()).await.unwrap();
        let err = svc
            .update_profile("someone-else", &user.id, false, Some("mallory".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_can_update_another_users_profile() {
        let svc = service();
        let user = svc.register("alice".into(), "a@x.com".into(), "password123".into(), "1".into()).await.unwrap();
        let updated = svc.update_profile("admin-1", &user.id, true, Some("renamed".into()), None).await.unwrap();
        assert_eq!(updated.username, "renamed");
    }
}
