use std::sync::Mutex;

use chrono::{DateTime, Utc};
use marketplace_platform::repository::{InMemoryStore, RepositoryError};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub email_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub phone: Option<String>,
}

/// Guards the email-uniqueness check-then-insert with a single mutex; the
/// `DashMap` alone cannot make "does this email already exist" and "insert
/// the new row" atomic across concurrent registrations.
pub struct UsersRepository {
    store: InMemoryStore<String, UserRecord>,
    write_lock: Mutex<()>,
}

impl Default for UsersRepository {
    fn default() -> Self {
        Self { store: InMemoryStore::new(), write_lock: Mutex::new(()) }
    }
}

impl UsersRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_id(&self, id: &str) -> Result<UserRecord, RepositoryError> {
        self.store.get(&id.to_string()).ok_or_else(|| RepositoryError::not_found("user", id))
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.store.all().into_iter().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn create(&self, mut record: UserRecord) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        if self.find_by_email(&record.email).is_some() {
            return Err(RepositoryError::already_exists("user", format!("email {} already registered", record.email)));
        }
        record.created_at = Utc::now();
        record.updated_at = record.created_at;
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn update(&self, id: &str, update: UserUpdate) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        if let Some(username) = update.username {
            record.username = username;
        }
        if let Some(phone) = update.phone {
            record.phone = phone;
        }
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn set_password_hash(&self, id: &str, password_hash: String) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        record.password_hash = password_hash;
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn set_role(&self, id: &str, role: String) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        record.role = role;
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut record = self.find_by_id(id)?;
        record.active = active;
        record.updated_at = Utc::now();
        self.store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().unwrap();
        self.store.remove(&id.to_string()).ok_or_else(|| RepositoryError::not_found("user", id))?;
        Ok(())
    }

    pub fn list(&self, query: Option<&str>, page: u32, limit: u32) -> (Vec<UserRecord>, u64) {
        let mut all = self.store.all();
        all.sort_by_key(|u| u.created_at);
        if let Some(q) = query {
            let q = q.to_lowercase();
            all.retain(|u| u.username.to_lowercase().contains(&q) || u.email.to_lowercase().contains(&q));
        }
        let total = all.len() as u64;
        let offset = ((page.max(1) - 1) * limit) as usize;
        let items = all.into_iter().skip(offset).take(limit as usize).collect();
        (items, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: id.to_string(),
            email: email.to_string(),
            phone: "1".to_string(),
            password_hash: "hash".to_string(),
            role: "customer".to_string(),
            active: true,
            email_verified: false,
            verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let repo = UsersRepository::new();
        repo.create(sample("u1", "a@x.com")).unwrap();
        let err = repo.create(sample("u2", "a@x.com")).unwrap_err();
        assert_eq!(err.kind, marketplace_platform::repository::RepositoryErrorKind::AlreadyExists);
    }

    #[test]
    fn update_bumps_updated_at_and_keeps_created_at() {
        let repo = UsersRepository::new();
        let created = repo.create(sample("u1", "a@x.com")).unwrap();
        let updated = repo.update("u1", UserUpdate { username: Some("new".into()), phone: None }).unwrap();
        assert_eq!(updated.username, "new");
        assert_eq!(updated.created_at, created.created_at);
    }
}
