use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{Task, TaskUpdate, User};

/// Users keyed by id. Email uniqueness is checked under the write lock.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Uuid, StoreError> {
        let id = task.id;
        self.tasks.write().await.insert(id, task);
        Ok(id)
    }

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| t.user_id == owner).cloned())
    }

    async fn find_many(&self, owner: Uuid, skip: u64, limit: u64) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<&Task> = tasks.values().filter(|t| t.user_id == owner).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, owner: Uuid) -> Result<u64, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| t.user_id == owner).count() as u64)
    }

    async fn update_one(
        &self,
        id: Uuid,
        owner: Uuid,
        update: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id).filter(|t| t.user_id == owner) {
            Some(task) => {
                task.apply(update, updated_at);
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.get(&id).is_some_and(|t| t.user_id == owner) {
            tasks.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| t.user_id != owner);
        Ok((before - tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTaskRequest, NewUser};

    fn user(email: &str) -> User {
        User::new(NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        })
    }

    fn task(owner: Uuid, title: &str) -> Task {
        Task::new(
            CreateTaskRequest {
                title: title.to_string(),
                subject: "Rust".to_string(),
                ..Default::default()
            },
            owner,
        )
    }

    #[actix_rt::test]
    async fn test_email_uniqueness_at_write_time() {
        let store = MemoryUserStore::new();
        store.insert(user("dup@example.com")).await.unwrap();

        let second = store.insert(user("dup@example.com")).await;
        assert!(matches!(second, Err(StoreError::DuplicateEmail)));

        // Emails are compared exactly as stored.
        assert!(store.insert(user("Dup@example.com")).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_single_task_operations_require_owner_match() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let id = store.insert(task(owner, "mine")).await.unwrap();

        assert!(store.find_one(id, stranger).await.unwrap().is_none());
        assert!(store
            .update_one(id, stranger, &TaskUpdate::default(), Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_one(id, stranger).await.unwrap());

        assert!(store.find_one(id, owner).await.unwrap().is_some());
        assert!(store.delete_one(id, owner).await.unwrap());
        assert!(!store.delete_one(id, owner).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_find_many_is_newest_first_and_paged() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        for i in 0..5 {
            let mut t = task(owner, &format!("task {}", i));
            t.created_at = Utc::now() + chrono::Duration::seconds(i);
            store.insert(t).await.unwrap();
        }
        store.insert(task(Uuid::new_v4(), "other")).await.unwrap();

        let page = store.find_many(owner, 1, 2).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task 3", "task 2"]);
        assert_eq!(store.count(owner).await.unwrap(), 5);
    }

    #[actix_rt::test]
    async fn test_delete_by_owner() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(task(owner, "a")).await.unwrap();
        store.insert(task(owner, "b")).await.unwrap();
        store.insert(task(other, "c")).await.unwrap();

        assert_eq!(store.delete_by_owner(owner).await.unwrap(), 2);
        assert_eq!(store.count(owner).await.unwrap(), 0);
        assert_eq!(store.count(other).await.unwrap(), 1);
    }
}
