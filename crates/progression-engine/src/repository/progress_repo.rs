//! 用户进度仓储（内存实现）

use async_trait::async_trait;

use super::memory_store::MemoryStore;
use super::traits::UserProgressRepositoryTrait;
use crate::error::Result;
use crate::models::UserProgress;

/// 用户进度仓储
#[derive(Debug, Clone, Default)]
pub struct UserProgressRepository {
    store: MemoryStore<UserProgress>,
}

impl UserProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProgressRepositoryTrait for UserProgressRepository {
    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        Ok(self.store.get(user_id))
    }

    async fn create_progress(&self, progress: &UserProgress) -> Result<bool> {
        Ok(self
            .store
            .insert_if_absent(&progress.user_id, progress.clone()))
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.store.insert(&progress.user_id, progress.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let repo = UserProgressRepository::new();
        let mut progress = UserProgress::new("user-1");
        assert!(repo.create_progress(&progress).await.unwrap());

        progress.level = 9;
        assert!(!repo.create_progress(&progress).await.unwrap());
        let stored = repo.get_progress("user-1").await.unwrap().unwrap();
        assert_eq!(stored.level, 1);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let repo = UserProgressRepository::new();
        let mut progress = UserProgress::new("user-1");
        repo.create_progress(&progress).await.unwrap();

        progress.earn_points(30).unwrap();
        repo.save_progress(&progress).await.unwrap();
        let stored = repo.get_progress("user-1").await.unwrap().unwrap();
        assert_eq!(stored.current_points, 30);
        assert!(repo.get_progress("missing").await.unwrap().is_none());
    }
}
