//! 用户徽章仓储（内存实现）

use async_trait::async_trait;

use super::memory_store::MemoryStore;
use super::traits::UserBadgeRepositoryTrait;
use crate::error::Result;
use crate::models::UserBadge;

/// 用户徽章仓储
///
/// 以 `{user_id}:{badge_id}` 为键，重复创建不会覆盖原解锁时间
#[derive(Debug, Clone, Default)]
pub struct UserBadgeRepository {
    store: MemoryStore<UserBadge>,
}

impl UserBadgeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str, badge_id: &str) -> String {
        format!("{user_id}:{badge_id}")
    }
}

#[async_trait]
impl UserBadgeRepositoryTrait for UserBadgeRepository {
    async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>> {
        let mut badges = self.store.list_by(|b| b.user_id == user_id);
        badges.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
        Ok(badges)
    }

    async fn get_user_badge(&self, user_id: &str, badge_id: &str) -> Result<Option<UserBadge>> {
        Ok(self.store.get(&Self::key(user_id, badge_id)))
    }

    async fn create_user_badge(&self, badge: &UserBadge) -> Result<bool> {
        Ok(self
            .store
            .insert_if_absent(&Self::key(&badge.user_id, &badge.badge_id), badge.clone()))
    }
}
