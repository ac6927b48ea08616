//! 任务、番茄钟、奖励、登录仓储（内存实现）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::memory_store::MemoryStore;
use super::traits::{
    LoginRepositoryTrait, PomodoroRepositoryTrait, RewardRepositoryTrait, TaskRepositoryTrait,
};
use crate::error::Result;
use crate::models::{LoginEvent, PomodoroKind, PomodoroSession, Reward, Task};

/// 任务仓储
#[derive(Debug, Clone, Default)]
pub struct TaskRepository {
    store: MemoryStore<Task>,
}

impl TaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepositoryTrait for TaskRepository {
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.store.get(task_id))
    }

    async fn list_tasks_by_user(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self.store.list_by(|t| t.is_owned_by(user_id)))
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        self.store.insert(&task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool> {
        Ok(self.store.remove(task_id).is_some())
    }

    async fn count_completed(&self, user_id: &str) -> Result<i64> {
        Ok(self
            .store
            .count_by(|t| t.is_owned_by(user_id) && t.completed) as i64)
    }
}

/// 番茄钟仓储
#[derive(Debug, Clone, Default)]
pub struct PomodoroRepository {
    store: MemoryStore<PomodoroSession>,
}

impl PomodoroRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PomodoroRepositoryTrait for PomodoroRepository {
    async fn create_session(&self, session: &PomodoroSession) -> Result<()> {
        self.store.insert(&session.id, session.clone());
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.remove(session_id).is_some())
    }

    async fn list_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PomodoroSession>> {
        let mut sessions = self
            .store
            .list_by(|s| s.user_id == user_id && s.completed_at >= since);
        sessions.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
        Ok(sessions)
    }

    async fn count_by_kind(&self, user_id: &str, kind: PomodoroKind) -> Result<i64> {
        Ok(self
            .store
            .count_by(|s| s.user_id == user_id && s.kind == kind) as i64)
    }
}

/// 奖励仓储
#[derive(Debug, Clone, Default)]
pub struct RewardRepository {
    store: MemoryStore<Reward>,
}

impl RewardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        Ok(self.store.get(reward_id))
    }

    async fn list_rewards_by_user(&self, user_id: &str) -> Result<Vec<Reward>> {
        Ok(self.store.list_by(|r| r.is_owned_by(user_id)))
    }

    async fn save_reward(&self, reward: &Reward) -> Result<()> {
        self.store.insert(&reward.id, reward.clone());
        Ok(())
    }

    async fn delete_reward(&self, reward_id: &str) -> Result<bool> {
        Ok(self.store.remove(reward_id).is_some())
    }
}

/// 登录记录仓储
#[derive(Debug, Default)]
pub struct LoginRepository {
    events: DashMap<String, Vec<LoginEvent>>,
}

impl LoginRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginRepositoryTrait for LoginRepository {
    async fn record_login(&self, event: &LoginEvent) -> Result<()> {
        self.events
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn count_logins_before_hour(&self, user_id: &str, hour: u32) -> Result<i64> {
        Ok(self
            .events
            .get(user_id)
            .map(|events| events.iter().filter(|e| e.is_before_hour(hour)).count() as i64)
            .unwrap_or(0))
    }
}
