//! 习惯与打卡日志仓储（内存实现）

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use super::memory_store::MemoryStore;
use super::traits::{HabitLogRepositoryTrait, HabitRepositoryTrait};
use crate::error::Result;
use crate::models::{Habit, HabitCompletion};

/// 习惯仓储
#[derive(Debug, Clone, Default)]
pub struct HabitRepository {
    store: MemoryStore<Habit>,
}

impl HabitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HabitRepositoryTrait for HabitRepository {
    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>> {
        Ok(self.store.get(habit_id))
    }

    async fn list_habits_by_user(&self, user_id: &str) -> Result<Vec<Habit>> {
        let mut habits = self.store.list_by(|h| h.is_owned_by(user_id));
        habits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(habits)
    }

    async fn save_habit(&self, habit: &Habit) -> Result<()> {
        self.store.insert(&habit.id, habit.clone());
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<bool> {
        Ok(self.store.remove(habit_id).is_some())
    }
}

/// 打卡日志仓储
///
/// 每个习惯一个有序日期集合，天然保证同日唯一
#[derive(Debug, Default)]
pub struct HabitLogRepository {
    logs: DashMap<String, BTreeSet<NaiveDate>>,
}

impl HabitLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HabitLogRepositoryTrait for HabitLogRepository {
    async fn is_completed_on(&self, habit_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .logs
            .get(habit_id)
            .is_some_and(|dates| dates.contains(&date)))
    }

    async fn insert_completion(&self, completion: &HabitCompletion) -> Result<bool> {
        Ok(self
            .logs
            .entry(completion.habit_id.clone())
            .or_default()
            .insert(completion.completed_on))
    }

    async fn remove_completion(&self, completion: &HabitCompletion) -> Result<bool> {
        Ok(self
            .logs
            .get_mut(&completion.habit_id)
            .is_some_and(|mut dates| dates.remove(&completion.completed_on)))
    }

    async fn list_completions(&self, habit_id: &str) -> Result<Vec<NaiveDate>> {
        Ok(self
            .logs
            .get(habit_id)
            .map(|dates| dates.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn delete_by_habit(&self, habit_id: &str) -> Result<usize> {
        Ok(self
            .logs
            .remove(habit_id)
            .map(|(_, dates)| dates.len())
            .unwrap_or(0))
    }
}
