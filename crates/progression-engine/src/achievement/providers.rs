//! 内置条件提供者
//!
//! - `tasks_completed`: 已完成任务数
//! - `habit_streak`: 所有习惯中最大的当前连续天数
//! - `pomodoro_count`: 已完成的番茄钟工作时段数
//! - `total_points`: 累计获得积分
//! - `early_logins`: 早于配置小时的登录次数

use std::sync::Arc;

use async_trait::async_trait;

use super::provider::ConditionProvider;
use crate::error::{ProgressionError, Result};
use crate::models::{ConditionType, PomodoroKind};
use crate::repository::{
    LoginRepositoryTrait, PomodoroRepositoryTrait, TaskRepositoryTrait,
    UserProgressRepositoryTrait,
};
use crate::streak::StreakTracker;

/// 已完成任务数
pub struct TasksCompletedProvider {
    task_repo: Arc<dyn TaskRepositoryTrait>,
}

impl TasksCompletedProvider {
    pub fn new(task_repo: Arc<dyn TaskRepositoryTrait>) -> Self {
        Self { task_repo }
    }
}

#[async_trait]
impl ConditionProvider for TasksCompletedProvider {
    fn condition_type(&self) -> ConditionType {
        ConditionType::TasksCompleted
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        self.task_repo.count_completed(user_id).await
    }

    fn description(&self) -> &str {
        "已完成任务数"
    }
}

/// 最大当前连续打卡天数
pub struct HabitStreakProvider {
    streaks: Arc<StreakTracker>,
}

impl HabitStreakProvider {
    pub fn new(streaks: Arc<StreakTracker>) -> Self {
        Self { streaks }
    }
}

#[async_trait]
impl ConditionProvider for HabitStreakProvider {
    fn condition_type(&self) -> ConditionType {
        ConditionType::HabitStreak
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        Ok(i64::from(self.streaks.max_streak(user_id).await?))
    }

    fn description(&self) -> &str {
        "最大连续打卡天数"
    }
}

/// 番茄钟工作时段数
pub struct PomodoroCountProvider {
    pomodoro_repo: Arc<dyn PomodoroRepositoryTrait>,
}

impl PomodoroCountProvider {
    pub fn new(pomodoro_repo: Arc<dyn PomodoroRepositoryTrait>) -> Self {
        Self { pomodoro_repo }
    }
}

#[async_trait]
impl ConditionProvider for PomodoroCountProvider {
    fn condition_type(&self) -> ConditionType {
        ConditionType::PomodoroCount
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        self.pomodoro_repo
            .count_by_kind(user_id, PomodoroKind::Work)
            .await
    }

    fn description(&self) -> &str {
        "番茄钟工作时段数"
    }
}

/// 累计获得积分
///
/// 读取 `total_earned_points`，消费不影响该指标
pub struct TotalPointsProvider {
    progress_repo: Arc<dyn UserProgressRepositoryTrait>,
}

impl TotalPointsProvider {
    pub fn new(progress_repo: Arc<dyn UserProgressRepositoryTrait>) -> Self {
        Self { progress_repo }
    }
}

#[async_trait]
impl ConditionProvider for TotalPointsProvider {
    fn condition_type(&self) -> ConditionType {
        ConditionType::TotalPoints
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        self.progress_repo
            .get_progress(user_id)
            .await?
            .map(|p| p.total_earned_points)
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.to_string()))
    }

    fn description(&self) -> &str {
        "累计获得积分"
    }
}

/// 早起登录次数
pub struct EarlyLoginsProvider {
    login_repo: Arc<dyn LoginRepositoryTrait>,
    before_hour: u32,
}

impl EarlyLoginsProvider {
    pub fn new(login_repo: Arc<dyn LoginRepositoryTrait>, before_hour: u32) -> Self {
        Self {
            login_repo,
            before_hour,
        }
    }
}

#[async_trait]
impl ConditionProvider for EarlyLoginsProvider {
    fn condition_type(&self) -> ConditionType {
        ConditionType::EarlyLogins
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        self.login_repo
            .count_logins_before_hour(user_id, self.before_hour)
            .await
    }

    fn description(&self) -> &str {
        "早起登录次数"
    }
}
