//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于核心组件依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{
    Habit, HabitCompletion, LoginEvent, PomodoroKind, PomodoroSession, Reward, Task, UserBadge,
    UserProgress,
};

/// 用户进度仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProgressRepositoryTrait: Send + Sync {
    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>>;
    /// 仅在不存在时创建，已存在返回 false
    async fn create_progress(&self, progress: &UserProgress) -> Result<bool>;
    async fn save_progress(&self, progress: &UserProgress) -> Result<()>;
}

/// 习惯仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HabitRepositoryTrait: Send + Sync {
    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>>;
    async fn list_habits_by_user(&self, user_id: &str) -> Result<Vec<Habit>>;
    async fn save_habit(&self, habit: &Habit) -> Result<()>;
    async fn delete_habit(&self, habit_id: &str) -> Result<bool>;
}

/// 打卡日志仓储接口
///
/// 只追加的 (habit_id, 日期) 集合，撤销打卡是唯一的删除路径
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HabitLogRepositoryTrait: Send + Sync {
    async fn is_completed_on(&self, habit_id: &str, date: NaiveDate) -> Result<bool>;
    /// 插入打卡记录，同日已存在时返回 false
    async fn insert_completion(&self, completion: &HabitCompletion) -> Result<bool>;
    /// 删除打卡记录，不存在时返回 false
    async fn remove_completion(&self, completion: &HabitCompletion) -> Result<bool>;
    /// 按日期升序返回全部打卡日期
    async fn list_completions(&self, habit_id: &str) -> Result<Vec<NaiveDate>>;
    async fn delete_by_habit(&self, habit_id: &str) -> Result<usize>;
}

/// 用户徽章仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserBadgeRepositoryTrait: Send + Sync {
    async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>>;
    async fn get_user_badge(&self, user_id: &str, badge_id: &str) -> Result<Option<UserBadge>>;
    /// 创建解锁记录，(user_id, badge_id) 已存在时返回 false 且不覆盖
    async fn create_user_badge(&self, badge: &UserBadge) -> Result<bool>;
}

/// 任务仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepositoryTrait: Send + Sync {
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>>;
    async fn list_tasks_by_user(&self, user_id: &str) -> Result<Vec<Task>>;
    async fn save_task(&self, task: &Task) -> Result<()>;
    async fn delete_task(&self, task_id: &str) -> Result<bool>;
    async fn count_completed(&self, user_id: &str) -> Result<i64>;
}

/// 番茄钟仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PomodoroRepositoryTrait: Send + Sync {
    async fn create_session(&self, session: &PomodoroSession) -> Result<()>;
    async fn delete_session(&self, session_id: &str) -> Result<bool>;
    async fn list_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PomodoroSession>>;
    async fn count_by_kind(&self, user_id: &str, kind: PomodoroKind) -> Result<i64>;
}

/// 奖励仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>>;
    async fn list_rewards_by_user(&self, user_id: &str) -> Result<Vec<Reward>>;
    async fn save_reward(&self, reward: &Reward) -> Result<()>;
    async fn delete_reward(&self, reward_id: &str) -> Result<bool>;
}

/// 登录记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginRepositoryTrait: Send + Sync {
    async fn record_login(&self, event: &LoginEvent) -> Result<()>;
    /// 统计早于指定小时的登录次数
    async fn count_logins_before_hour(&self, user_id: &str, hour: u32) -> Result<i64>;
}
