//! 习惯与打卡记录

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 习惯
///
/// `streak` 是打卡记录的缓存投影，`best_streak` 是历史最高值，只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// 当前连续打卡天数
    pub streak: u32,
    /// 历史最长连续打卡天数
    pub best_streak: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, icon: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("habit-{}", Uuid::now_v7()),
            user_id: user_id.into(),
            name: name.into(),
            icon,
            streak: 0,
            best_streak: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否属于指定用户
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// 打卡记录
///
/// 同一习惯同一天最多一条
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub habit_id: String,
    pub completed_on: NaiveDate,
}

impl HabitCompletion {
    pub fn new(habit_id: impl Into<String>, completed_on: NaiveDate) -> Self {
        Self {
            habit_id: habit_id.into(),
            completed_on,
        }
    }
}

/// 带今日打卡状态的习惯视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed_today: bool,
}

impl HabitView {
    pub fn new(habit: Habit, completed_today: bool) -> Self {
        Self {
            habit,
            completed_today,
        }
    }
}
