//! 触发进度变化的外围实体：任务、番茄钟、奖励、登录

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Difficulty, PomodoroKind};

/// 任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub difficulty: Difficulty,
    /// 完成时获得的积分
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_pending(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.updated_at = Utc::now();
    }
}

/// 创建任务请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub points: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, difficulty: Difficulty, points: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            difficulty,
            points,
            category_id: None,
            due_date: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn into_task(self, user_id: impl Into<String>) -> Task {
        let now = Utc::now();
        Task {
            id: format!("task-{}", Uuid::now_v7()),
            user_id: user_id.into(),
            title: self.title,
            description: self.description.filter(|d| !d.is_empty()),
            difficulty: self.difficulty,
            points: self.points,
            category_id: self.category_id,
            due_date: self.due_date,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 番茄钟时段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: String,
    pub user_id: String,
    /// 时长（分钟）
    pub duration_minutes: u32,
    pub kind: PomodoroKind,
    pub completed_at: DateTime<Utc>,
}

impl PomodoroSession {
    pub fn new(
        user_id: impl Into<String>,
        duration_minutes: u32,
        kind: PomodoroKind,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("pomo-{}", Uuid::now_v7()),
            user_id: user_id.into(),
            duration_minutes,
            kind,
            completed_at,
        }
    }
}

/// 奖励（用积分兑换）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub redeemed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        cost: i64,
        icon: Option<String>,
    ) -> Self {
        Self {
            id: format!("reward-{}", Uuid::now_v7()),
            user_id: user_id.into(),
            name: name.into(),
            description: description.into(),
            cost,
            icon,
            redeemed: false,
            redeemed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// 登录事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginEvent {
    pub user_id: String,
    /// 服务器本地时间
    pub logged_in_at: NaiveDateTime,
}

impl LoginEvent {
    /// 是否早于指定小时
    pub fn is_before_hour(&self, hour: u32) -> bool {
        self.logged_in_at.hour() < hour
    }
}
