//! 服务层数据传输对象
//!
//! 定义动作服务的请求与响应结构

use serde::{Deserialize, Serialize};

use crate::models::{
    Difficulty, HabitView, LevelUpOutcome, PomodoroSession, Reward, StatsPeriod, Task,
};

// ==================== 通用 ====================

/// 一次游戏化动作的奖励结算
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionOutcome {
    #[serde(rename = "xpEarned")]
    pub xp_earned: i64,
    pub leveled_up: bool,
    pub new_level: u32,
    /// 本次新解锁的徽章 ID
    pub new_badges: Vec<String>,
}

impl ProgressionOutcome {
    pub fn new(xp_earned: i64, level: LevelUpOutcome, new_badges: Vec<String>) -> Self {
        Self {
            xp_earned,
            leveled_up: level.leveled_up,
            new_level: level.new_level,
            new_badges,
        }
    }

    /// 未发放经验，仅评估徽章
    pub fn badges_only(current_level: u32, new_badges: Vec<String>) -> Self {
        Self {
            xp_earned: 0,
            leveled_up: false,
            new_level: current_level,
            new_badges,
        }
    }
}

// ==================== 用户进度 ====================

/// 进度摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub user_id: String,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: i64,
    #[serde(rename = "requiredXP")]
    pub required_xp: i64,
    pub progress_percent: f64,
    pub total_earned_points: i64,
    pub total_spent_points: i64,
    pub current_points: i64,
}

/// 任务概况
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverview {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// 完成率（0-100 取整）
    pub completion_rate: u32,
}

/// 习惯概况
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitOverview {
    pub total: usize,
    pub completed_today: usize,
    pub current_max_streak: u32,
    pub best_streak: u32,
}

/// 总览统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub progress: ProgressSummary,
    pub tasks: TaskOverview,
    pub habits: HabitOverview,
    pub badges_unlocked: usize,
}

// ==================== 习惯 ====================

/// 习惯打卡响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCheckResponse {
    pub habit: HabitView,
    #[serde(flatten)]
    pub outcome: ProgressionOutcome,
}

// ==================== 任务 ====================

/// 任务状态筛选
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

/// 任务列表筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default)]
    pub status: TaskStatusFilter,
    pub difficulty: Option<Difficulty>,
    pub category_id: Option<String>,
    /// 标题或描述包含的关键字（不区分大小写）
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            TaskStatusFilter::All => true,
            TaskStatusFilter::Pending => !task.completed,
            TaskStatusFilter::Completed => task.completed,
        };
        if !status_ok {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != task.difficulty) {
            return false;
        }
        if let Some(category_id) = &self.category_id
            && task.category_id.as_deref() != Some(category_id.as_str())
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let query = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&query);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query));
            return in_title || in_description;
        }
        true
    }
}

/// 任务更新请求
///
/// 只允许修改标题、描述和分类，难度与积分创建后不可变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    /// 传入空字符串表示清空描述
    pub description: Option<String>,
    pub category_id: Option<String>,
}

/// 任务列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
}

/// 任务完成响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompleteResponse {
    pub task: Task,
    pub points_earned: i64,
    #[serde(flatten)]
    pub outcome: ProgressionOutcome,
}

/// 撤销任务完成响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUncompleteResponse {
    pub task: Task,
    pub points_deducted: i64,
}

// ==================== 番茄钟 ====================

/// 番茄钟完成响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroCompleteResponse {
    pub session: PomodoroSession,
    #[serde(flatten)]
    pub outcome: ProgressionOutcome,
}

/// 番茄钟统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroStats {
    pub period: StatsPeriod,
    /// 工作时段数
    pub total_sessions: usize,
    pub total_work_minutes: u64,
    pub total_break_minutes: u64,
    /// 日均工作时段数（保留一位小数）
    pub average_per_day: f64,
}

// ==================== 奖励 ====================

/// 创建奖励请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewReward {
    pub fn new(name: impl Into<String>, cost: i64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            cost,
            icon: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// 兑换响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub reward: Reward,
    pub points_spent: i64,
    pub current_points: i64,
}

// ==================== 登录 ====================

/// 登录记录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// 是否计为早起登录
    pub early: bool,
    pub new_badges: Vec<String>,
}
