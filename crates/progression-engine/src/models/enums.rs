//! 进度引擎枚举类型定义
//!
//! 所有枚举都支持 JSON（serde）序列化

use std::fmt;

use serde::{Deserialize, Serialize};

/// 徽章条件类型
///
/// 徽章目录通过条件类型关联到提供当前指标值的条件提供者。
/// 内置类型覆盖任务、习惯、番茄钟、积分、早起登录五个领域，
/// `Custom` 允许新领域在不修改引擎的前提下注册自己的指标。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionType {
    /// 累计完成任务数
    TasksCompleted,
    /// 当前最长连续打卡天数
    HabitStreak,
    /// 累计完成番茄钟工作时段数
    PomodoroCount,
    /// 累计获得积分
    TotalPoints,
    /// 早起登录次数
    EarlyLogins,
    /// 扩展条件类型
    Custom(String),
}

impl ConditionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TasksCompleted => "tasks_completed",
            Self::HabitStreak => "habit_streak",
            Self::PomodoroCount => "pomodoro_count",
            Self::TotalPoints => "total_points",
            Self::EarlyLogins => "early_logins",
            Self::Custom(key) => key,
        }
    }

    /// 内置条件类型
    pub fn builtin() -> [ConditionType; 5] {
        [
            Self::TasksCompleted,
            Self::HabitStreak,
            Self::PomodoroCount,
            Self::TotalPoints,
            Self::EarlyLogins,
        ]
    }
}

impl From<&str> for ConditionType {
    fn from(value: &str) -> Self {
        match value {
            "tasks_completed" => Self::TasksCompleted,
            "habit_streak" => Self::HabitStreak,
            "pomodoro_count" => Self::PomodoroCount,
            "total_points" => Self::TotalPoints,
            "early_logins" => Self::EarlyLogins,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for ConditionType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConditionType> for String {
    fn from(value: ConditionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务难度
///
/// 决定任务可设置的积分范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// 该难度允许的积分范围（闭区间）
    pub fn point_range(&self) -> (i64, i64) {
        match self {
            Self::Easy => (1, 5),
            Self::Medium => (5, 15),
            Self::Hard => (15, 30),
        }
    }

    pub fn accepts(&self, points: i64) -> bool {
        let (min, max) = self.point_range();
        (min..=max).contains(&points)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// 番茄钟时段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroKind {
    /// 工作时段，计入统计并获得经验
    Work,
    /// 休息时段
    Break,
}

/// 统计周期
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    #[default]
    Week,
    Month,
}

impl StatsPeriod {
    /// 周期对应的天数（用于计算日均）
    pub fn days(&self) -> i64 {
        match self {
            Self::Today => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_type_round_trips_known_keys() {
        for ct in ConditionType::builtin() {
            assert_eq!(ConditionType::from(ct.as_str()), ct);
        }
    }

    #[test]
    fn test_condition_type_custom_key() {
        let ct = ConditionType::from("rewards_redeemed");
        assert_eq!(ct, ConditionType::Custom("rewards_redeemed".to_string()));
        assert_eq!(ct.to_string(), "rewards_redeemed");
    }

    #[test]
    fn test_condition_type_serde_as_string() {
        let json = serde_json::to_string(&ConditionType::HabitStreak).unwrap();
        assert_eq!(json, "\"habit_streak\"");

        let parsed: ConditionType = serde_json::from_str("\"pomodoro_count\"").unwrap();
        assert_eq!(parsed, ConditionType::PomodoroCount);
    }

    #[test]
    fn test_difficulty_point_ranges() {
        assert!(Difficulty::Easy.accepts(1));
        assert!(Difficulty::Easy.accepts(5));
        assert!(!Difficulty::Easy.accepts(6));
        assert!(Difficulty::Medium.accepts(5));
        assert!(!Difficulty::Medium.accepts(16));
        assert!(Difficulty::Hard.accepts(30));
        assert!(!Difficulty::Hard.accepts(14));
    }

    #[test]
    fn test_stats_period_days() {
        assert_eq!(StatsPeriod::Today.days(), 1);
        assert_eq!(StatsPeriod::Week.days(), 7);
        assert_eq!(StatsPeriod::Month.days(), 30);
    }
}
