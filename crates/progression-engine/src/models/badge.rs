//! 徽章定义与解锁记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ConditionType;

/// 徽章定义（静态目录条目）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub condition_type: ConditionType,
    /// 解锁阈值，None 表示不会被自动解锁
    pub condition_value: Option<i64>,
}

impl BadgeDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        condition_type: ConditionType,
        condition_value: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            condition_type,
            condition_value,
        }
    }

    /// 是否可被自动评估解锁
    pub fn is_auto_unlockable(&self) -> bool {
        self.condition_value.is_some()
    }

    /// 当前指标值是否满足解锁条件
    pub fn is_satisfied_by(&self, current_value: i64) -> bool {
        self.condition_value
            .is_some_and(|threshold| current_value >= threshold)
    }
}

/// 用户徽章（解锁记录）
///
/// 每个 (user_id, badge_id) 至多一条，创建后不可删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    pub user_id: String,
    pub badge_id: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UserBadge {
    pub fn unlocked_now(user_id: impl Into<String>, badge_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            badge_id: badge_id.into(),
            unlocked_at: Utc::now(),
        }
    }
}

/// 带解锁状态的徽章视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatusView {
    #[serde(flatten)]
    pub definition: BadgeDefinition,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_comparison_is_inclusive() {
        let badge = BadgeDefinition::new(
            "points_100",
            "Point Hunter",
            "Earn 100 points",
            "trophy",
            ConditionType::TotalPoints,
            Some(100),
        );
        assert!(!badge.is_satisfied_by(99));
        assert!(badge.is_satisfied_by(100));
        assert!(badge.is_satisfied_by(101));
    }

    #[test]
    fn test_null_condition_never_satisfied() {
        let badge = BadgeDefinition::new(
            "founder",
            "Founder",
            "Granted manually",
            "crown",
            ConditionType::Custom("manual".to_string()),
            None,
        );
        assert!(!badge.is_auto_unlockable());
        assert!(!badge.is_satisfied_by(i64::MAX));
    }

    #[test]
    fn test_status_view_flattens_definition() {
        let view = BadgeStatusView {
            definition: BadgeDefinition::new(
                "first_task",
                "First Step",
                "Complete your first task",
                "rocket",
                ConditionType::TasksCompleted,
                Some(1),
            ),
            unlocked: false,
            unlocked_at: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "first_task");
        assert_eq!(json["conditionType"], "tasks_completed");
        assert_eq!(json["unlocked"], false);
        assert!(json.get("unlockedAt").is_none());
    }
}
