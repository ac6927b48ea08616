//! 徽章目录
//!
//! 静态的徽章定义集合，按插入顺序评估与展示。

use crate::error::{ProgressionError, Result};
use crate::models::{BadgeDefinition, ConditionType};

/// 徽章目录
#[derive(Debug, Clone, Default)]
pub struct BadgeCatalog {
    badges: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从定义列表构建目录，ID 重复时返回 `Validation`
    pub fn from_definitions(definitions: Vec<BadgeDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.add(definition)?;
        }
        Ok(catalog)
    }

    /// 内置徽章目录
    pub fn default_catalog() -> Self {
        let badges = vec![
            BadgeDefinition::new(
                "first_task",
                "First Step",
                "Complete your first task",
                "rocket",
                ConditionType::TasksCompleted,
                Some(1),
            ),
            BadgeDefinition::new(
                "streak_7",
                "Seven Days Strong",
                "Keep a 7-day habit streak",
                "fire",
                ConditionType::HabitStreak,
                Some(7),
            ),
            BadgeDefinition::new(
                "early_bird",
                "Early Bird",
                "Log in before 6 AM five times",
                "sun",
                ConditionType::EarlyLogins,
                Some(5),
            ),
            BadgeDefinition::new(
                "pomodoro_10",
                "Focus Master",
                "Complete 10 pomodoro work sessions",
                "star",
                ConditionType::PomodoroCount,
                Some(10),
            ),
            BadgeDefinition::new(
                "habit_30",
                "Habit Hero",
                "Keep a 30-day habit streak",
                "sparkle",
                ConditionType::HabitStreak,
                Some(30),
            ),
            BadgeDefinition::new(
                "points_100",
                "Point Collector",
                "Earn 100 points in total",
                "trophy",
                ConditionType::TotalPoints,
                Some(100),
            ),
            BadgeDefinition::new(
                "points_500",
                "Point Master",
                "Earn 500 points in total",
                "trophy",
                ConditionType::TotalPoints,
                Some(500),
            ),
        ];
        Self { badges }
    }

    pub fn add(&mut self, definition: BadgeDefinition) -> Result<()> {
        if self.get(&definition.id).is_some() {
            return Err(ProgressionError::Validation(format!(
                "徽章 ID 重复: {}",
                definition.id
            )));
        }
        self.badges.push(definition);
        Ok(())
    }

    pub fn get(&self, badge_id: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|b| b.id == badge_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.badges.iter()
    }

    /// 目录引用到的全部条件类型（去重，保持首次出现顺序）
    pub fn condition_types(&self) -> Vec<ConditionType> {
        let mut types: Vec<ConditionType> = Vec::new();
        for badge in &self.badges {
            if !types.contains(&badge.condition_type) {
                types.push(badge.condition_type.clone());
            }
        }
        types
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}
