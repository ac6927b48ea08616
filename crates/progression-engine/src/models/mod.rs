//! 进度引擎领域模型
//!
//! 包含进度系统的所有核心实体定义

pub mod activity;
pub mod badge;
pub mod enums;
pub mod habit;
pub mod user_progress;

// 重新导出常用类型
pub use activity::{LoginEvent, NewTask, PomodoroSession, Reward, Task};
pub use badge::{BadgeDefinition, BadgeStatusView, UserBadge};
pub use enums::{ConditionType, Difficulty, PomodoroKind, StatsPeriod};
pub use habit::{Habit, HabitCompletion, HabitView};
pub use user_progress::{LevelProgress, LevelUpOutcome, PointBalance, UserProgress};
