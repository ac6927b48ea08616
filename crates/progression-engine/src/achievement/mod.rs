//! 成就系统
//!
//! 徽章目录 + 条件提供者注册表 + 评估引擎。
//! 新的条件类型只需注册提供者，无需修改引擎。

mod catalog;
mod engine;
mod provider;
mod providers;
mod registry;

pub use catalog::BadgeCatalog;
pub use engine::AchievementEngine;
pub use provider::{ConditionProvider, FnConditionProvider};
pub use providers::{
    EarlyLoginsProvider, HabitStreakProvider, PomodoroCountProvider, TasksCompletedProvider,
    TotalPointsProvider,
};
pub use registry::ProviderRegistry;
