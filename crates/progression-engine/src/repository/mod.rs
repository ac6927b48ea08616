//! 仓储层
//!
//! 提供所有实体的数据访问接口，当前实现为 DashMap 内存存储。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据存取，不包含业务逻辑
//! - 组件依赖 trait 接口而非具体实现
//! - 定义 trait 接口以支持 mock 测试

mod activity_repo;
mod badge_repo;
mod habit_repo;
mod memory_store;
mod progress_repo;
mod traits;

pub use activity_repo::{LoginRepository, PomodoroRepository, RewardRepository, TaskRepository};
pub use badge_repo::UserBadgeRepository;
pub use habit_repo::{HabitLogRepository, HabitRepository};
pub use memory_store::MemoryStore;
pub use progress_repo::UserProgressRepository;
pub use traits::*;
