//! 进度引擎
//!
//! 生产力应用的游戏化核心：把用户的日常动作转换为经验、等级、积分与徽章。
//!
//! ## 核心功能
//!
//! - **连续打卡**：每个习惯每天最多打卡一次，连续天数由打卡日志推导
//! - **经验与等级**：按等级曲线累计经验，一次发放可跨越多级
//! - **积分账户**：赚取、消费、扣减三种变动，保持余额恒等式
//! - **徽章评估**：按条件类型查询当前值，达到阈值即解锁，重复评估幂等
//! - **条件扩展**：新的条件类型通过注册 `ConditionProvider` 接入，无需修改评估循环
//! - **用户锁**：同一用户的动作串行执行，避免重复打卡与重复发放
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 仓储接口与内存实现
//! - `clock`: 时钟抽象（本地日历日期）
//! - `streak`: 连续打卡追踪
//! - `experience`: 等级曲线与经验账户
//! - `points`: 积分账户
//! - `achievement`: 徽章目录、条件提供者与评估引擎
//! - `lock`: 用户级锁
//! - `context`: 组件装配
//! - `service`: 动作服务层
//! - `cli`: 模拟工具命令行

pub mod achievement;
pub mod cli;
pub mod clock;
pub mod context;
pub mod error;
pub mod experience;
pub mod lock;
pub mod models;
pub mod points;
pub mod repository;
pub mod service;
pub mod streak;

pub use achievement::{
    AchievementEngine, BadgeCatalog, ConditionProvider, FnConditionProvider, ProviderRegistry,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{GamificationContext, GamificationContextBuilder, Repositories};
pub use error::{ProgressionError, Result};
pub use experience::{ExperienceLedger, LevelCurve, LevelStep};
pub use lock::{LockConfig, UserLockGuard, UserLockManager};
pub use models::*;
pub use points::PointLedger;
pub use service::{
    HabitService, LoginService, PomodoroService, ProgressService, RewardService, TaskService, dto,
};
pub use streak::StreakTracker;
