//! 动作服务层
//!
//! 每个游戏化动作按固定顺序组合核心组件：
//!
//! 1. 获取用户锁
//! 2. 修改自身领域状态（打卡、完成任务、记录番茄钟）
//! 3. 发放经验（`ExperienceLedger::add_xp`）
//! 4. 评估徽章（`AchievementEngine::check_and_award_badges`，尽力而为）
//!
//! 第 3 步失败时回滚第 2 步；第 4 步失败只记录告警。

pub mod dto;
mod habit_service;
mod login_service;
mod pomodoro_service;
mod progress_service;
mod reward_service;
mod task_service;

pub use dto::*;
pub use habit_service::HabitService;
pub use login_service::LoginService;
pub use pomodoro_service::PomodoroService;
pub use progress_service::ProgressService;
pub use reward_service::RewardService;
pub use task_service::TaskService;
