//! 用户级锁模块
//!
//! 同一用户的"修改领域状态 → 发放经验 → 评估徽章"在锁内串行执行，
//! 保证重复打卡只会产生一次连续天数递增和一次经验发放。
//!
//! ## 使用示例
//!
//! ```ignore
//! let locks = UserLockManager::new(LockConfig::default());
//!
//! let _guard = locks.acquire("user-1").await?;
//! // 执行受保护的操作，guard 离开作用域时自动释放
//! ```

mod user_lock;

pub use user_lock::{LockConfig, UserLockGuard, UserLockManager};
