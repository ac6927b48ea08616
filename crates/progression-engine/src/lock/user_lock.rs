//! 用户级锁管理器
//!
//! 每个用户一把异步互斥锁，同一用户的进度操作串行执行，不同用户互不阻塞。
//! 最后一个持有者或等待者离开时移除条目，条目数不超过正在使用锁的用户数。

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use progression_shared::config::LockSettings;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use crate::error::{ProgressionError, Result};

/// 锁配置
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// 获取锁的最长等待时间
    pub acquire_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&LockSettings> for LockConfig {
    fn from(settings: &LockSettings) -> Self {
        Self {
            acquire_timeout: Duration::from_millis(settings.acquire_timeout_ms),
        }
    }
}

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// 用户锁守卫
///
/// Drop 时释放锁，没有等待者时一并移除条目
#[derive(Debug)]
pub struct UserLockGuard {
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl UserLockGuard {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        // 先释放互斥锁，守卫内的 Arc 计数随之归还
        drop(self.guard.take());
        prune(&self.locks, &self.user_id);
        debug!(user_id = %self.user_id, "用户锁已释放");
    }
}

/// 只剩表内引用时移除条目
///
/// 判断与移除在同一分片锁内完成，`acquire` 克隆出的引用不会被漏算
fn prune(locks: &LockTable, user_id: &str) {
    locks.remove_if(user_id, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// 用户级锁管理器
#[derive(Debug, Default)]
pub struct UserLockManager {
    locks: Arc<LockTable>,
    config: LockConfig,
}

impl UserLockManager {
    pub fn new(config: LockConfig) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            config,
        }
    }

    /// 获取用户锁
    ///
    /// 超过 `acquire_timeout` 仍未获取到时返回 `LockTimeout`
    #[instrument(skip(self))]
    pub async fn acquire(&self, user_id: &str) -> Result<UserLockGuard> {
        // 克隆出 Arc 后立即释放分片锁，避免跨 await 持有
        let mutex = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // 超时后等待中的 future 随语句结束释放，其持有的 Arc 不再计数
        let acquired =
            tokio::time::timeout(self.config.acquire_timeout, mutex.lock_owned()).await;
        match acquired {
            Ok(guard) => {
                debug!(user_id = %user_id, "用户锁已获取");
                Ok(UserLockGuard {
                    user_id: user_id.to_string(),
                    guard: Some(guard),
                    locks: self.locks.clone(),
                })
            }
            Err(_) => {
                prune(&self.locks, user_id);
                warn!(
                    user_id = %user_id,
                    timeout_ms = self.config.acquire_timeout.as_millis() as u64,
                    "获取用户锁超时"
                );
                Err(ProgressionError::LockTimeout(user_id.to_string()))
            }
        }
    }

    /// 当前持有或等待锁的用户数
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let manager = UserLockManager::new(LockConfig {
            acquire_timeout: Duration::from_millis(50),
        });

        let guard = manager.acquire("user-1").await.unwrap();
        assert_eq!(guard.user_id(), "user-1");

        let err = manager.acquire("user-1").await.unwrap_err();
        assert!(matches!(err, ProgressionError::LockTimeout(_)));

        drop(guard);
        assert!(manager.acquire("user-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let manager = UserLockManager::new(LockConfig {
            acquire_timeout: Duration::from_millis(50),
        });

        let _a = manager.acquire("user-a").await.unwrap();
        let _b = manager.acquire("user-b").await.unwrap();
        assert_eq!(manager.tracked_users(), 2);
    }

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let manager = UserLockManager::default();

        for i in 0..100 {
            let _guard = manager.acquire(&format!("user-{i}")).await.unwrap();
        }
        assert_eq!(manager.tracked_users(), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_waiter_pending() {
        let manager = Arc::new(UserLockManager::default());
        let first = manager.acquire("user-1").await.unwrap();

        let waiter = tokio::spawn({
            let manager = manager.clone();
            async move { manager.acquire("user-1").await.map(|g| g.user_id().to_string()) }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // 等待者仍引用同一把锁，释放后条目保留并由等待者获得
        drop(first);
        assert_eq!(manager.tracked_users(), 1);
        assert_eq!(waiter.await.unwrap().unwrap(), "user-1");
        assert_eq!(manager.tracked_users(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_does_not_leak_entry() {
        let manager = UserLockManager::new(LockConfig {
            acquire_timeout: Duration::from_millis(20),
        });

        let guard = manager.acquire("user-1").await.unwrap();
        assert!(manager.acquire("user-1").await.is_err());
        assert_eq!(manager.tracked_users(), 1);

        drop(guard);
        assert_eq!(manager.tracked_users(), 0);
    }

    #[test]
    fn test_config_from_settings() {
        let config = LockConfig::from(&LockSettings {
            acquire_timeout_ms: 250,
        });
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
    }
}
