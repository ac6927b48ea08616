//! 成就评估引擎
//!
//! 对每个尚未解锁的徽章查询条件提供者，达到阈值即创建解锁记录。
//!
//! ## 容错
//!
//! 单个徽章的评估失败（提供者缺失、提供者报错、写入失败）只记录告警并跳过，
//! 不会中断同批次其他徽章，也不会向调用方传播。
//! 解锁是终态：之后指标下降也不会撤销。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use progression_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use super::catalog::BadgeCatalog;
use super::provider::{ConditionProvider, FnConditionProvider};
use super::registry::ProviderRegistry;
use crate::error::Result;
use crate::models::{BadgeDefinition, BadgeStatusView, ConditionType, UserBadge};
use crate::repository::UserBadgeRepositoryTrait;

/// 成就评估引擎
pub struct AchievementEngine {
    catalog: BadgeCatalog,
    registry: RwLock<ProviderRegistry>,
    user_badge_repo: Arc<dyn UserBadgeRepositoryTrait>,
}

impl AchievementEngine {
    pub fn new(catalog: BadgeCatalog, user_badge_repo: Arc<dyn UserBadgeRepositoryTrait>) -> Self {
        Self {
            catalog,
            registry: RwLock::new(ProviderRegistry::new()),
            user_badge_repo,
        }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    /// 注册条件提供者，同一条件类型后注册的覆盖先注册的
    pub fn register_provider(&self, provider: Arc<dyn ConditionProvider>) {
        self.registry.write().register(provider);
    }

    /// 以闭包形式注册条件提供者
    pub fn register_fn<F, Fut>(&self, condition_type: impl Into<ConditionType>, f: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<i64>> + Send + 'static,
    {
        self.register_provider(Arc::new(FnConditionProvider::new(condition_type, f)));
    }

    pub fn registered_types(&self) -> Vec<ConditionType> {
        self.registry.read().registered_types()
    }

    /// 目录中引用了但没有注册提供者的条件类型
    pub fn unprovided_types(&self) -> Vec<ConditionType> {
        let registry = self.registry.read();
        self.catalog
            .condition_types()
            .into_iter()
            .filter(|t| !registry.contains(t))
            .collect()
    }

    /// 评估并发放徽章
    ///
    /// 返回本次新解锁的徽章 ID（按目录顺序）。
    /// 仅当读取已解锁列表失败时返回错误。
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn check_and_award_badges(&self, user_id: &str) -> Result<Vec<String>> {
        let unlocked: HashSet<String> = self
            .user_badge_repo
            .list_user_badges(user_id)
            .await?
            .into_iter()
            .map(|b| b.badge_id)
            .collect();

        // 同一批次内每种条件类型只查询一次
        let mut values: HashMap<ConditionType, Option<i64>> = HashMap::new();
        let mut newly_unlocked = Vec::new();

        for badge in self.catalog.iter() {
            if unlocked.contains(&badge.id) {
                continue;
            }
            let Some(threshold) = badge.condition_value else {
                continue;
            };

            let value = match values.get(&badge.condition_type) {
                Some(cached) => *cached,
                None => {
                    let value = self.evaluate(user_id, &badge.condition_type).await;
                    values.insert(badge.condition_type.clone(), value);
                    value
                }
            };
            let Some(value) = value else {
                debug!(badge_id = %badge.id, "条件不可用，跳过徽章");
                continue;
            };

            if value < threshold {
                continue;
            }

            if self.unlock(user_id, badge, value).await {
                newly_unlocked.push(badge.id.clone());
            }
        }

        if !newly_unlocked.is_empty() {
            info!(badges = ?newly_unlocked, "解锁新徽章");
        }
        Ok(newly_unlocked)
    }

    /// 全部徽章及当前用户的解锁状态（只读）
    pub async fn list(&self, user_id: &str) -> Result<Vec<BadgeStatusView>> {
        let unlocked: HashMap<String, UserBadge> = self
            .user_badge_repo
            .list_user_badges(user_id)
            .await?
            .into_iter()
            .map(|b| (b.badge_id.clone(), b))
            .collect();

        Ok(self
            .catalog
            .iter()
            .map(|definition| {
                let unlocked_at = unlocked.get(&definition.id).map(|b| b.unlocked_at);
                BadgeStatusView {
                    definition: definition.clone(),
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect())
    }

    pub async fn has_badge(&self, user_id: &str, badge_id: &str) -> Result<bool> {
        Ok(self
            .user_badge_repo
            .get_user_badge(user_id, badge_id)
            .await?
            .is_some())
    }

    /// 查询条件数值，失败时返回 None
    async fn evaluate(&self, user_id: &str, condition_type: &ConditionType) -> Option<i64> {
        // 读锁不跨 await 持有
        let provider = self.registry.read().get(condition_type);
        let Some(provider) = provider else {
            warn!(condition_type = %condition_type, "未注册条件提供者");
            metrics::record_badge_skip("missing_provider");
            return None;
        };

        match provider.current_value(user_id).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    condition_type = %condition_type,
                    provider = provider.description(),
                    error = %e,
                    "条件提供者执行失败"
                );
                metrics::record_badge_skip("provider_failed");
                None
            }
        }
    }

    /// 写入解锁记录，返回是否为本次新解锁
    async fn unlock(&self, user_id: &str, badge: &BadgeDefinition, value: i64) -> bool {
        let record = UserBadge::unlocked_now(user_id, &badge.id);
        match self.user_badge_repo.create_user_badge(&record).await {
            Ok(true) => {
                metrics::record_badge_unlock(&badge.id);
                info!(badge_id = %badge.id, value, "徽章解锁");
                true
            }
            Ok(false) => {
                debug!(badge_id = %badge.id, "徽章已被并发解锁");
                false
            }
            Err(e) => {
                warn!(badge_id = %badge.id, error = %e, "写入徽章解锁记录失败");
                metrics::record_badge_skip("store_failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::provider::MockConditionProvider;
    use crate::error::ProgressionError;
    use crate::repository::{MockUserBadgeRepositoryTrait, UserBadgeRepository};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn badge(id: &str, condition_type: ConditionType, value: Option<i64>) -> BadgeDefinition {
        BadgeDefinition::new(id, id, "", "", condition_type, value)
    }

    fn engine_with(badges: Vec<BadgeDefinition>) -> AchievementEngine {
        AchievementEngine::new(
            BadgeCatalog::from_definitions(badges).unwrap(),
            Arc::new(UserBadgeRepository::new()),
        )
    }

    #[tokio::test]
    async fn test_unlocks_when_threshold_reached() {
        let engine = engine_with(vec![
            badge("p100", ConditionType::TotalPoints, Some(100)),
            badge("p500", ConditionType::TotalPoints, Some(500)),
        ]);
        engine.register_fn(ConditionType::TotalPoints, |_| async {
            Ok::<i64, ProgressionError>(120)
        });

        let unlocked = engine.check_and_award_badges("user-1").await.unwrap();
        assert_eq!(unlocked, vec!["p100".to_string()]);
        assert!(engine.has_badge("user-1", "p100").await.unwrap());
        assert!(!engine.has_badge("user-1", "p500").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlock_survives_metric_decrease() {
        let engine = engine_with(vec![badge("p100", ConditionType::TotalPoints, Some(100))]);
        let metric = Arc::new(AtomicI64::new(150));
        let source = metric.clone();
        engine.register_fn(ConditionType::TotalPoints, move |_| {
            let value = source.load(Ordering::SeqCst);
            async move { Ok::<i64, ProgressionError>(value) }
        });

        assert_eq!(engine.check_and_award_badges("user-1").await.unwrap().len(), 1);

        metric.store(10, Ordering::SeqCst);
        assert!(engine.check_and_award_badges("user-1").await.unwrap().is_empty());
        assert!(engine.has_badge("user-1", "p100").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_provider_skips_only_that_badge() {
        let engine = engine_with(vec![
            badge("orphan", ConditionType::Custom("unknown".into()), Some(1)),
            badge("first", ConditionType::TasksCompleted, Some(1)),
        ]);
        engine.register_fn(ConditionType::TasksCompleted, |_| async {
            Ok::<i64, ProgressionError>(1)
        });

        assert_eq!(
            engine.unprovided_types(),
            vec![ConditionType::Custom("unknown".into())]
        );
        let unlocked = engine.check_and_award_badges("user-1").await.unwrap();
        assert_eq!(unlocked, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_provider_does_not_abort_batch() {
        let engine = engine_with(vec![
            badge("streak", ConditionType::HabitStreak, Some(1)),
            badge("pomo", ConditionType::PomodoroCount, Some(1)),
        ]);

        let mut failing = MockConditionProvider::new();
        failing
            .expect_condition_type()
            .return_const(ConditionType::HabitStreak);
        failing
            .expect_description()
            .return_const("failing".to_string());
        failing.expect_current_value().returning(|_| {
            Err(ProgressionError::ProviderFailed {
                condition_type: "habit_streak".to_string(),
                message: "boom".to_string(),
            })
        });
        engine.register_provider(Arc::new(failing));
        engine.register_fn(ConditionType::PomodoroCount, |_| async {
            Ok::<i64, ProgressionError>(3)
        });

        let unlocked = engine.check_and_award_badges("user-1").await.unwrap();
        assert_eq!(unlocked, vec!["pomo".to_string()]);
    }

    #[tokio::test]
    async fn test_null_threshold_never_unlocks() {
        let engine = engine_with(vec![badge("manual", ConditionType::TotalPoints, None)]);
        engine.register_fn(ConditionType::TotalPoints, |_| async {
            Ok::<i64, ProgressionError>(i64::MAX)
        });

        assert!(engine.check_and_award_badges("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_queried_once_per_type() {
        let engine = engine_with(vec![
            badge("s7", ConditionType::HabitStreak, Some(7)),
            badge("s30", ConditionType::HabitStreak, Some(30)),
        ]);
        let mut provider = MockConditionProvider::new();
        provider
            .expect_condition_type()
            .return_const(ConditionType::HabitStreak);
        provider
            .expect_description()
            .return_const("streak".to_string());
        provider
            .expect_current_value()
            .times(1)
            .returning(|_| Ok(8));
        engine.register_provider(Arc::new(provider));

        let unlocked = engine.check_and_award_badges("user-1").await.unwrap();
        assert_eq!(unlocked, vec!["s7".to_string()]);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let mut repo = MockUserBadgeRepositoryTrait::new();
        repo.expect_list_user_badges().returning(|_| Ok(vec![]));
        repo.expect_create_user_badge()
            .returning(|_| Err(ProgressionError::Storage("write failed".to_string())));

        let engine = AchievementEngine::new(
            BadgeCatalog::from_definitions(vec![badge("p1", ConditionType::TotalPoints, Some(1))])
                .unwrap(),
            Arc::new(repo),
        );
        engine.register_fn(ConditionType::TotalPoints, |_| async {
            Ok::<i64, ProgressionError>(5)
        });

        assert!(engine.check_and_award_badges("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_merges_unlock_status() {
        let engine = engine_with(vec![
            badge("a", ConditionType::TotalPoints, Some(1)),
            badge("b", ConditionType::TotalPoints, Some(1000)),
        ]);
        engine.register_fn(ConditionType::TotalPoints, |_| async {
            Ok::<i64, ProgressionError>(10)
        });
        engine.check_and_award_badges("user-1").await.unwrap();

        let views = engine.list("user-1").await.unwrap();
        assert_eq!(views.len(), 2);
        assert!(views[0].unlocked && views[0].unlocked_at.is_some());
        assert!(!views[1].unlocked && views[1].unlocked_at.is_none());
    }
}
