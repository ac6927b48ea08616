//! 游戏化上下文
//!
//! 显式构造的依赖容器：仓储、四个核心组件、用户锁与时钟。
//! 动作服务共享同一个 `Arc<GamificationContext>`。

use std::sync::Arc;

use progression_shared::config::{ProgressionConfig, RewardConfig};
use tracing::{info, warn};

use crate::achievement::{
    AchievementEngine, BadgeCatalog, EarlyLoginsProvider, HabitStreakProvider,
    PomodoroCountProvider, TasksCompletedProvider, TotalPointsProvider,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{ProgressionError, Result};
use crate::experience::{ExperienceLedger, LevelCurve};
use crate::lock::{LockConfig, UserLockManager};
use crate::models::{LevelUpOutcome, UserProgress};
use crate::points::PointLedger;
use crate::repository::{
    HabitLogRepository, HabitLogRepositoryTrait, HabitRepository, HabitRepositoryTrait,
    LoginRepository, LoginRepositoryTrait, PomodoroRepository, PomodoroRepositoryTrait,
    RewardRepository, RewardRepositoryTrait, TaskRepository, TaskRepositoryTrait,
    UserBadgeRepository, UserBadgeRepositoryTrait, UserProgressRepository,
    UserProgressRepositoryTrait,
};
use crate::service::ProgressionOutcome;
use crate::streak::StreakTracker;

/// 仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub progress: Arc<dyn UserProgressRepositoryTrait>,
    pub habits: Arc<dyn HabitRepositoryTrait>,
    pub habit_logs: Arc<dyn HabitLogRepositoryTrait>,
    pub user_badges: Arc<dyn UserBadgeRepositoryTrait>,
    pub tasks: Arc<dyn TaskRepositoryTrait>,
    pub pomodoros: Arc<dyn PomodoroRepositoryTrait>,
    pub rewards: Arc<dyn RewardRepositoryTrait>,
    pub logins: Arc<dyn LoginRepositoryTrait>,
}

impl Repositories {
    /// 全部使用内存实现
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(UserProgressRepository::new()),
            habits: Arc::new(HabitRepository::new()),
            habit_logs: Arc::new(HabitLogRepository::new()),
            user_badges: Arc::new(UserBadgeRepository::new()),
            tasks: Arc::new(TaskRepository::new()),
            pomodoros: Arc::new(PomodoroRepository::new()),
            rewards: Arc::new(RewardRepository::new()),
            logins: Arc::new(LoginRepository::new()),
        }
    }
}

/// 游戏化上下文
pub struct GamificationContext {
    pub repos: Repositories,
    pub streaks: Arc<StreakTracker>,
    pub experience: Arc<ExperienceLedger>,
    pub points: Arc<PointLedger>,
    pub achievements: Arc<AchievementEngine>,
    pub locks: Arc<UserLockManager>,
    pub clock: Arc<dyn Clock>,
    pub rewards: RewardConfig,
    pub early_login_before_hour: u32,
}

impl GamificationContext {
    /// 内存仓储 + 系统时钟 + 内置徽章目录
    pub fn in_memory(config: &ProgressionConfig) -> Arc<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: &ProgressionConfig) -> GamificationContextBuilder {
        GamificationContextBuilder {
            config: config.clone(),
            repos: None,
            clock: None,
            catalog: None,
        }
    }

    /// 读取用户进度，不存在返回 `UserNotFound`
    pub async fn require_progress(&self, user_id: &str) -> Result<UserProgress> {
        self.repos
            .progress
            .get_progress(user_id)
            .await?
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.to_string()))
    }

    /// 评估徽章
    ///
    /// 成就评估是尽力而为，失败只记录告警，不影响已完成的主流程
    pub async fn evaluate_badges(&self, user_id: &str) -> Vec<String> {
        match self.achievements.check_and_award_badges(user_id).await {
            Ok(badges) => badges,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "徽章评估失败，已忽略");
                Vec::new()
            }
        }
    }

    /// 发放经验后评估徽章
    pub async fn award(&self, user_id: &str, xp: i64) -> Result<ProgressionOutcome> {
        let level: LevelUpOutcome = self.experience.add_xp(user_id, xp).await?;
        let new_badges = self.evaluate_badges(user_id).await;
        Ok(ProgressionOutcome::new(xp, level, new_badges))
    }
}

/// 上下文构建器
pub struct GamificationContextBuilder {
    config: ProgressionConfig,
    repos: Option<Repositories>,
    clock: Option<Arc<dyn Clock>>,
    catalog: Option<BadgeCatalog>,
}

impl GamificationContextBuilder {
    pub fn with_repositories(mut self, repos: Repositories) -> Self {
        self.repos = Some(repos);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_catalog(mut self, catalog: BadgeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// 构建上下文并注册内置条件提供者
    pub fn build(self) -> Arc<GamificationContext> {
        let repos = self.repos.unwrap_or_else(Repositories::in_memory);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let catalog = self.catalog.unwrap_or_else(BadgeCatalog::default_catalog);

        let streaks = Arc::new(StreakTracker::new(
            repos.habits.clone(),
            repos.habit_logs.clone(),
        ));
        let experience = Arc::new(ExperienceLedger::new(
            repos.progress.clone(),
            LevelCurve::from(&self.config.leveling),
        ));
        let points = Arc::new(PointLedger::new(repos.progress.clone()));
        let achievements = Arc::new(AchievementEngine::new(catalog, repos.user_badges.clone()));

        register_default_providers(
            &achievements,
            &repos,
            &streaks,
            self.config.early_login_before_hour,
        );

        info!(
            badges = achievements.catalog().len(),
            providers = ?achievements.registered_types(),
            "游戏化上下文初始化完成"
        );

        Arc::new(GamificationContext {
            locks: Arc::new(UserLockManager::new(LockConfig::from(&self.config.lock))),
            repos,
            streaks,
            experience,
            points,
            achievements,
            clock,
            rewards: self.config.rewards.clone(),
            early_login_before_hour: self.config.early_login_before_hour,
        })
    }
}

/// 注册五个内置条件提供者
pub fn register_default_providers(
    engine: &AchievementEngine,
    repos: &Repositories,
    streaks: &Arc<StreakTracker>,
    early_login_before_hour: u32,
) {
    engine.register_provider(Arc::new(TasksCompletedProvider::new(repos.tasks.clone())));
    engine.register_provider(Arc::new(HabitStreakProvider::new(streaks.clone())));
    engine.register_provider(Arc::new(PomodoroCountProvider::new(
        repos.pomodoros.clone(),
    )));
    engine.register_provider(Arc::new(TotalPointsProvider::new(repos.progress.clone())));
    engine.register_provider(Arc::new(EarlyLoginsProvider::new(
        repos.logins.clone(),
        early_login_before_hour,
    )));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConditionType;

    #[test]
    fn test_default_wiring_covers_catalog() {
        let ctx = GamificationContext::in_memory(&ProgressionConfig::default());
        assert!(ctx.achievements.unprovided_types().is_empty());
        assert_eq!(ctx.achievements.registered_types().len(), 5);
        assert!(
            ctx.achievements
                .registered_types()
                .contains(&ConditionType::EarlyLogins)
        );
    }

    #[tokio::test]
    async fn test_award_unknown_user_fails() {
        let ctx = GamificationContext::in_memory(&ProgressionConfig::default());
        let err = ctx.award("ghost", 5).await.unwrap_err();
        assert!(matches!(err, ProgressionError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_award_reports_level_and_badges() {
        let ctx = GamificationContext::in_memory(&ProgressionConfig::default());
        ctx.repos
            .progress
            .create_progress(&UserProgress::new("user-1"))
            .await
            .unwrap();

        let outcome = ctx.award("user-1", 120).await.unwrap();
        assert_eq!(outcome.xp_earned, 120);
        assert!(outcome.leveled_up);
        assert_eq!(outcome.new_level, 2);
        assert!(outcome.new_badges.is_empty());
    }
}
