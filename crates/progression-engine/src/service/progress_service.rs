//! 用户进度服务
//!
//! 用户注册（初始化进度）、进度摘要与总览统计

use std::sync::Arc;

use tracing::{info, instrument};

use super::dto::{HabitOverview, OverviewStats, ProgressSummary, TaskOverview};
use crate::context::GamificationContext;
use crate::error::{ProgressionError, Result};
use crate::models::{BadgeStatusView, UserProgress};

/// 用户进度服务
pub struct ProgressService {
    ctx: Arc<GamificationContext>,
}

impl ProgressService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    /// 初始化用户进度（1 级，经验与积分为 0）
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn register(&self, user_id: &str) -> Result<UserProgress> {
        if user_id.trim().is_empty() {
            return Err(ProgressionError::Validation("user_id 不能为空".to_string()));
        }
        let progress = UserProgress::new(user_id);
        if !self.ctx.repos.progress.create_progress(&progress).await? {
            return Err(ProgressionError::UserAlreadyExists(user_id.to_string()));
        }
        info!("用户进度已初始化");
        Ok(progress)
    }

    /// 等级与积分摘要
    pub async fn summary(&self, user_id: &str) -> Result<ProgressSummary> {
        let progress = self.ctx.require_progress(user_id).await?;
        let level = self.ctx.experience.curve().progress_of(&progress);
        Ok(ProgressSummary {
            user_id: progress.user_id,
            level: level.level,
            current_xp: level.current_xp,
            required_xp: level.required_xp,
            progress_percent: level.progress_percent,
            total_earned_points: progress.total_earned_points,
            total_spent_points: progress.total_spent_points,
            current_points: progress.current_points,
        })
    }

    /// 总览统计：进度、任务、习惯、徽章
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn overview(&self, user_id: &str) -> Result<OverviewStats> {
        let progress = self.summary(user_id).await?;

        let tasks = self.ctx.repos.tasks.list_tasks_by_user(user_id).await?;
        let completed = tasks.iter().filter(|t| t.completed).count();
        let total = tasks.len();
        let completion_rate = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };

        let today = self.ctx.clock.today();
        let habits = self.ctx.repos.habits.list_habits_by_user(user_id).await?;
        let mut completed_today = 0;
        for habit in &habits {
            if self.ctx.streaks.is_completed_on(&habit.id, today).await? {
                completed_today += 1;
            }
        }

        let badges_unlocked = self
            .ctx
            .repos
            .user_badges
            .list_user_badges(user_id)
            .await?
            .len();

        Ok(OverviewStats {
            progress,
            tasks: TaskOverview {
                total,
                completed,
                pending: total - completed,
                completion_rate,
            },
            habits: HabitOverview {
                total: habits.len(),
                completed_today,
                current_max_streak: self.ctx.streaks.max_streak(user_id).await?,
                best_streak: self.ctx.streaks.best_streak(user_id).await?,
            },
            badges_unlocked,
        })
    }

    /// 徽章列表及解锁状态
    pub async fn badges(&self, user_id: &str) -> Result<Vec<BadgeStatusView>> {
        self.ctx.require_progress(user_id).await?;
        self.ctx.achievements.list(user_id).await
    }
}
