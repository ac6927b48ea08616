//! 习惯服务
//!
//! 打卡流程：获取用户锁 → 连续天数更新 → 发放经验 → 评估徽章。
//! 经验发放失败时回滚打卡，徽章评估失败不影响打卡结果。

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::dto::HabitCheckResponse;
use crate::context::GamificationContext;
use crate::error::{ProgressionError, Result};
use crate::models::{Habit, HabitView};

/// 习惯服务
pub struct HabitService {
    ctx: Arc<GamificationContext>,
}

impl HabitService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    /// 创建习惯
    #[instrument(skip(self, icon), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        icon: Option<String>,
    ) -> Result<HabitView> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProgressionError::Validation("习惯名称不能为空".to_string()));
        }
        self.ctx.require_progress(user_id).await?;

        let habit = Habit::new(user_id, name, icon.filter(|i| !i.is_empty()));
        self.ctx.repos.habits.save_habit(&habit).await?;
        info!(habit_id = %habit.id, "习惯已创建");
        Ok(HabitView::new(habit, false))
    }

    /// 习惯列表，附带今日打卡状态
    ///
    /// 会写存储：缓存的连续天数与打卡日志不一致时按日志重新推导并保存。
    /// 因此与打卡动作一样持有用户锁。
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<HabitView>> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let today = self.ctx.clock.today();
        let habits = self.ctx.repos.habits.list_habits_by_user(user_id).await?;

        let mut views = Vec::with_capacity(habits.len());
        for habit in habits {
            let habit = self.ctx.streaks.refresh(habit, today).await?;
            let completed_today = self.ctx.streaks.is_completed_on(&habit.id, today).await?;
            views.push(HabitView::new(habit, completed_today));
        }
        Ok(views)
    }

    /// 删除习惯及其打卡记录
    #[instrument(skip(self), fields(user_id = %user_id, habit_id = %habit_id))]
    pub async fn delete(&self, user_id: &str, habit_id: &str) -> Result<()> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let habit = self.ctx.streaks.owned_habit(user_id, habit_id).await?;

        self.ctx.repos.habits.delete_habit(&habit.id).await?;
        let removed = self.ctx.streaks.clear_log(&habit.id).await?;
        info!(removed_completions = removed, "习惯已删除");
        Ok(())
    }

    /// 今日打卡
    #[instrument(skip(self), fields(user_id = %user_id, habit_id = %habit_id))]
    pub async fn check(&self, user_id: &str, habit_id: &str) -> Result<HabitCheckResponse> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let today = self.ctx.clock.today();

        let before = self.ctx.streaks.owned_habit(user_id, habit_id).await?;
        let habit = self.ctx.streaks.check(user_id, habit_id, today).await?;

        let outcome = match self
            .ctx
            .award(user_id, self.ctx.rewards.habit_check_xp)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(revert_err) = self.ctx.streaks.revert_check(&before, today).await {
                    warn!(error = %revert_err, "打卡补偿失败");
                }
                return Err(e);
            }
        };

        Ok(HabitCheckResponse { habit, outcome })
    }

    /// 撤销今日打卡，已发放的经验不收回
    #[instrument(skip(self), fields(user_id = %user_id, habit_id = %habit_id))]
    pub async fn uncheck(&self, user_id: &str, habit_id: &str) -> Result<HabitView> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let today = self.ctx.clock.today();
        self.ctx.streaks.uncheck(user_id, habit_id, today).await
    }

    pub async fn max_streak(&self, user_id: &str) -> Result<u32> {
        self.ctx.streaks.max_streak(user_id).await
    }

    pub async fn best_streak(&self, user_id: &str) -> Result<u32> {
        self.ctx.streaks.best_streak(user_id).await
    }
}
