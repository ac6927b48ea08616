//! 连续打卡追踪
//!
//! 打卡日志是唯一事实来源，`Habit.streak` 是日志的缓存投影。
//! 当前连续天数 = 以今天（今日已打卡）或昨天（今日未打卡）结尾的最长连续日期段长度。

use std::sync::Arc;

use chrono::NaiveDate;
use progression_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProgressionError, Result};
use crate::models::{Habit, HabitCompletion, HabitView};
use crate::repository::{HabitLogRepositoryTrait, HabitRepositoryTrait};

/// 从 `end` 往前数连续打卡的天数
///
/// `dates` 必须按升序排列
pub fn consecutive_run(dates: &[NaiveDate], end: NaiveDate) -> u32 {
    let mut expected = Some(end);
    let mut run = 0;
    for date in dates.iter().rev() {
        let Some(want) = expected else { break };
        if *date > want {
            continue;
        }
        if *date != want {
            break;
        }
        run += 1;
        expected = want.pred_opt();
    }
    run
}

/// 由打卡日志推导当前连续天数
pub fn derive_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    if dates.binary_search(&today).is_ok() {
        return consecutive_run(dates, today);
    }
    today
        .pred_opt()
        .map(|yesterday| consecutive_run(dates, yesterday))
        .unwrap_or(0)
}

/// 连续打卡追踪器
pub struct StreakTracker {
    habit_repo: Arc<dyn HabitRepositoryTrait>,
    log_repo: Arc<dyn HabitLogRepositoryTrait>,
}

impl StreakTracker {
    pub fn new(
        habit_repo: Arc<dyn HabitRepositoryTrait>,
        log_repo: Arc<dyn HabitLogRepositoryTrait>,
    ) -> Self {
        Self {
            habit_repo,
            log_repo,
        }
    }

    /// 读取习惯并校验归属，不存在或不属于该用户都视为不存在
    pub async fn owned_habit(&self, user_id: &str, habit_id: &str) -> Result<Habit> {
        self.habit_repo
            .get_habit(habit_id)
            .await?
            .filter(|h| h.is_owned_by(user_id))
            .ok_or_else(|| ProgressionError::HabitNotFound(habit_id.to_string()))
    }

    /// 今日打卡
    ///
    /// 昨天已打卡则连续天数 +1，否则重置为 1；最佳纪录取较大值
    #[instrument(skip(self), fields(user_id = %user_id, habit_id = %habit_id))]
    pub async fn check(&self, user_id: &str, habit_id: &str, today: NaiveDate) -> Result<HabitView> {
        let mut habit = self.owned_habit(user_id, habit_id).await?;

        let completion = HabitCompletion::new(habit_id, today);
        if !self.log_repo.insert_completion(&completion).await? {
            metrics::record_habit_check("duplicate");
            return Err(ProgressionError::AlreadyCompletedToday(
                habit_id.to_string(),
            ));
        }

        let yesterday_done = match today.pred_opt() {
            Some(yesterday) => self.log_repo.is_completed_on(habit_id, yesterday).await,
            None => Ok(false),
        };
        let yesterday_done = match yesterday_done {
            Ok(done) => done,
            Err(e) => {
                self.rollback_insert(&completion).await;
                return Err(e);
            }
        };

        let previous = habit.streak;
        habit.streak = if yesterday_done { previous + 1 } else { 1 };
        habit.best_streak = habit.best_streak.max(habit.streak);
        habit.updated_at = chrono::Utc::now();

        if let Err(e) = self.habit_repo.save_habit(&habit).await {
            self.rollback_insert(&completion).await;
            return Err(e);
        }

        metrics::record_habit_check("checked");
        info!(
            previous_streak = previous,
            streak = habit.streak,
            best_streak = habit.best_streak,
            "习惯打卡成功"
        );

        Ok(HabitView::new(habit, true))
    }

    /// 撤销今日打卡
    ///
    /// 删除今日记录后从昨天往前重新计算连续天数，最佳纪录保持不变
    #[instrument(skip(self), fields(user_id = %user_id, habit_id = %habit_id))]
    pub async fn uncheck(
        &self,
        user_id: &str,
        habit_id: &str,
        today: NaiveDate,
    ) -> Result<HabitView> {
        let mut habit = self.owned_habit(user_id, habit_id).await?;

        let completion = HabitCompletion::new(habit_id, today);
        if !self.log_repo.remove_completion(&completion).await? {
            return Err(ProgressionError::NotCompletedToday(habit_id.to_string()));
        }

        let dates = match self.log_repo.list_completions(habit_id).await {
            Ok(dates) => dates,
            Err(e) => {
                self.rollback_remove(&completion).await;
                return Err(e);
            }
        };
        let previous = habit.streak;
        habit.streak = today
            .pred_opt()
            .map(|yesterday| consecutive_run(&dates, yesterday))
            .unwrap_or(0);
        habit.updated_at = chrono::Utc::now();

        if let Err(e) = self.habit_repo.save_habit(&habit).await {
            self.rollback_remove(&completion).await;
            return Err(e);
        }

        metrics::record_habit_check("unchecked");
        info!(previous_streak = previous, streak = habit.streak, "撤销打卡成功");

        Ok(HabitView::new(habit, false))
    }

    /// 撤销一次已成功的打卡，用于后续步骤失败时的补偿
    ///
    /// 删除打卡记录并恢复打卡前的习惯快照
    #[instrument(skip(self, before), fields(habit_id = %before.id))]
    pub async fn revert_check(&self, before: &Habit, today: NaiveDate) -> Result<()> {
        let completion = HabitCompletion::new(before.id.clone(), today);
        self.log_repo.remove_completion(&completion).await?;
        self.habit_repo.save_habit(before).await?;
        warn!("打卡已回滚");
        Ok(())
    }

    /// 按日志重新推导连续天数
    ///
    /// 连续中断后缓存值不会自动归零，读取前调用以保持与日志一致
    pub async fn refresh(&self, mut habit: Habit, today: NaiveDate) -> Result<Habit> {
        let dates = self.log_repo.list_completions(&habit.id).await?;
        let derived = derive_streak(&dates, today);
        if derived != habit.streak {
            debug!(habit_id = %habit.id, cached = habit.streak, derived, "连续天数已校正");
            habit.streak = derived;
            habit.best_streak = habit.best_streak.max(derived);
            habit.updated_at = chrono::Utc::now();
            self.habit_repo.save_habit(&habit).await?;
        }
        Ok(habit)
    }

    /// 用户所有习惯中最大的当前连续天数，没有习惯时为 0
    pub async fn max_streak(&self, user_id: &str) -> Result<u32> {
        let habits = self.habit_repo.list_habits_by_user(user_id).await?;
        Ok(habits.iter().map(|h| h.streak).max().unwrap_or(0))
    }

    /// 用户所有习惯中最大的历史最佳连续天数，没有习惯时为 0
    pub async fn best_streak(&self, user_id: &str) -> Result<u32> {
        let habits = self.habit_repo.list_habits_by_user(user_id).await?;
        Ok(habits.iter().map(|h| h.best_streak).max().unwrap_or(0))
    }

    pub async fn is_completed_on(&self, habit_id: &str, date: NaiveDate) -> Result<bool> {
        self.log_repo.is_completed_on(habit_id, date).await
    }

    /// 删除习惯的全部打卡记录
    pub async fn clear_log(&self, habit_id: &str) -> Result<usize> {
        self.log_repo.delete_by_habit(habit_id).await
    }

    async fn rollback_insert(&self, completion: &HabitCompletion) {
        if let Err(e) = self.log_repo.remove_completion(completion).await {
            warn!(habit_id = %completion.habit_id, error = %e, "回滚打卡记录失败");
        } else {
            debug!(habit_id = %completion.habit_id, "打卡记录已回滚");
        }
    }

    async fn rollback_remove(&self, completion: &HabitCompletion) {
        if let Err(e) = self.log_repo.insert_completion(completion).await {
            warn!(habit_id = %completion.habit_id, error = %e, "恢复打卡记录失败");
        }
    }
}
