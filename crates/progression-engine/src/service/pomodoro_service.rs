//! 番茄钟服务

use std::sync::Arc;

use chrono::Duration;
use tracing::{instrument, warn};

use super::dto::{PomodoroCompleteResponse, PomodoroStats, ProgressionOutcome};
use crate::context::GamificationContext;
use crate::error::{ProgressionError, Result};
use crate::models::{PomodoroKind, PomodoroSession, StatsPeriod};

/// 番茄钟服务
pub struct PomodoroService {
    ctx: Arc<GamificationContext>,
}

impl PomodoroService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    /// 记录完成的时段
    ///
    /// 只有工作时段发放经验，两种时段都会触发徽章评估
    #[instrument(skip(self), fields(user_id = %user_id, kind = ?kind))]
    pub async fn complete(
        &self,
        user_id: &str,
        duration_minutes: u32,
        kind: PomodoroKind,
    ) -> Result<PomodoroCompleteResponse> {
        if duration_minutes == 0 {
            return Err(ProgressionError::Validation("时长必须大于 0".to_string()));
        }

        let _guard = self.ctx.locks.acquire(user_id).await?;
        let progress = self.ctx.require_progress(user_id).await?;

        let session = PomodoroSession::new(user_id, duration_minutes, kind, self.ctx.clock.now());
        self.ctx.repos.pomodoros.create_session(&session).await?;

        let outcome = match kind {
            PomodoroKind::Work => {
                match self
                    .ctx
                    .award(user_id, self.ctx.rewards.pomodoro_work_xp)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        if let Err(revert_err) =
                            self.ctx.repos.pomodoros.delete_session(&session.id).await
                        {
                            warn!(error = %revert_err, "番茄钟记录补偿失败");
                        }
                        return Err(e);
                    }
                }
            }
            PomodoroKind::Break => {
                let new_badges = self.ctx.evaluate_badges(user_id).await;
                ProgressionOutcome::badges_only(progress.level, new_badges)
            }
        };

        Ok(PomodoroCompleteResponse { session, outcome })
    }

    /// 周期统计
    ///
    /// `today` 从本地零点起算，`week`/`month` 为最近 7/30 天
    pub async fn stats(&self, user_id: &str, period: StatsPeriod) -> Result<PomodoroStats> {
        let now = self.ctx.clock.now();
        let since = match period {
            StatsPeriod::Today => {
                let local_now = self.ctx.clock.local_now();
                let midnight = local_now.date().and_hms_opt(0, 0, 0).unwrap_or(local_now);
                now - (local_now - midnight)
            }
            StatsPeriod::Week | StatsPeriod::Month => now - Duration::days(period.days()),
        };

        let sessions = self
            .ctx
            .repos
            .pomodoros
            .list_sessions_since(user_id, since)
            .await?;

        let (work, rest): (Vec<_>, Vec<_>) = sessions
            .iter()
            .partition(|s| s.kind == PomodoroKind::Work);
        let total_work_minutes = work.iter().map(|s| u64::from(s.duration_minutes)).sum();
        let total_break_minutes = rest.iter().map(|s| u64::from(s.duration_minutes)).sum();
        let average = work.len() as f64 / period.days() as f64;

        Ok(PomodoroStats {
            period,
            total_sessions: work.len(),
            total_work_minutes,
            total_break_minutes,
            average_per_day: (average * 10.0).round() / 10.0,
        })
    }

    /// 累计工作时段数
    pub async fn work_session_count(&self, user_id: &str) -> Result<i64> {
        self.ctx
            .repos
            .pomodoros
            .count_by_kind(user_id, PomodoroKind::Work)
            .await
    }
}
