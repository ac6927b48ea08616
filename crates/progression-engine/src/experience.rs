//! 经验与等级
//!
//! 升级所需经验随等级线性增长：`required_xp(level) = level × multiplier × base_xp`。
//! 一次发放可跨越多个等级，等级只增不减。

use std::sync::Arc;

use progression_shared::config::LevelingConfig;
use progression_shared::observability::metrics;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{ProgressionError, Result};
use crate::models::{LevelProgress, LevelUpOutcome, UserProgress};
use crate::repository::UserProgressRepositoryTrait;

/// 等级曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    base_xp: i64,
    multiplier: i64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::new(100, 1)
    }
}

impl From<&LevelingConfig> for LevelCurve {
    fn from(config: &LevelingConfig) -> Self {
        Self::new(config.base_xp, config.multiplier)
    }
}

/// 等级表中的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStep {
    pub level: u32,
    /// 从该等级升到下一级所需经验
    #[serde(rename = "requiredXP")]
    pub required_xp: i64,
    /// 从 1 级升到该等级累计所需经验
    #[serde(rename = "cumulativeXP")]
    pub cumulative_xp: i64,
}

impl LevelCurve {
    /// 两个参数必须为正，配置加载时已校验
    pub const fn new(base_xp: i64, multiplier: i64) -> Self {
        Self {
            base_xp,
            multiplier,
        }
    }

    pub fn required_xp(&self, level: u32) -> i64 {
        i64::from(level)
            .saturating_mul(self.multiplier)
            .saturating_mul(self.base_xp)
    }

    /// 累加经验并结算升级，返回结算结果
    ///
    /// 结算后满足 `current_xp < required_xp(level)`。经验或等级溢出时返回 `Validation`，
    /// `progress` 保持不变。
    pub fn apply(&self, progress: &mut UserProgress, amount: i64) -> Result<LevelUpOutcome> {
        let previous_level = progress.level;
        let total = progress
            .current_xp
            .checked_add(amount)
            .ok_or_else(|| ProgressionError::Validation(format!("经验值溢出: {amount}")))?;

        let (level, current_xp) = self.resolve(previous_level, total)?;
        progress.level = level;
        progress.current_xp = current_xp;

        Ok(LevelUpOutcome {
            leveled_up: level > previous_level,
            new_level: level,
            previous_level,
            current_xp,
        })
    }

    /// 从 `level` 出发持有 `xp` 时的最终等级与剩余经验
    ///
    /// 连升 k 级的总消耗为 `step × (k × level + k(k-1)/2)`，关于 k 单调，二分求最大可负担的 k
    fn resolve(&self, level: u32, xp: i64) -> Result<(u32, i64)> {
        let step = i128::from(self.base_xp) * i128::from(self.multiplier);
        if step <= 0 {
            return Ok((level, xp));
        }

        let start = i128::from(level);
        let budget = i128::from(xp);
        let cost = |k: i128| -> Option<i128> {
            let triangle = k.checked_mul(k - 1)? / 2;
            k.checked_mul(start)?.checked_add(triangle)?.checked_mul(step)
        };

        let (mut lo, mut hi) = (0_i128, i128::from(u32::MAX) - start);
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if cost(mid).is_some_and(|c| c <= budget) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        let level_overflow = || ProgressionError::Validation(format!("等级超出上限: {xp} XP"));
        let new_level = u32::try_from(start + lo).map_err(|_| level_overflow())?;
        let remaining = budget - cost(lo).ok_or_else(level_overflow)?;
        if remaining >= step * i128::from(new_level) {
            return Err(level_overflow());
        }
        let remaining = i64::try_from(remaining).map_err(|_| level_overflow())?;
        Ok((new_level, remaining))
    }

    pub fn progress_of(&self, progress: &UserProgress) -> LevelProgress {
        let required_xp = self.required_xp(progress.level);
        let progress_percent = if required_xp > 0 {
            (progress.current_xp as f64 / required_xp as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        LevelProgress {
            level: progress.level,
            current_xp: progress.current_xp,
            required_xp,
            progress_percent,
        }
    }

    /// 1 级到 `up_to` 级的等级表
    pub fn table(&self, up_to: u32) -> Vec<LevelStep> {
        let mut cumulative_xp = 0;
        (1..=up_to.max(1))
            .map(|level| {
                let step = LevelStep {
                    level,
                    required_xp: self.required_xp(level),
                    cumulative_xp,
                };
                cumulative_xp += step.required_xp;
                step
            })
            .collect()
    }
}

/// 经验账本
pub struct ExperienceLedger {
    progress_repo: Arc<dyn UserProgressRepositoryTrait>,
    curve: LevelCurve,
}

impl ExperienceLedger {
    pub fn new(progress_repo: Arc<dyn UserProgressRepositoryTrait>, curve: LevelCurve) -> Self {
        Self {
            progress_repo,
            curve,
        }
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// 发放经验
    ///
    /// 负数经验返回 `Validation`，用户不存在返回 `UserNotFound`
    #[instrument(skip(self), fields(user_id = %user_id, amount = amount))]
    pub async fn add_xp(&self, user_id: &str, amount: i64) -> Result<LevelUpOutcome> {
        if amount < 0 {
            return Err(ProgressionError::Validation(format!(
                "经验值不能为负数: {amount}"
            )));
        }

        let mut progress = self
            .progress_repo
            .get_progress(user_id)
            .await?
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.to_string()))?;

        let outcome = self.curve.apply(&mut progress, amount)?;
        progress.updated_at = chrono::Utc::now();
        self.progress_repo.save_progress(&progress).await?;

        metrics::record_xp_awarded(amount);
        if outcome.leveled_up {
            metrics::record_level_up(outcome.levels_gained());
            info!(
                previous_level = outcome.previous_level,
                new_level = outcome.new_level,
                current_xp = outcome.current_xp,
                "用户升级"
            );
        }

        Ok(outcome)
    }

    /// 当前等级进度
    pub async fn level_progress(&self, user_id: &str) -> Result<LevelProgress> {
        let progress = self
            .progress_repo
            .get_progress(user_id)
            .await?
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.to_string()))?;
        Ok(self.curve.progress_of(&progress))
    }
}
