//! 用户进度聚合
//!
//! 等级、经验与积分三组字段只通过经验账本和积分账本修改

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProgressionError, Result};

/// 用户进度
///
/// `current_points` 始终等于 `total_earned_points - total_spent_points`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    /// 当前等级（从 1 开始）
    pub level: u32,
    /// 当前等级内累积的经验
    #[serde(rename = "currentXP")]
    pub current_xp: i64,
    pub total_earned_points: i64,
    pub total_spent_points: i64,
    pub current_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            level: 1,
            current_xp: 0,
            total_earned_points: 0,
            total_spent_points: 0,
            current_points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 积分三项是否平衡
    pub fn is_balanced(&self) -> bool {
        self.current_points == self.total_earned_points - self.total_spent_points
    }

    /// 获得积分
    ///
    /// 溢出时返回 `Validation`，三项字段均不变
    pub fn earn_points(&mut self, amount: i64) -> Result<()> {
        let total_earned = checked(self.total_earned_points.checked_add(amount), amount)?;
        let current = checked(self.current_points.checked_add(amount), amount)?;
        self.total_earned_points = total_earned;
        self.current_points = current;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 消费积分
    ///
    /// 余额不足时返回 `InsufficientPoints`，三项字段均不变
    pub fn spend_points(&mut self, amount: i64) -> Result<()> {
        if self.current_points < amount {
            return Err(ProgressionError::InsufficientPoints {
                required: amount,
                available: self.current_points,
            });
        }
        let total_spent = checked(self.total_spent_points.checked_add(amount), amount)?;
        let current = checked(self.current_points.checked_sub(amount), amount)?;
        self.total_spent_points = total_spent;
        self.current_points = current;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 收回已发放的积分
    ///
    /// 冲减累计获得，不计入消费
    pub fn revoke_points(&mut self, amount: i64) -> Result<()> {
        let total_earned = checked(self.total_earned_points.checked_sub(amount), amount)?;
        let current = checked(self.current_points.checked_sub(amount), amount)?;
        self.total_earned_points = total_earned;
        self.current_points = current;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 撤销一次消费
    pub fn refund_points(&mut self, amount: i64) -> Result<()> {
        let total_spent = checked(self.total_spent_points.checked_sub(amount), amount)?;
        let current = checked(self.current_points.checked_add(amount), amount)?;
        self.total_spent_points = total_spent;
        self.current_points = current;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn point_balance(&self) -> PointBalance {
        PointBalance {
            total_earned_points: self.total_earned_points,
            total_spent_points: self.total_spent_points,
            current_points: self.current_points,
        }
    }
}

/// 积分余额快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBalance {
    pub total_earned_points: i64,
    pub total_spent_points: i64,
    pub current_points: i64,
}

/// 经验发放结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpOutcome {
    pub leveled_up: bool,
    pub new_level: u32,
    pub previous_level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: i64,
}

impl LevelUpOutcome {
    /// 本次提升的等级数
    pub fn levels_gained(&self) -> u32 {
        self.new_level - self.previous_level
    }
}

/// 等级进度视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: i64,
    #[serde(rename = "requiredXP")]
    pub required_xp: i64,
    /// 当前等级内的进度百分比（0-100）
    pub progress_percent: f64,
}

fn checked(value: Option<i64>, amount: i64) -> Result<i64> {
    value.ok_or_else(|| ProgressionError::Validation(format!("积分数值溢出: {amount}")))
}
