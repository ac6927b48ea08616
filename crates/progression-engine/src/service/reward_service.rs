//! 奖励服务
//!
//! 用户自定义奖励，用积分兑换，每个奖励只能兑换一次

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::dto::{NewReward, RedeemResponse};
use crate::context::GamificationContext;
use crate::error::{ProgressionError, Result};
use crate::models::Reward;

/// 奖励服务
pub struct RewardService {
    ctx: Arc<GamificationContext>,
}

impl RewardService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, cost = request.cost))]
    pub async fn create(&self, user_id: &str, request: NewReward) -> Result<Reward> {
        if request.name.trim().is_empty() {
            return Err(ProgressionError::Validation("奖励名称不能为空".to_string()));
        }
        if request.cost <= 0 {
            return Err(ProgressionError::Validation(format!(
                "兑换所需积分必须大于 0: {}",
                request.cost
            )));
        }
        self.ctx.require_progress(user_id).await?;

        let reward = Reward::new(
            user_id,
            request.name,
            request.description,
            request.cost,
            request.icon.filter(|i| !i.is_empty()),
        );
        self.ctx.repos.rewards.save_reward(&reward).await?;
        Ok(reward)
    }

    /// 获取奖励，不存在或不属于该用户返回 `RewardNotFound`
    pub async fn get(&self, user_id: &str, reward_id: &str) -> Result<Reward> {
        self.ctx
            .repos
            .rewards
            .get_reward(reward_id)
            .await?
            .filter(|r| r.is_owned_by(user_id))
            .ok_or_else(|| ProgressionError::RewardNotFound(reward_id.to_string()))
    }

    /// 奖励列表：未兑换在前，同组内按创建时间升序
    pub async fn list(&self, user_id: &str, redeemed: Option<bool>) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .ctx
            .repos
            .rewards
            .list_rewards_by_user(user_id)
            .await?
            .into_iter()
            .filter(|r| redeemed.is_none_or(|flag| r.redeemed == flag))
            .collect();
        rewards.sort_by(|a, b| {
            a.redeemed
                .cmp(&b.redeemed)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(rewards)
    }

    #[instrument(skip(self), fields(user_id = %user_id, reward_id = %reward_id))]
    pub async fn delete(&self, user_id: &str, reward_id: &str) -> Result<()> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let reward = self.get(user_id, reward_id).await?;
        self.ctx.repos.rewards.delete_reward(&reward.id).await?;
        Ok(())
    }

    /// 兑换奖励
    ///
    /// 已兑换返回 `AlreadyRedeemed`，余额不足返回 `InsufficientPoints`
    #[instrument(skip(self), fields(user_id = %user_id, reward_id = %reward_id))]
    pub async fn redeem(&self, user_id: &str, reward_id: &str) -> Result<RedeemResponse> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let mut reward = self.get(user_id, reward_id).await?;
        if reward.redeemed {
            return Err(ProgressionError::AlreadyRedeemed(reward_id.to_string()));
        }

        let balance = self.ctx.points.spend_points(user_id, reward.cost).await?;

        reward.redeemed = true;
        reward.redeemed_at = Some(self.ctx.clock.now());
        if let Err(e) = self.ctx.repos.rewards.save_reward(&reward).await {
            if let Err(refund_err) = self.ctx.points.refund_points(user_id, reward.cost).await {
                warn!(error = %refund_err, "积分退还失败");
            }
            return Err(e);
        }

        info!(
            points_spent = reward.cost,
            current_points = balance.current_points,
            "奖励已兑换"
        );
        Ok(RedeemResponse {
            points_spent: reward.cost,
            current_points: balance.current_points,
            reward,
        })
    }
}
