//! 积分账本
//!
//! 三种变动语义不对称：
//! - 获得：累计获得 +a，余额 +a
//! - 消费：累计消费 +a，余额 -a（余额不足拒绝）
//! - 收回：累计获得 -a，余额 -a（冲减已发放的积分，不计入消费）

use std::sync::Arc;

use progression_shared::observability::metrics;
use tracing::{info, instrument};

use crate::error::{ProgressionError, Result};
use crate::models::{PointBalance, UserProgress};
use crate::repository::UserProgressRepositoryTrait;

/// 积分账本
pub struct PointLedger {
    progress_repo: Arc<dyn UserProgressRepositoryTrait>,
}

impl PointLedger {
    pub fn new(progress_repo: Arc<dyn UserProgressRepositoryTrait>) -> Self {
        Self { progress_repo }
    }

    /// 获得积分
    #[instrument(skip(self), fields(user_id = %user_id, amount = amount))]
    pub async fn add_points(&self, user_id: &str, amount: i64) -> Result<PointBalance> {
        Self::ensure_non_negative(amount)?;
        let mut progress = self.load(user_id).await?;
        progress.earn_points(amount)?;
        self.commit(&progress, "earn", amount).await
    }

    /// 消费积分
    ///
    /// 余额不足时返回 `InsufficientPoints`，不写入任何变更
    #[instrument(skip(self), fields(user_id = %user_id, amount = amount))]
    pub async fn spend_points(&self, user_id: &str, amount: i64) -> Result<PointBalance> {
        Self::ensure_non_negative(amount)?;
        let mut progress = self.load(user_id).await?;
        progress.spend_points(amount)?;
        self.commit(&progress, "spend", amount).await
    }

    /// 收回已发放的积分
    #[instrument(skip(self), fields(user_id = %user_id, amount = amount))]
    pub async fn deduct_points(&self, user_id: &str, amount: i64) -> Result<PointBalance> {
        Self::ensure_non_negative(amount)?;
        let mut progress = self.load(user_id).await?;
        progress.revoke_points(amount)?;
        self.commit(&progress, "deduct", amount).await
    }

    /// 撤销一次消费，用于兑换失败时的补偿
    #[instrument(skip(self), fields(user_id = %user_id, amount = amount))]
    pub async fn refund_points(&self, user_id: &str, amount: i64) -> Result<PointBalance> {
        Self::ensure_non_negative(amount)?;
        let mut progress = self.load(user_id).await?;
        progress.refund_points(amount)?;
        self.commit(&progress, "refund", amount).await
    }

    pub async fn balance(&self, user_id: &str) -> Result<PointBalance> {
        Ok(self.load(user_id).await?.point_balance())
    }

    fn ensure_non_negative(amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(ProgressionError::Validation(format!(
                "积分数量不能为负数: {amount}"
            )));
        }
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<UserProgress> {
        self.progress_repo
            .get_progress(user_id)
            .await?
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.to_string()))
    }

    async fn commit(&self, progress: &UserProgress, kind: &str, amount: i64) -> Result<PointBalance> {
        debug_assert!(progress.is_balanced());
        self.progress_repo.save_progress(progress).await?;
        metrics::record_points_movement(kind, amount);

        let balance = progress.point_balance();
        info!(
            kind,
            current_points = balance.current_points,
            total_earned = balance.total_earned_points,
            total_spent = balance.total_spent_points,
            "积分变动"
        );
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockUserProgressRepositoryTrait, UserProgressRepository};

    async fn ledger() -> PointLedger {
        let repo = Arc::new(UserProgressRepository::new());
        repo.create_progress(&UserProgress::new("user-1"))
            .await
            .unwrap();
        PointLedger::new(repo)
    }

    #[tokio::test]
    async fn test_earn_then_spend() {
        let ledger = ledger().await;
        ledger.add_points("user-1", 50).await.unwrap();
        let balance = ledger.spend_points("user-1", 30).await.unwrap();

        assert_eq!(balance.total_earned_points, 50);
        assert_eq!(balance.total_spent_points, 30);
        assert_eq!(balance.current_points, 20);
    }

    #[tokio::test]
    async fn test_failed_spend_changes_nothing() {
        let ledger = ledger().await;
        ledger.add_points("user-1", 10).await.unwrap();

        let err = ledger.spend_points("user-1", 11).await.unwrap_err();
        assert!(matches!(err, ProgressionError::InsufficientPoints { .. }));

        let balance = ledger.balance("user-1").await.unwrap();
        assert_eq!(
            balance,
            PointBalance {
                total_earned_points: 10,
                total_spent_points: 0,
                current_points: 10,
            }
        );
    }

    #[tokio::test]
    async fn test_deduct_reverses_earning() {
        let ledger = ledger().await;
        ledger.add_points("user-1", 15).await.unwrap();
        let balance = ledger.deduct_points("user-1", 15).await.unwrap();

        assert_eq!(balance.total_earned_points, 0);
        assert_eq!(balance.total_spent_points, 0);
        assert_eq!(balance.current_points, 0);
    }

    #[tokio::test]
    async fn test_refund_reverses_spending() {
        let ledger = ledger().await;
        ledger.add_points("user-1", 40).await.unwrap();
        ledger.spend_points("user-1", 25).await.unwrap();
        let balance = ledger.refund_points("user-1", 25).await.unwrap();

        assert_eq!(balance.total_spent_points, 0);
        assert_eq!(balance.current_points, 40);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let ledger = ledger().await;
        for result in [
            ledger.add_points("user-1", -1).await,
            ledger.spend_points("user-1", -1).await,
            ledger.deduct_points("user-1", -1).await,
        ] {
            assert!(matches!(result, Err(ProgressionError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_overflowing_award_rejected() {
        let ledger = ledger().await;
        ledger.add_points("user-1", 5).await.unwrap();

        let err = ledger.add_points("user-1", i64::MAX).await.unwrap_err();
        assert!(matches!(err, ProgressionError::Validation(_)));
        assert_eq!(ledger.balance("user-1").await.unwrap().current_points, 5);
    }

    #[tokio::test]
    async fn test_storage_error_surfaces() {
        let mut repo = MockUserProgressRepositoryTrait::new();
        repo.expect_get_progress()
            .returning(|id| Ok(Some(UserProgress::new(id))));
        repo.expect_save_progress()
            .returning(|_| Err(ProgressionError::Storage("unavailable".to_string())));

        let ledger = PointLedger::new(Arc::new(repo));
        let err = ledger.add_points("user-1", 5).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
