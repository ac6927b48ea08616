//! 登录记录服务
//!
//! 早于配置小时（本地时间）的登录计为早起登录

use std::sync::Arc;

use tracing::{debug, instrument};

use super::dto::LoginResponse;
use crate::context::GamificationContext;
use crate::error::Result;
use crate::models::LoginEvent;

/// 登录记录服务
pub struct LoginService {
    ctx: Arc<GamificationContext>,
}

impl LoginService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    /// 记录一次登录并评估徽章
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn record_login(&self, user_id: &str) -> Result<LoginResponse> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        self.ctx.require_progress(user_id).await?;

        let event = LoginEvent {
            user_id: user_id.to_string(),
            logged_in_at: self.ctx.clock.local_now(),
        };
        let early = event.is_before_hour(self.ctx.early_login_before_hour);
        self.ctx.repos.logins.record_login(&event).await?;
        debug!(early, "登录已记录");

        let new_badges = self.ctx.evaluate_badges(user_id).await;
        Ok(LoginResponse { early, new_badges })
    }
}
