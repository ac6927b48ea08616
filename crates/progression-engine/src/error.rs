//! 进度引擎错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

/// 进度引擎错误类型
#[derive(Debug, Error)]
pub enum ProgressionError {
    // === 习惯打卡相关错误 ===
    #[error("今日已打卡: habit_id={0}")]
    AlreadyCompletedToday(String),

    #[error("今日尚未打卡: habit_id={0}")]
    NotCompletedToday(String),

    // === 积分相关错误 ===
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    // === 实体不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("习惯不存在: {0}")]
    HabitNotFound(String),

    #[error("任务不存在: {0}")]
    TaskNotFound(String),

    #[error("奖励不存在: {0}")]
    RewardNotFound(String),

    // === 状态冲突 ===
    #[error("用户已存在: {0}")]
    UserAlreadyExists(String),

    #[error("任务已完成: {0}")]
    TaskAlreadyCompleted(String),

    #[error("任务尚未完成: {0}")]
    TaskNotCompleted(String),

    #[error("奖励已兑换: {0}")]
    AlreadyRedeemed(String),

    // === 成就评估 ===
    #[error("条件提供者执行失败: condition_type={condition_type}, {message}")]
    ProviderFailed {
        condition_type: String,
        message: String,
    },

    // === 系统错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("获取用户锁超时: user_id={0}")]
    LockTimeout(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 进度引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, ProgressionError>;

impl ProgressionError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_) | Self::Storage(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::ProviderFailed { .. }
                | Self::LockTimeout(_)
                | Self::Storage(_)
                | Self::Serialization(_)
                | Self::Internal(_)
        )
    }

    /// 检查是否为实体不存在（或不属于调用方）
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::HabitNotFound(_)
                | Self::TaskNotFound(_)
                | Self::RewardNotFound(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyCompletedToday(_) => "ALREADY_COMPLETED_TODAY",
            Self::NotCompletedToday(_) => "NOT_COMPLETED_TODAY",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::HabitNotFound(_) => "HABIT_NOT_FOUND",
            Self::TaskNotFound(_) => "TASK_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::TaskAlreadyCompleted(_) => "TASK_ALREADY_COMPLETED",
            Self::TaskNotCompleted(_) => "TASK_NOT_COMPLETED",
            Self::AlreadyRedeemed(_) => "ALREADY_REDEEMED",
            Self::ProviderFailed { .. } => "PROVIDER_FAILED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(ProgressionError::LockTimeout("user-1".to_string()).is_retryable());
        assert!(ProgressionError::Storage("disk full".to_string()).is_retryable());
        assert!(!ProgressionError::HabitNotFound("h-1".to_string()).is_retryable());
        assert!(
            !ProgressionError::InsufficientPoints {
                required: 50,
                available: 10
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(ProgressionError::AlreadyCompletedToday("h-1".to_string()).is_business_error());
        assert!(
            ProgressionError::InsufficientPoints {
                required: 5,
                available: 3
            }
            .is_business_error()
        );
        assert!(!ProgressionError::Internal("panic".to_string()).is_business_error());
        assert!(!ProgressionError::LockTimeout("user-1".to_string()).is_business_error());
    }

    #[test]
    fn test_error_is_not_found() {
        assert!(ProgressionError::UserNotFound("u".to_string()).is_not_found());
        assert!(ProgressionError::HabitNotFound("h".to_string()).is_not_found());
        assert!(!ProgressionError::NotCompletedToday("h".to_string()).is_not_found());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProgressionError::AlreadyCompletedToday("h-1".to_string()).error_code(),
            "ALREADY_COMPLETED_TODAY"
        );
        assert_eq!(
            ProgressionError::InsufficientPoints {
                required: 5,
                available: 3
            }
            .error_code(),
            "INSUFFICIENT_POINTS"
        );
        assert_eq!(
            ProgressionError::NotCompletedToday("h-1".to_string()).error_code(),
            "NOT_COMPLETED_TODAY"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ProgressionError::InsufficientPoints {
            required: 50,
            available: 30,
        };
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("30"));

        let err = ProgressionError::HabitNotFound("habit-123".to_string());
        assert!(err.to_string().contains("habit-123"));
    }
}
