//! 条件提供者 Trait 定义
//!
//! 每种条件类型对应一个提供者，负责计算用户在该维度上的当前数值。
//! 徽章解锁只比较 `当前数值 >= 阈值`，不关心数值来源。

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::models::ConditionType;

/// 条件提供者
///
/// 实现应只读，不修改任何用户状态
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConditionProvider: Send + Sync {
    /// 返回此提供者负责的条件类型
    fn condition_type(&self) -> ConditionType;

    /// 计算用户当前数值
    async fn current_value(&self, user_id: &str) -> Result<i64>;

    /// 提供者描述，用于日志
    fn description(&self) -> &str {
        "condition provider"
    }
}

type ValueFn = Box<dyn Fn(String) -> BoxFuture<'static, Result<i64>> + Send + Sync>;

/// 基于闭包的条件提供者
///
/// 用于在启动时以函数形式注册扩展条件
pub struct FnConditionProvider {
    condition_type: ConditionType,
    description: String,
    value_fn: ValueFn,
}

impl FnConditionProvider {
    pub fn new<F, Fut>(condition_type: impl Into<ConditionType>, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<i64>> + Send + 'static,
    {
        let condition_type = condition_type.into();
        Self {
            description: format!("fn provider for {condition_type}"),
            condition_type,
            value_fn: Box::new(move |user_id| Box::pin(f(user_id))),
        }
    }
}

#[async_trait]
impl ConditionProvider for FnConditionProvider {
    fn condition_type(&self) -> ConditionType {
        self.condition_type.clone()
    }

    async fn current_value(&self, user_id: &str) -> Result<i64> {
        (self.value_fn)(user_id.to_string()).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
