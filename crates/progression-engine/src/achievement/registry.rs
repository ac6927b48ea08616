//! 条件提供者注册表
//!
//! 以 ConditionType 为 key 管理提供者实例，同一类型后注册的覆盖先注册的。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::provider::ConditionProvider;
use crate::models::ConditionType;

/// 提供者注册表
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ConditionType, Arc<dyn ConditionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个提供者，按其 `condition_type()` 索引
    pub fn register(&mut self, provider: Arc<dyn ConditionProvider>) -> &mut Self {
        let condition_type = provider.condition_type();
        debug!(
            condition_type = %condition_type,
            description = provider.description(),
            "注册条件提供者"
        );
        self.providers.insert(condition_type, provider);
        self
    }

    pub fn get(&self, condition_type: &ConditionType) -> Option<Arc<dyn ConditionProvider>> {
        self.providers.get(condition_type).cloned()
    }

    pub fn contains(&self, condition_type: &ConditionType) -> bool {
        self.providers.contains_key(condition_type)
    }

    /// 已注册的条件类型（按名称排序）
    pub fn registered_types(&self) -> Vec<ConditionType> {
        let mut types: Vec<_> = self.providers.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
