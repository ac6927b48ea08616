//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集。
//! 只安装 recorder，不启动 HTTP 端点；调用方按需渲染快照。

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源句柄
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    /// 渲染 Prometheus 文本格式的指标快照
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 安装 Prometheus recorder
pub fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    Ok(MetricsHandle { handle })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("habit_checks_total", "Total number of habit check attempts");
    metrics::describe_counter!("xp_awarded_total", "Total experience points awarded");
    metrics::describe_counter!("level_ups_total", "Total number of level ups");
    metrics::describe_counter!(
        "points_movements_total",
        "Total number of point ledger movements"
    );
    metrics::describe_counter!("badge_unlocks_total", "Total number of badge unlocks");
    metrics::describe_counter!(
        "badge_evaluation_skips_total",
        "Badges skipped during evaluation"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录习惯打卡
#[inline]
pub fn record_habit_check(outcome: &str) {
    metrics::counter!("habit_checks_total", "outcome" => outcome.to_string()).increment(1);
}

/// 记录经验发放
#[inline]
pub fn record_xp_awarded(amount: i64) {
    metrics::counter!("xp_awarded_total").increment(amount.max(0) as u64);
}

/// 记录升级
#[inline]
pub fn record_level_up(levels_gained: u32) {
    metrics::counter!("level_ups_total").increment(u64::from(levels_gained));
}

/// 记录积分变动
#[inline]
pub fn record_points_movement(kind: &str, amount: i64) {
    metrics::counter!(
        "points_movements_total",
        "kind" => kind.to_string()
    )
    .increment(1);
    metrics::histogram!("points_movement_amount", "kind" => kind.to_string())
        .record(amount as f64);
}

/// 记录徽章解锁
#[inline]
pub fn record_badge_unlock(badge_id: &str) {
    metrics::counter!("badge_unlocks_total", "badge_id" => badge_id.to_string()).increment(1);
}

/// 记录评估时被跳过的徽章
#[inline]
pub fn record_badge_skip(reason: &str) {
    metrics::counter!("badge_evaluation_skips_total", "reason" => reason.to_string())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_habit_check("success");
        record_xp_awarded(25);
        record_level_up(2);
        record_points_movement("earn", 10);
        record_badge_unlock("first_task");
        record_badge_skip("missing_provider");
    }
}
