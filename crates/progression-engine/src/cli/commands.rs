//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// 进度引擎模拟工具
///
/// 使用内存仓储在本地驱动完整的游戏化流程。
#[derive(Parser, Debug)]
#[command(name = "progression-sim")]
#[command(version, about = "进度引擎模拟工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 运行多日模拟脚本
    ///
    /// 每天：早起登录、习惯打卡、完成任务、番茄钟，最后兑换奖励。
    /// 输出每日进度快照与最终总览（JSON）。
    Demo {
        /// 模拟用户 ID
        #[arg(short, long, default_value = "demo-user")]
        user_id: String,

        /// 模拟天数
        #[arg(short, long, default_value = "10")]
        days: u32,

        /// 起始日期 (YYYY-MM-DD)
        #[arg(long, default_value = "2026-01-05")]
        start: NaiveDate,

        /// 输出文件路径（默认输出到 stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 结束后打印 Prometheus 指标快照
        #[arg(long)]
        show_metrics: bool,
    },

    /// 列出徽章目录与已注册的条件类型
    Catalog,

    /// 打印等级经验表
    Levels {
        /// 打印到第几级
        #[arg(long, default_value = "10")]
        up_to: u32,
    },
}
