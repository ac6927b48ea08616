//! CLI 模块
//!
//! 提供进度引擎模拟工具的命令行接口。
//!
//! ## 使用示例
//!
//! ```bash
//! # 运行 10 天模拟并输出 JSON 报告
//! progression-sim demo --days 10
//!
//! # 写入文件并打印指标快照
//! progression-sim demo --days 30 --output report.json --show-metrics
//!
//! # 查看徽章目录
//! progression-sim catalog
//!
//! # 查看等级经验表
//! progression-sim levels --up-to 20
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
