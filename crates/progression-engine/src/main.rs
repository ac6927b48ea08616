//! 进度引擎模拟工具
//!
//! 在内存中驱动用户进度、习惯连续打卡、积分与徽章流程，输出 JSON 报告。

use clap::Parser;
use progression_engine::cli::{Cli, CommandRunner, Commands};
use progression_shared::{config::AppConfig, observability};
use tracing::{info, warn};

const SERVICE_NAME: &str = "progression-sim";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 配置加载失败时退回默认配置，日志尚未初始化，先暂存错误
    let (config, load_error) = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = AppConfig::default();
            config.service_name = SERVICE_NAME.to_string();
            (config, Some(e))
        }
    };

    let mut obs_config = config.observability.clone().with_service_name(SERVICE_NAME);
    if let Some(level) = &cli.log_level {
        obs_config = obs_config.with_log_level(level);
    }
    let guard = observability::init(&obs_config)?;

    if let Some(e) = load_error {
        warn!(error = %e, "配置加载失败，使用默认配置");
    }
    info!(environment = %config.environment, "配置已加载");

    let runner = CommandRunner::new(config.progression);

    match cli.command {
        Commands::Demo {
            user_id,
            days,
            start,
            output,
            show_metrics,
        } => {
            runner
                .run_demo(&user_id, days, start, output.as_deref())
                .await?;
            if show_metrics && let Some(metrics) = guard.render_metrics() {
                eprintln!("{metrics}");
            }
        }
        Commands::Catalog => {
            runner.run_catalog()?;
        }
        Commands::Levels { up_to } => {
            runner.run_levels(up_to)?;
        }
    }

    Ok(())
}
