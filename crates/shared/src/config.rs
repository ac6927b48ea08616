//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 等级曲线配置
///
/// 升级所需经验 = 等级 × multiplier × base_xp
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
    pub base_xp: i64,
    pub multiplier: i64,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            base_xp: 100,
            multiplier: 1,
        }
    }
}

/// 各类行为的经验奖励
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// 习惯打卡一次获得的经验
    pub habit_check_xp: i64,
    /// 完成任务时每 1 积分换算的经验
    pub task_complete_xp_per_point: i64,
    /// 完成一次番茄钟工作时段获得的经验
    pub pomodoro_work_xp: i64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            habit_check_xp: 5,
            task_complete_xp_per_point: 1,
            pomodoro_work_xp: 10,
        }
    }
}

/// 用户级锁配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// 获取用户锁的最长等待时间（毫秒）
    pub acquire_timeout_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 5_000,
        }
    }
}

/// 进度引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub leveling: LevelingConfig,
    pub rewards: RewardConfig,
    /// 早于该小时（本地时间）的登录计为早起登录
    pub early_login_before_hour: u32,
    pub lock: LockSettings,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            leveling: LevelingConfig::default(),
            rewards: RewardConfig::default(),
            early_login_before_hour: 6,
            lock: LockSettings::default(),
        }
    }
}

impl ProgressionConfig {
    /// 校验配置取值
    ///
    /// 升级阈值必须为正，否则升级循环无法终止
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leveling.base_xp <= 0 || self.leveling.multiplier <= 0 {
            return Err(ConfigError::Message(format!(
                "leveling.base_xp 与 leveling.multiplier 必须为正数: base_xp={}, multiplier={}",
                self.leveling.base_xp, self.leveling.multiplier
            )));
        }

        let rewards = &self.rewards;
        if rewards.habit_check_xp < 0
            || rewards.task_complete_xp_per_point < 0
            || rewards.pomodoro_work_xp < 0
        {
            return Err(ConfigError::Message("经验奖励不能为负数".to_string()));
        }

        if self.early_login_before_hour > 23 {
            return Err(ConfigError::Message(format!(
                "early_login_before_hour 超出范围: {}",
                self.early_login_before_hour
            )));
        }

        Ok(())
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub progression: ProgressionConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. .env 文件（若存在）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. 环境变量（PROGRESSION_ 前缀，双下划线分隔层级，
    ///    如 PROGRESSION_PROGRESSION__LEVELING__BASE_XP -> progression.leveling.base_xp）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let env = std::env::var("PROGRESSION_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                Environment::with_prefix("PROGRESSION")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.progression.validate()?;

        if config.observability.service_name.is_empty() {
            config.observability.service_name = config.service_name.clone();
        }

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
