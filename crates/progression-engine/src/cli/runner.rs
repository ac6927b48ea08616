//! 命令执行器
//!
//! 基于内存仓储与固定时钟运行各子命令。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use progression_shared::config::ProgressionConfig;
use serde::Serialize;
use tracing::info;

use crate::clock::{Clock, FixedClock};
use crate::context::GamificationContext;
use crate::experience::{LevelCurve, LevelStep};
use crate::models::{
    BadgeDefinition, ConditionType, Difficulty, NewTask, PomodoroKind, StatsPeriod,
};
use crate::service::{
    HabitService, LoginService, NewReward, OverviewStats, PomodoroService, PomodoroStats,
    ProgressService, RewardService, TaskService,
};

/// 单日快照
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: i64,
    pub current_points: i64,
    pub max_streak: u32,
    pub new_badges: Vec<String>,
}

/// 模拟报告
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoReport {
    pub user_id: String,
    pub days: Vec<DaySnapshot>,
    pub redeemed: Vec<String>,
    pub pomodoro: PomodoroStats,
    pub overview: OverviewStats,
}

/// 徽章目录输出
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub badges: Vec<BadgeDefinition>,
    pub registered_types: Vec<ConditionType>,
    pub unprovided_types: Vec<ConditionType>,
}

/// 命令执行器
pub struct CommandRunner {
    config: ProgressionConfig,
}

impl CommandRunner {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// 多日模拟
    ///
    /// 每天早 6 点前登录，9 点打卡两个习惯、完成一个任务、两个工作番茄钟和一个休息。
    /// 第 3 天撤销当天任务，最后一天兑换所有买得起的奖励。
    pub async fn run_demo(
        &self,
        user_id: &str,
        days: u32,
        start: NaiveDate,
        output: Option<&Path>,
    ) -> Result<DemoReport> {
        info!(user_id, days, %start, "开始模拟");

        let clock = Arc::new(FixedClock::at(start, 5, 30));
        let ctx = GamificationContext::builder(&self.config)
            .with_clock(clock.clone())
            .build();

        let progress = ProgressService::new(ctx.clone());
        let habits = HabitService::new(ctx.clone());
        let tasks = TaskService::new(ctx.clone());
        let pomodoros = PomodoroService::new(ctx.clone());
        let rewards = RewardService::new(ctx.clone());
        let logins = LoginService::new(ctx.clone());

        progress.register(user_id).await?;
        let reading = habits
            .create(user_id, "Read 20 pages", Some("book".to_string()))
            .await?;
        let running = habits.create(user_id, "Morning run", None).await?;
        for (name, cost) in [("Coffee", 20), ("Movie night", 60), ("New book", 150)] {
            rewards.create(user_id, NewReward::new(name, cost)).await?;
        }

        let mut snapshots = Vec::with_capacity(days as usize);
        for day in 0..days {
            let mut new_badges = Vec::new();

            clock.set_time(5, 30);
            new_badges.extend(logins.record_login(user_id).await?.new_badges);

            clock.set_time(9, 0);
            for habit_id in [&reading.habit.id, &running.habit.id] {
                new_badges.extend(habits.check(user_id, habit_id).await?.outcome.new_badges);
            }

            let task = tasks
                .create(
                    user_id,
                    NewTask::new(format!("Day {} report", day + 1), Difficulty::Medium, 10),
                )
                .await?;
            new_badges.extend(tasks.complete(user_id, &task.id).await?.outcome.new_badges);
            if day == 2 {
                tasks.uncomplete(user_id, &task.id).await?;
            }

            clock.set_time(14, 0);
            for kind in [PomodoroKind::Work, PomodoroKind::Work, PomodoroKind::Break] {
                let minutes = if kind == PomodoroKind::Work { 25 } else { 5 };
                new_badges.extend(
                    pomodoros
                        .complete(user_id, minutes, kind)
                        .await?
                        .outcome
                        .new_badges,
                );
            }

            let summary = progress.summary(user_id).await?;
            snapshots.push(DaySnapshot {
                date: clock.today(),
                level: summary.level,
                current_xp: summary.current_xp,
                current_points: summary.current_points,
                max_streak: habits.max_streak(user_id).await?,
                new_badges,
            });

            if day + 1 < days {
                clock.advance_days(1);
            }
        }

        let mut redeemed = Vec::new();
        for reward in rewards.list(user_id, Some(false)).await? {
            let balance = progress.summary(user_id).await?.current_points;
            if balance >= reward.cost {
                let response = rewards.redeem(user_id, &reward.id).await?;
                redeemed.push(response.reward.name);
            }
        }

        let report = DemoReport {
            user_id: user_id.to_string(),
            days: snapshots,
            redeemed,
            pomodoro: pomodoros.stats(user_id, StatsPeriod::Week).await?,
            overview: progress.overview(user_id).await?,
        };

        write_json(&report, output)?;
        info!(
            level = report.overview.progress.level,
            badges = report.overview.badges_unlocked,
            "模拟完成"
        );
        Ok(report)
    }

    /// 列出徽章目录
    pub fn run_catalog(&self) -> Result<CatalogReport> {
        let ctx = GamificationContext::in_memory(&self.config);
        let engine = &ctx.achievements;
        let report = CatalogReport {
            badges: engine.catalog().iter().cloned().collect(),
            registered_types: engine.registered_types(),
            unprovided_types: engine.unprovided_types(),
        };
        write_json(&report, None)?;
        Ok(report)
    }

    /// 打印等级经验表
    pub fn run_levels(&self, up_to: u32) -> Result<Vec<LevelStep>> {
        let curve = LevelCurve::from(&self.config.leveling);
        let table = curve.table(up_to);
        write_json(&table, None)?;
        Ok(table)
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("写入输出文件失败: {}", path.display()))?;
            info!(path = %path.display(), "输出已写入");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::BadgeCatalog;

    fn runner() -> CommandRunner {
        CommandRunner::new(ProgressionConfig::default())
    }

    #[tokio::test]
    async fn test_demo_unlocks_streak_badge_after_seven_days() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let report = runner().run_demo("demo-user", 7, start, None).await.unwrap();

        assert_eq!(report.days.len(), 7);
        assert_eq!(report.days[6].max_streak, 7);
        assert!(report.days[6].new_badges.contains(&"streak_7".to_string()));
        assert!(report.days[0].new_badges.contains(&"first_task".to_string()));
        assert_eq!(report.overview.habits.total, 2);
        // 第 3 天的任务被撤销
        assert_eq!(report.overview.tasks.completed, 6);
    }

    #[tokio::test]
    async fn test_demo_writes_output_file() {
        let path = std::env::temp_dir()
            .join(format!("progression-demo-{}.json", uuid::Uuid::now_v7()));
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        runner()
            .run_demo("demo-user", 2, start, Some(&path))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["days"].as_array().unwrap().len(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_catalog_has_every_type_provided() {
        let report = runner().run_catalog().unwrap();
        assert_eq!(report.badges.len(), BadgeCatalog::default_catalog().len());
        assert!(report.unprovided_types.is_empty());
    }

    #[test]
    fn test_levels_table() {
        let table = runner().run_levels(3).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[1].required_xp, 200);
    }
}
