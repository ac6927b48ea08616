//! 进度引擎性能基准测试
//!
//! 测试覆盖：
//! - 等级曲线结算（不同经验量）
//! - 徽章评估（已解锁与未解锁两种状态）
//! - 习惯打卡完整流程

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use progression_engine::{
    FixedClock, GamificationContext, HabitService, LevelCurve, ProgressService, UserProgress,
};
use progression_shared::config::ProgressionConfig;
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// 创建已注册用户的上下文
fn setup(rt: &Runtime, user_id: &str) -> Arc<GamificationContext> {
    rt.block_on(async {
        let ctx = GamificationContext::in_memory(&ProgressionConfig::default());
        ProgressService::new(ctx.clone())
            .register(user_id)
            .await
            .unwrap();
        ctx
    })
}

fn bench_level_curve(c: &mut Criterion) {
    let curve = LevelCurve::default();
    let mut group = c.benchmark_group("level_curve");

    for amount in [50_i64, 1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("apply", amount), &amount, |b, &amount| {
            b.iter(|| {
                let mut progress = UserProgress::new("bench-user");
                black_box(curve.apply(&mut progress, black_box(amount)))
            });
        });
    }

    group.finish();
}

fn bench_badge_evaluation(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("badge_evaluation");

    let fresh = setup(&rt, "fresh-user");
    group.bench_function("nothing_unlocked", |b| {
        b.iter(|| rt.block_on(fresh.achievements.check_and_award_badges(black_box("fresh-user"))));
    });

    let veteran = setup(&rt, "veteran-user");
    rt.block_on(async {
        veteran.points.add_points("veteran-user", 1_000).await.unwrap();
        veteran.evaluate_badges("veteran-user").await;
    });
    group.bench_function("points_badges_unlocked", |b| {
        b.iter(|| {
            rt.block_on(
                veteran
                    .achievements
                    .check_and_award_badges(black_box("veteran-user")),
            )
        });
    });

    group.finish();
}

fn bench_habit_check(c: &mut Criterion) {
    let rt = runtime();
    let clock = Arc::new(FixedClock::new(
        chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    ));
    let ctx = GamificationContext::builder(&ProgressionConfig::default())
        .with_clock(clock.clone())
        .build();
    let habits = HabitService::new(ctx.clone());
    let habit_id = rt.block_on(async {
        ProgressService::new(ctx.clone())
            .register("bench-user")
            .await
            .unwrap();
        habits
            .create("bench-user", "Bench habit", None)
            .await
            .unwrap()
            .habit
            .id
    });

    // 每次迭代推进一天，保证打卡都能成功
    c.bench_function("habit_check_next_day", |b| {
        b.iter(|| {
            clock.advance_days(1);
            rt.block_on(habits.check("bench-user", &habit_id)).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_level_curve,
    bench_badge_evaluation,
    bench_habit_check,
);

criterion_main!(benches);
