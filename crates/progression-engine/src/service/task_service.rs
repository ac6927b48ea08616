//! 任务服务
//!
//! 完成任务：获得积分 = 任务积分，获得经验 = 任务积分 × 每积分经验。
//! 撤销完成只收回积分，不收回经验。

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::dto::{
    TaskCompleteResponse, TaskFilter, TaskListResponse, TaskUncompleteResponse, TaskUpdate,
};
use crate::context::GamificationContext;
use crate::error::{ProgressionError, Result};
use crate::models::{NewTask, Task};

/// 任务服务
pub struct TaskService {
    ctx: Arc<GamificationContext>,
}

impl TaskService {
    pub fn new(ctx: Arc<GamificationContext>) -> Self {
        Self { ctx }
    }

    /// 创建任务
    ///
    /// 积分必须落在难度对应的区间内
    #[instrument(skip(self, request), fields(user_id = %user_id, difficulty = request.difficulty.as_str()))]
    pub async fn create(&self, user_id: &str, request: NewTask) -> Result<Task> {
        if request.title.trim().is_empty() {
            return Err(ProgressionError::Validation("任务标题不能为空".to_string()));
        }
        if !request.difficulty.accepts(request.points) {
            let (min, max) = request.difficulty.point_range();
            return Err(ProgressionError::Validation(format!(
                "{} 难度的积分范围为 {min}-{max}，实际为 {}",
                request.difficulty.as_str(),
                request.points
            )));
        }
        self.ctx.require_progress(user_id).await?;

        let task = request.into_task(user_id);
        self.ctx.repos.tasks.save_task(&task).await?;
        info!(task_id = %task.id, points = task.points, "任务已创建");
        Ok(task)
    }

    /// 获取任务，不存在或不属于该用户返回 `TaskNotFound`
    pub async fn get(&self, user_id: &str, task_id: &str) -> Result<Task> {
        self.ctx
            .repos
            .tasks
            .get_task(task_id)
            .await?
            .filter(|t| t.is_owned_by(user_id))
            .ok_or_else(|| ProgressionError::TaskNotFound(task_id.to_string()))
    }

    /// 任务列表，按创建时间倒序
    pub async fn list(&self, user_id: &str, filter: &TaskFilter) -> Result<TaskListResponse> {
        let mut tasks: Vec<Task> = self
            .ctx
            .repos
            .tasks
            .list_tasks_by_user(user_id)
            .await?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = tasks.len();
        Ok(TaskListResponse { tasks, total })
    }

    /// 更新标题、描述或分类
    #[instrument(skip(self, update), fields(user_id = %user_id, task_id = %task_id))]
    pub async fn update(&self, user_id: &str, task_id: &str, update: TaskUpdate) -> Result<Task> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let mut task = self.get(user_id, task_id).await?;

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(ProgressionError::Validation("任务标题不能为空".to_string()));
            }
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(category_id) = update.category_id {
            task.category_id = Some(category_id);
        }
        task.updated_at = chrono::Utc::now();

        self.ctx.repos.tasks.save_task(&task).await?;
        Ok(task)
    }

    #[instrument(skip(self), fields(user_id = %user_id, task_id = %task_id))]
    pub async fn delete(&self, user_id: &str, task_id: &str) -> Result<()> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let task = self.get(user_id, task_id).await?;
        self.ctx.repos.tasks.delete_task(&task.id).await?;
        Ok(())
    }

    /// 完成任务
    ///
    /// 标记完成 → 获得积分 → 发放经验 → 评估徽章，任一前置步骤失败则回滚已完成的步骤
    #[instrument(skip(self), fields(user_id = %user_id, task_id = %task_id))]
    pub async fn complete(&self, user_id: &str, task_id: &str) -> Result<TaskCompleteResponse> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let before = self.get(user_id, task_id).await?;
        if before.completed {
            return Err(ProgressionError::TaskAlreadyCompleted(task_id.to_string()));
        }

        let points = before.points;
        let xp = points
            .checked_mul(self.ctx.rewards.task_complete_xp_per_point)
            .ok_or_else(|| ProgressionError::Validation(format!("任务经验溢出: {points} 积分")))?;

        let mut task = before.clone();
        task.mark_completed();
        self.ctx.repos.tasks.save_task(&task).await?;

        if let Err(e) = self.ctx.points.add_points(user_id, points).await {
            self.restore_task(&before).await;
            return Err(e);
        }

        let outcome = match self.ctx.award(user_id, xp).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(revert_err) = self.ctx.points.deduct_points(user_id, points).await {
                    warn!(error = %revert_err, "积分补偿失败");
                }
                self.restore_task(&before).await;
                return Err(e);
            }
        };

        info!(points, xp, "任务已完成");
        Ok(TaskCompleteResponse {
            task,
            points_earned: points,
            outcome,
        })
    }

    /// 撤销任务完成
    ///
    /// 收回任务积分（冲减累计获得），经验保持不变
    #[instrument(skip(self), fields(user_id = %user_id, task_id = %task_id))]
    pub async fn uncomplete(&self, user_id: &str, task_id: &str) -> Result<TaskUncompleteResponse> {
        let _guard = self.ctx.locks.acquire(user_id).await?;
        let before = self.get(user_id, task_id).await?;
        if !before.completed {
            return Err(ProgressionError::TaskNotCompleted(task_id.to_string()));
        }

        let mut task = before.clone();
        task.mark_pending();
        self.ctx.repos.tasks.save_task(&task).await?;

        if let Err(e) = self.ctx.points.deduct_points(user_id, task.points).await {
            self.restore_task(&before).await;
            return Err(e);
        }

        info!(points = task.points, "任务完成已撤销");
        Ok(TaskUncompleteResponse {
            points_deducted: task.points,
            task,
        })
    }

    /// 已完成任务数
    pub async fn completed_count(&self, user_id: &str) -> Result<i64> {
        self.ctx.repos.tasks.count_completed(user_id).await
    }

    async fn restore_task(&self, before: &Task) {
        if let Err(e) = self.ctx.repos.tasks.save_task(before).await {
            warn!(task_id = %before.id, error = %e, "恢复任务状态失败");
        } else {
            warn!(task_id = %before.id, "任务状态已回滚");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Repositories;
    use crate::models::{Difficulty, UserProgress};
    use crate::repository::MockUserProgressRepositoryTrait;
    use crate::service::dto::TaskStatusFilter;
    use progression_shared::config::ProgressionConfig;

    async fn fixture() -> (TaskService, Arc<GamificationContext>) {
        let ctx = GamificationContext::in_memory(&ProgressionConfig::default());
        ctx.repos
            .progress
            .create_progress(&UserProgress::new("user-1"))
            .await
            .unwrap();
        (TaskService::new(ctx.clone()), ctx)
    }

    #[tokio::test]
    async fn test_points_must_match_difficulty() {
        let (service, _) = fixture().await;
        let err = service
            .create("user-1", NewTask::new("Quick", Difficulty::Easy, 6))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::Validation(_)));

        assert!(
            service
                .create("user-1", NewTask::new("Edge", Difficulty::Medium, 5))
                .await
                .is_ok()
        );
        assert!(
            service
                .create("user-1", NewTask::new("Edge", Difficulty::Hard, 30))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_complete_awards_points_xp_and_first_badge() {
        let (service, ctx) = fixture().await;
        let task = service
            .create("user-1", NewTask::new("Write", Difficulty::Medium, 10))
            .await
            .unwrap();

        let response = service.complete("user-1", &task.id).await.unwrap();
        assert!(response.task.completed);
        assert_eq!(response.points_earned, 10);
        assert_eq!(response.outcome.xp_earned, 10);
        assert_eq!(response.outcome.new_badges, vec!["first_task".to_string()]);

        let progress = ctx.require_progress("user-1").await.unwrap();
        assert_eq!(progress.current_points, 10);
        assert_eq!(progress.current_xp, 10);
    }

    #[tokio::test]
    async fn test_complete_twice_rejected() {
        let (service, _) = fixture().await;
        let task = service
            .create("user-1", NewTask::new("Write", Difficulty::Easy, 3))
            .await
            .unwrap();
        service.complete("user-1", &task.id).await.unwrap();

        let err = service.complete("user-1", &task.id).await.unwrap_err();
        assert!(matches!(err, ProgressionError::TaskAlreadyCompleted(_)));
    }

    #[tokio::test]
    async fn test_uncomplete_deducts_points_keeps_xp() {
        let (service, ctx) = fixture().await;
        let task = service
            .create("user-1", NewTask::new("Write", Difficulty::Hard, 20))
            .await
            .unwrap();
        service.complete("user-1", &task.id).await.unwrap();

        let response = service.uncomplete("user-1", &task.id).await.unwrap();
        assert!(!response.task.completed);
        assert_eq!(response.points_deducted, 20);

        let progress = ctx.require_progress("user-1").await.unwrap();
        assert_eq!(progress.total_earned_points, 0);
        assert_eq!(progress.current_points, 0);
        assert_eq!(progress.current_xp, 20);
        assert!(ctx.achievements.has_badge("user-1", "first_task").await.unwrap());
    }

    #[tokio::test]
    async fn test_uncomplete_pending_rejected() {
        let (service, _) = fixture().await;
        let task = service
            .create("user-1", NewTask::new("Write", Difficulty::Easy, 1))
            .await
            .unwrap();
        let err = service.uncomplete("user-1", &task.id).await.unwrap_err();
        assert!(matches!(err, ProgressionError::TaskNotCompleted(_)));
    }

    #[tokio::test]
    async fn test_other_users_task_not_found() {
        let (service, _) = fixture().await;
        let task = service
            .create("user-1", NewTask::new("Private", Difficulty::Easy, 1))
            .await
            .unwrap();
        let err = service.complete("user-2", &task.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_limited_fields() {
        let (service, _) = fixture().await;
        let task = service
            .create(
                "user-1",
                NewTask::new("Draft", Difficulty::Easy, 2).with_description("old"),
            )
            .await
            .unwrap();

        let updated = service
            .update(
                "user-1",
                &task.id,
                TaskUpdate {
                    title: Some("Final".to_string()),
                    description: Some(String::new()),
                    category_id: Some("home".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");
        assert!(updated.description.is_none());
        assert_eq!(updated.category_id.as_deref(), Some("home"));
        assert_eq!(updated.points, 2);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filter() {
        let (service, _) = fixture().await;
        let first = service
            .create("user-1", NewTask::new("first", Difficulty::Easy, 1))
            .await
            .unwrap();
        let second = service
            .create("user-1", NewTask::new("second", Difficulty::Easy, 1))
            .await
            .unwrap();
        service.complete("user-1", &first.id).await.unwrap();

        let all = service.list("user-1", &TaskFilter::default()).await.unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.tasks[0].id, second.id);

        let done = service
            .list(
                "user-1",
                &TaskFilter {
                    status: TaskStatusFilter::Completed,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(done.total, 1);
        assert_eq!(service.completed_count("user-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_xp_failure_reverts_points_and_task() {
        let memory = Repositories::in_memory();
        let shared_progress = memory.progress.clone();
        shared_progress
            .create_progress(&UserProgress::new("user-1"))
            .await
            .unwrap();

        let mut config = ProgressionConfig::default();
        config.rewards.task_complete_xp_per_point = -1;

        let ctx = GamificationContext::builder(&config)
            .with_repositories(memory)
            .build();
        let service = TaskService::new(ctx.clone());
        let task = service
            .create("user-1", NewTask::new("Broken", Difficulty::Easy, 4))
            .await
            .unwrap();

        let err = service.complete("user-1", &task.id).await.unwrap_err();
        assert!(matches!(err, ProgressionError::Validation(_)));

        let progress = ctx.require_progress("user-1").await.unwrap();
        assert_eq!(progress.total_earned_points, 0);
        assert!(!service.get("user-1", &task.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_xp_overflow_rejected_before_any_change() {
        let mut config = ProgressionConfig::default();
        config.rewards.task_complete_xp_per_point = i64::MAX;

        let ctx = GamificationContext::in_memory(&config);
        ctx.repos
            .progress
            .create_progress(&UserProgress::new("user-1"))
            .await
            .unwrap();
        let service = TaskService::new(ctx.clone());
        let task = service
            .create("user-1", NewTask::new("Huge", Difficulty::Easy, 4))
            .await
            .unwrap();

        let err = service.complete("user-1", &task.id).await.unwrap_err();
        assert!(matches!(err, ProgressionError::Validation(_)));

        let progress = ctx.require_progress("user-1").await.unwrap();
        assert_eq!(progress.total_earned_points, 0);
        assert_eq!(progress.current_xp, 0);
        assert!(!service.get("user-1", &task.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_points_failure_surfaces() {
        let mut progress_repo = MockUserProgressRepositoryTrait::new();
        progress_repo
            .expect_get_progress()
            .returning(|id| Ok(Some(UserProgress::new(id))));
        progress_repo
            .expect_save_progress()
            .returning(|_| Err(ProgressionError::Storage("offline".to_string())));
        let repos = Repositories {
            progress: Arc::new(progress_repo),
            ..Repositories::in_memory()
        };
        let ctx = GamificationContext::builder(&ProgressionConfig::default())
            .with_repositories(repos)
            .build();
        let service = TaskService::new(ctx);
        let task = service
            .create("user-1", NewTask::new("Write", Difficulty::Easy, 2))
            .await
            .unwrap();

        let err = service.complete("user-1", &task.id).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!service.get("user-1", &task.id).await.unwrap().completed);
    }
}
