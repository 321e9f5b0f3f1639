use super::{GatewayError, SyncGateway, TagRecord, TaskRecord};
use crate::db::{self, DbPool};
use crate::error::CoreError;
use crate::models::{UpdateTaskData, UserSession};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

/// SQLite-backed gateway. Rows of every user live in the same tables and
/// are filtered by `user_id`.
pub struct SqliteGateway {
    pool: DbPool,
}

impl SqliteGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(db_path: &str) -> Result<Self, CoreError> {
        Ok(Self::new(db::establish_connection(db_path).await?))
    }

    pub async fn in_memory() -> Result<Self, CoreError> {
        Ok(Self::new(db::establish_in_memory().await?))
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Appends `column = value` pairs for every supplied field.
    fn push_assignments<'a>(builder: &mut QueryBuilder<'a, Sqlite>, changes: &UpdateTaskData) {
        let mut set = builder.separated(", ");
        if let Some(title) = &changes.title {
            set.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(description) = &changes.description {
            set.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(completed) = changes.completed {
            set.push("completed = ").push_bind_unseparated(completed);
        }
        if let Some(priority) = changes.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(tag) = &changes.tag {
            set.push("tag = ").push_bind_unseparated(tag.clone());
        }
        if let Some(time_slot) = &changes.time_slot {
            set.push("time_slot = ").push_bind_unseparated(time_slot.clone());
        }
        if let Some(duration) = &changes.duration {
            set.push("duration = ").push_bind_unseparated(duration.clone());
        }
        if let Some(links) = &changes.links {
            set.push("links = ").push_bind_unseparated(links.clone());
        }
        if let Some(deadline) = changes.deadline {
            set.push("deadline = ").push_bind_unseparated(deadline);
        }
        if let Some(scheduled_date) = changes.scheduled_date {
            set.push("scheduled_date = ").push_bind_unseparated(scheduled_date);
        }
        if let Some(enabled) = changes.notifications_enabled {
            set.push("notifications_enabled = ").push_bind_unseparated(enabled);
        }
        if let Some(email) = &changes.email_notification {
            set.push("email_notification = ").push_bind_unseparated(email.clone());
        }
        if let Some(time) = changes.notification_time {
            set.push("notification_time = ").push_bind_unseparated(time);
        }
    }
}

#[async_trait]
impl SyncGateway for SqliteGateway {
    async fn load_tags(&self, session: &UserSession) -> Result<Vec<TagRecord>, GatewayError> {
        let tags = sqlx::query_as("SELECT user_id, tag FROM tags WHERE user_id = $1 ORDER BY rowid")
            .bind(&session.user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(tags)
    }

    async fn load_tasks(&self, session: &UserSession) -> Result<Vec<TaskRecord>, GatewayError> {
        let tasks = sqlx::query_as("SELECT * FROM tasks WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(&session.user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn insert_task(&self, session: &UserSession, record: &TaskRecord) -> Result<(), GatewayError> {
        sqlx::query(
            r#"INSERT INTO tasks (
                id, user_id, title, description, completed, priority, tag,
                time_slot, duration, links, deadline, scheduled_date,
                notifications_enabled, email_notification, notification_time, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.id)
        .bind(&session.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.completed)
        .bind(record.priority)
        .bind(&record.tag)
        .bind(&record.time_slot)
        .bind(&record.duration)
        .bind(&record.links)
        .bind(record.deadline)
        .bind(record.scheduled_date)
        .bind(record.notifications_enabled)
        .bind(&record.email_notification)
        .bind(record.notification_time)
        .bind(record.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_task(
        &self,
        session: &UserSession,
        id: Uuid,
        changes: &UpdateTaskData,
    ) -> Result<(), GatewayError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        Self::push_assignments(&mut builder, changes);
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND user_id = ");
        builder.push_bind(session.user_id.clone());

        let result = builder.build().execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::Rejected(format!("no task {}", id)));
        }
        Ok(())
    }

    async fn delete_task(&self, session: &UserSession, id: Uuid) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(&session.user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::Rejected(format!("no task {}", id)));
        }
        Ok(())
    }

    async fn insert_tag(&self, session: &UserSession, tag: &str) -> Result<(), GatewayError> {
        sqlx::query("INSERT INTO tags (user_id, tag) VALUES ($1, $2) ON CONFLICT (user_id, tag) DO NOTHING")
            .bind(&session.user_id)
            .bind(tag)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn remove_tag(
        &self,
        session: &UserSession,
        tag: &str,
        reassign_to: &str,
    ) -> Result<(), GatewayError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM tags WHERE user_id = $1 AND tag = $2")
            .bind(&session.user_id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE tasks SET tag = $1 WHERE user_id = $2 AND tag = $3")
            .bind(reassign_to)
            .bind(&session.user_id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
