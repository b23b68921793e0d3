use async_trait::async_trait;
use common::{TodoItemId, TodoListId};
use domain::{AuditInfo, Colour, PriorityLevel, TodoItemSnapshot, TodoListSnapshot};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    PersistenceError, Result,
    store::{TodoStore, WriteBatch},
};

const LIST_COLUMNS: &str =
    "id, title, colour, created, created_by, last_modified, last_modified_by";

const ITEM_COLUMNS: &str = "id, list_id, title, note, priority, reminder, done, \
                            created, created_by, last_modified, last_modified_by";

/// PostgreSQL-backed todo store.
#[derive(Clone)]
pub struct PostgresTodoStore {
    pool: PgPool,
}

impl PostgresTodoStore {
    /// Creates a new PostgreSQL todo store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_audit(row: &PgRow) -> Result<AuditInfo> {
        Ok(AuditInfo {
            created: row.try_get("created")?,
            created_by: row.try_get("created_by")?,
            last_modified: row.try_get("last_modified")?,
            last_modified_by: row.try_get("last_modified_by")?,
        })
    }

    fn row_to_list(row: PgRow) -> Result<TodoListSnapshot> {
        let colour: String = row.try_get("colour")?;
        let colour = Colour::from_code(&colour).map_err(|_| PersistenceError::InvalidStoredValue {
            column: "todo_lists.colour",
            value: colour,
        })?;

        Ok(TodoListSnapshot {
            id: TodoListId::from_uuid(row.try_get::<Uuid, _>("id")?),
            title: row.try_get("title")?,
            colour,
            audit: Self::row_to_audit(&row)?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<TodoItemSnapshot> {
        let priority = row
            .try_get::<Option<String>, _>("priority")?
            .map(|value| {
                value
                    .parse::<PriorityLevel>()
                    .map_err(|_| PersistenceError::InvalidStoredValue {
                        column: "todo_items.priority",
                        value,
                    })
            })
            .transpose()?;

        Ok(TodoItemSnapshot {
            id: TodoItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            list_id: TodoListId::from_uuid(row.try_get::<Uuid, _>("list_id")?),
            title: row.try_get("title")?,
            note: row.try_get("note")?,
            priority,
            reminder: row.try_get("reminder")?,
            done: row.try_get("done")?,
            audit: Self::row_to_audit(&row)?,
        })
    }

    async fn upsert_list(tx: &mut Transaction<'_, Postgres>, list: &TodoListSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO todo_lists (id, title, colour, created, created_by, last_modified, last_modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                colour = EXCLUDED.colour,
                last_modified = EXCLUDED.last_modified,
                last_modified_by = EXCLUDED.last_modified_by
            "#,
        )
        .bind(list.id.as_uuid())
        .bind(&list.title)
        .bind(list.colour.code())
        .bind(list.audit.created)
        .bind(&list.audit.created_by)
        .bind(list.audit.last_modified)
        .bind(&list.audit.last_modified_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn upsert_item(tx: &mut Transaction<'_, Postgres>, item: &TodoItemSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO todo_items (id, list_id, title, note, priority, reminder, done,
                                    created, created_by, last_modified, last_modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                note = EXCLUDED.note,
                priority = EXCLUDED.priority,
                reminder = EXCLUDED.reminder,
                done = EXCLUDED.done,
                last_modified = EXCLUDED.last_modified,
                last_modified_by = EXCLUDED.last_modified_by
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.list_id.as_uuid())
        .bind(&item.title)
        .bind(&item.note)
        .bind(item.priority.map(|p| p.as_str()))
        .bind(item.reminder)
        .bind(item.done)
        .bind(item.audit.created)
        .bind(&item.audit.created_by)
        .bind(item.audit.last_modified)
        .bind(&item.audit.last_modified_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PostgresTodoStore {
    async fn apply(&self, batch: WriteBatch) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for list in &batch.lists {
            Self::upsert_list(&mut tx, list).await?;
            written += 1;
        }
        for item in &batch.items {
            Self::upsert_item(&mut tx, item).await?;
            written += 1;
        }
        for id in &batch.deleted_items {
            let result = sqlx::query("DELETE FROM todo_items WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn get_list(&self, id: TodoListId) -> Result<Option<TodoListSnapshot>> {
        let row = sqlx::query(&format!("SELECT {LIST_COLUMNS} FROM todo_lists WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_list).transpose()
    }

    async fn all_lists(&self) -> Result<Vec<TodoListSnapshot>> {
        let rows = sqlx::query(&format!("SELECT {LIST_COLUMNS} FROM todo_lists ORDER BY title"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_list).collect()
    }

    async fn get_item(&self, id: TodoItemId) -> Result<Option<TodoItemSnapshot>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM todo_items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn items_in_list(&self, list_id: TodoListId) -> Result<Vec<TodoItemSnapshot>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM todo_items WHERE list_id = $1 ORDER BY created, id"
        ))
        .bind(list_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }
}
