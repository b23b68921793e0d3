use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{TodoItemId, TodoListId};
use domain::{TodoItemSnapshot, TodoListSnapshot};
use tokio::sync::RwLock;

use crate::{
    DatabaseError, Result,
    store::{TodoStore, WriteBatch},
};

#[derive(Debug, Default, Clone)]
struct Tables {
    lists: HashMap<TodoListId, TodoListSnapshot>,
    items: HashMap<TodoItemId, TodoItemSnapshot>,
}

/// In-memory todo store for development and tests.
///
/// Enforces the same constraints as the PostgreSQL schema and reports
/// violations with PostgreSQL codes and wording.
#[derive(Clone, Default)]
pub struct InMemoryTodoStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryTodoStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored lists.
    pub async fn list_count(&self) -> usize {
        self.tables.read().await.lists.len()
    }

    /// Returns the number of stored items.
    pub async fn item_count(&self) -> usize {
        self.tables.read().await.items.len()
    }

    /// Removes every list and item.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.lists.clear();
        tables.items.clear();
    }
}

impl Tables {
    fn upsert_list(&mut self, list: TodoListSnapshot) -> Result<()> {
        let duplicate = self
            .lists
            .values()
            .any(|existing| existing.id != list.id && existing.title == list.title);
        if duplicate {
            return Err(DatabaseError {
                code: Some("23505".to_string()),
                constraint: Some("ix_todo_lists_title".to_string()),
                table: Some("todo_lists".to_string()),
                message: "duplicate key value violates unique constraint \"ix_todo_lists_title\""
                    .to_string(),
                detail: Some(format!("Key (title)=({}) already exists.", list.title)),
            }
            .into());
        }

        self.lists.insert(list.id, list);
        Ok(())
    }

    fn upsert_item(&mut self, item: TodoItemSnapshot) -> Result<()> {
        if !self.lists.contains_key(&item.list_id) {
            return Err(DatabaseError {
                code: Some("23503".to_string()),
                constraint: Some("todo_items_list_id_fkey".to_string()),
                table: Some("todo_items".to_string()),
                message: "insert or update on table \"todo_items\" violates foreign key \
                          constraint \"todo_items_list_id_fkey\""
                    .to_string(),
                detail: Some(format!(
                    "Key (list_id)=({}) is not present in table \"todo_lists\".",
                    item.list_id
                )),
            }
            .into());
        }

        self.items.insert(item.id, item);
        Ok(())
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn apply(&self, batch: WriteBatch) -> Result<usize> {
        let mut tables = self.tables.write().await;

        // Stage on a copy so a failing write leaves the tables untouched.
        let mut staged = tables.clone();
        let mut written = 0;

        for list in batch.lists {
            staged.upsert_list(list)?;
            written += 1;
        }
        for item in batch.items {
            staged.upsert_item(item)?;
            written += 1;
        }
        for id in batch.deleted_items {
            if staged.items.remove(&id).is_some() {
                written += 1;
            }
        }

        *tables = staged;
        Ok(written)
    }

    async fn get_list(&self, id: TodoListId) -> Result<Option<TodoListSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.lists.get(&id).cloned())
    }

    async fn all_lists(&self) -> Result<Vec<TodoListSnapshot>> {
        let tables = self.tables.read().await;
        let mut lists: Vec<_> = tables.lists.values().cloned().collect();
        lists.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(lists)
    }

    async fn get_item(&self, id: TodoItemId) -> Result<Option<TodoItemSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn items_in_list(&self, list_id: TodoListId) -> Result<Vec<TodoItemSnapshot>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .items
            .values()
            .filter(|item| item.list_id == list_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.audit
                .created
                .cmp(&b.audit.created)
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }
}
