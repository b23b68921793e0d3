use async_trait::async_trait;
use common::{TodoItemId, TodoListId};
use domain::{TodoItem, TodoItemSnapshot, TodoList, TodoListSnapshot};

use crate::Result;

/// Writes produced by one save cycle, applied atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    /// Lists to insert or update.
    pub lists: Vec<TodoListSnapshot>,

    /// Items to insert or update.
    pub items: Vec<TodoItemSnapshot>,

    /// Items to delete.
    pub deleted_items: Vec<TodoItemId>,
}

impl WriteBatch {
    /// Returns true if the batch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.items.is_empty() && self.deleted_items.is_empty()
    }
}

/// Storage for todo lists and items.
///
/// Implementations must enforce the unique index on list titles and report
/// violations through [`crate::DatabaseError`] so they are interpreted the
/// same way for every backend.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Applies a batch atomically: either every write succeeds or none do.
    ///
    /// Returns the number of rows written.
    async fn apply(&self, batch: WriteBatch) -> Result<usize>;

    /// Retrieves a list by id.
    async fn get_list(&self, id: TodoListId) -> Result<Option<TodoListSnapshot>>;

    /// Retrieves all lists ordered by title.
    async fn all_lists(&self) -> Result<Vec<TodoListSnapshot>>;

    /// Retrieves an item by id.
    async fn get_item(&self, id: TodoItemId) -> Result<Option<TodoItemSnapshot>>;

    /// Retrieves the items of a list in creation order.
    async fn items_in_list(&self, list_id: TodoListId) -> Result<Vec<TodoItemSnapshot>>;
}

/// Extension trait returning rehydrated entities instead of snapshots.
#[async_trait]
pub trait TodoStoreExt: TodoStore {
    /// Loads a list entity.
    async fn load_list(&self, id: TodoListId) -> Result<Option<TodoList>> {
        Ok(self.get_list(id).await?.map(TodoList::from_snapshot))
    }

    /// Loads an item entity.
    async fn load_item(&self, id: TodoItemId) -> Result<Option<TodoItem>> {
        Ok(self.get_item(id).await?.map(TodoItem::from_snapshot))
    }

    /// Checks if a list exists.
    async fn list_exists(&self, id: TodoListId) -> Result<bool> {
        Ok(self.get_list(id).await?.is_some())
    }
}

// Blanket implementation for all TodoStore implementations
impl<T: TodoStore + ?Sized> TodoStoreExt for T {}
