use chrono::{DateTime, Utc};
use common::{TodoItemId, TodoListId};
use domain::{PriorityLevel, TodoItem, TodoItemSnapshot, TodoListSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoListDto {
    pub id: TodoListId,
    pub title: String,
    pub colour: String,
}

impl From<TodoListSnapshot> for TodoListDto {
    fn from(list: TodoListSnapshot) -> Self {
        Self {
            id: list.id,
            title: list.title,
            colour: list.colour.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItemDto {
    pub id: TodoItemId,
    pub list_id: TodoListId,
    pub title: String,
    pub note: String,
    pub priority: Option<PriorityLevel>,
    pub reminder: Option<DateTime<Utc>>,
    pub done: bool,
}

impl From<TodoItemSnapshot> for TodoItemDto {
    fn from(item: TodoItemSnapshot) -> Self {
        Self {
            id: item.id,
            list_id: item.list_id,
            title: item.title,
            note: item.note,
            priority: item.priority,
            reminder: item.reminder,
            done: item.done,
        }
    }
}

impl From<&TodoItem> for TodoItemDto {
    fn from(item: &TodoItem) -> Self {
        item.snapshot().into()
    }
}
