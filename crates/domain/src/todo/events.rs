//! Todo domain events.

use chrono::{DateTime, Utc};
use common::{TodoItemId, TodoListId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::Colour;

/// Events raised by todo lists and todo items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TodoEvent {
    /// A list was created.
    TodoListCreated(TodoListCreatedData),

    /// An item was added to a list.
    TodoItemCreated(TodoItemCreatedData),

    /// An item was marked as done.
    TodoItemCompleted(TodoItemCompletedData),
}

impl TodoEvent {
    pub const LIST_CREATED: &'static str = "TodoListCreated";
    pub const ITEM_CREATED: &'static str = "TodoItemCreated";
    pub const ITEM_COMPLETED: &'static str = "TodoItemCompleted";
}

impl DomainEvent for TodoEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TodoEvent::TodoListCreated(_) => Self::LIST_CREATED,
            TodoEvent::TodoItemCreated(_) => Self::ITEM_CREATED,
            TodoEvent::TodoItemCompleted(_) => Self::ITEM_COMPLETED,
        }
    }
}

/// Data for TodoListCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoListCreatedData {
    pub list_id: TodoListId,
    pub title: String,
    pub colour: Colour,
}

/// Data for TodoItemCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItemCreatedData {
    pub item_id: TodoItemId,
    pub list_id: TodoListId,
    pub title: String,
}

/// Data for TodoItemCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItemCompletedData {
    pub item_id: TodoItemId,
    pub list_id: TodoListId,
    pub title: String,

    /// When the item was marked as done.
    pub completed_at: DateTime<Utc>,
}
