//! Todo lists, todo items, and their value objects.

mod colour;
mod events;
mod item;
mod list;
mod priority;

pub use colour::Colour;
pub use events::{TodoEvent, TodoItemCompletedData, TodoItemCreatedData, TodoListCreatedData};
pub use item::{TodoItem, TodoItemSnapshot};
pub use list::{TodoList, TodoListSnapshot};
pub use priority::PriorityLevel;

use crate::error::DomainError;

/// Trims a title and rejects it if nothing is left.
fn normalize_title(entity: &'static str, title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::EmptyTitle { entity });
    }
    Ok(title.to_string())
}
