//! Identifier types shared by the domain, application, and transport layers.

mod types;

pub use types::{TodoItemId, TodoListId, UserId};
