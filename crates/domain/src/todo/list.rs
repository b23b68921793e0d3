//! Todo list entity.

use common::TodoListId;
use serde::{Deserialize, Serialize};

use crate::entity::{AuditInfo, Entity};
use crate::error::DomainError;
use crate::event::DomainEvents;

use super::{Colour, TodoEvent, TodoListCreatedData};

/// A named, coloured list that todo items belong to.
#[derive(Debug)]
pub struct TodoList {
    id: TodoListId,
    title: String,
    colour: Colour,
    audit: AuditInfo,
    events: DomainEvents<TodoEvent>,
}

/// Persisted state of a [`TodoList`], without its event queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoListSnapshot {
    pub id: TodoListId,
    pub title: String,
    pub colour: Colour,
    pub audit: AuditInfo,
}

impl TodoList {
    /// Creates a new list and raises `TodoListCreated`.
    pub fn new(title: &str, colour: Colour) -> Result<Self, DomainError> {
        let title = super::normalize_title("Todo list", title)?;
        let mut list = Self {
            id: TodoListId::new(),
            title,
            colour,
            audit: AuditInfo::default(),
            events: DomainEvents::new(),
        };

        list.events
            .raise(TodoEvent::TodoListCreated(TodoListCreatedData {
                list_id: list.id,
                title: list.title.clone(),
                colour,
            }));

        Ok(list)
    }

    /// Rebuilds a list from persisted state. No events are raised.
    pub fn from_snapshot(snapshot: TodoListSnapshot) -> Self {
        Self {
            id: snapshot.id,
            title: snapshot.title,
            colour: snapshot.colour,
            audit: snapshot.audit,
            events: DomainEvents::new(),
        }
    }

    /// Captures the persisted state of the list.
    pub fn snapshot(&self) -> TodoListSnapshot {
        TodoListSnapshot {
            id: self.id,
            title: self.title.clone(),
            colour: self.colour,
            audit: self.audit.clone(),
        }
    }

    pub fn id(&self) -> TodoListId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    /// Changes the list colour.
    pub fn recolour(&mut self, colour: Colour) {
        self.colour = colour;
    }
}

impl Entity for TodoList {
    type Event = TodoEvent;

    fn entity_type() -> &'static str {
        "TodoList"
    }

    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }

    fn domain_events(&self) -> &[TodoEvent] {
        self.events.as_slice()
    }

    fn clear_domain_events(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_raises_created_event() {
        let list = TodoList::new("Groceries", Colour::GREEN).unwrap();

        assert_eq!(list.title(), "Groceries");
        assert_eq!(list.colour(), Colour::GREEN);
        assert!(list.audit().is_new());
        assert!(matches!(
            list.domain_events(),
            [TodoEvent::TodoListCreated(data)] if data.list_id == list.id()
        ));
    }

    #[test]
    fn new_list_requires_title() {
        assert!(TodoList::new("", Colour::WHITE).is_err());
    }

    #[test]
    fn from_snapshot_restores_state_without_events() {
        let list = TodoList::new("Chores", Colour::GREY).unwrap();
        let restored = TodoList::from_snapshot(list.snapshot());

        assert_eq!(restored.id(), list.id());
        assert_eq!(restored.colour(), Colour::GREY);
        assert!(restored.domain_events().is_empty());
    }
}
