//! Todo item entity.

use chrono::{DateTime, Utc};
use common::{TodoItemId, TodoListId};
use serde::{Deserialize, Serialize};

use crate::entity::{AuditInfo, Entity};
use crate::error::DomainError;
use crate::event::DomainEvents;

use super::{PriorityLevel, TodoEvent, TodoItemCompletedData, TodoItemCreatedData};

/// A single task on a todo list.
///
/// State changes go through the mutators below; the ones that represent a
/// business fact also queue a [`TodoEvent`].
#[derive(Debug)]
pub struct TodoItem {
    id: TodoItemId,
    list_id: TodoListId,
    title: String,
    note: String,
    priority: Option<PriorityLevel>,
    reminder: Option<DateTime<Utc>>,
    done: bool,
    audit: AuditInfo,
    events: DomainEvents<TodoEvent>,
}

/// Persisted state of a [`TodoItem`], without its event queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItemSnapshot {
    pub id: TodoItemId,
    pub list_id: TodoListId,
    pub title: String,
    pub note: String,
    pub priority: Option<PriorityLevel>,
    pub reminder: Option<DateTime<Utc>>,
    pub done: bool,
    pub audit: AuditInfo,
}

impl TodoItem {
    /// Creates a new item on a list and raises `TodoItemCreated`.
    pub fn new(list_id: TodoListId, title: &str) -> Result<Self, DomainError> {
        let title = super::normalize_title("Todo item", title)?;
        let mut item = Self {
            id: TodoItemId::new(),
            list_id,
            title,
            note: String::new(),
            priority: None,
            reminder: None,
            done: false,
            audit: AuditInfo::default(),
            events: DomainEvents::new(),
        };

        item.events
            .raise(TodoEvent::TodoItemCreated(TodoItemCreatedData {
                item_id: item.id,
                list_id: item.list_id,
                title: item.title.clone(),
            }));

        Ok(item)
    }

    /// Rebuilds an item from persisted state. No events are raised.
    pub fn from_snapshot(snapshot: TodoItemSnapshot) -> Self {
        Self {
            id: snapshot.id,
            list_id: snapshot.list_id,
            title: snapshot.title,
            note: snapshot.note,
            priority: snapshot.priority,
            reminder: snapshot.reminder,
            done: snapshot.done,
            audit: snapshot.audit,
            events: DomainEvents::new(),
        }
    }

    /// Captures the persisted state of the item.
    pub fn snapshot(&self) -> TodoItemSnapshot {
        TodoItemSnapshot {
            id: self.id,
            list_id: self.list_id,
            title: self.title.clone(),
            note: self.note.clone(),
            priority: self.priority,
            reminder: self.reminder,
            done: self.done,
            audit: self.audit.clone(),
        }
    }

    pub fn id(&self) -> TodoItemId {
        self.id
    }

    pub fn list_id(&self) -> TodoListId {
        self.list_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn priority(&self) -> Option<PriorityLevel> {
        self.priority
    }

    pub fn reminder(&self) -> Option<DateTime<Utc>> {
        self.reminder
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Marks the item as done and raises `TodoItemCompleted`.
    ///
    /// Completing an item that is already done changes nothing.
    pub fn mark_as_done(&mut self) {
        if self.done {
            return;
        }

        self.done = true;
        self.events
            .raise(TodoEvent::TodoItemCompleted(TodoItemCompletedData {
                item_id: self.id,
                list_id: self.list_id,
                title: self.title.clone(),
                completed_at: Utc::now(),
            }));
    }

    /// Replaces the title.
    pub fn update_title(&mut self, title: &str) -> Result<(), DomainError> {
        self.title = super::normalize_title("Todo item", title)?;
        Ok(())
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn set_priority(&mut self, priority: Option<PriorityLevel>) {
        self.priority = priority;
    }

    pub fn set_reminder(&mut self, reminder: Option<DateTime<Utc>>) {
        self.reminder = reminder;
    }
}

impl Entity for TodoItem {
    type Event = TodoEvent;

    fn entity_type() -> &'static str {
        "TodoItem"
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
    use crate::event::DomainEvent;

    fn new_item() -> TodoItem {
        let mut item = TodoItem::new(TodoListId::new(), "Buy milk").unwrap();
        item.clear_domain_events();
        item
    }

    #[test]
    fn new_item_raises_created_event() {
        let list_id = TodoListId::new();
        let item = TodoItem::new(list_id, "  Buy milk ").unwrap();

        assert_eq!(item.title(), "Buy milk");
        assert!(!item.is_done());
        assert_eq!(item.domain_events().len(), 1);
        assert_eq!(item.domain_events()[0].event_type(), "TodoItemCreated");
    }

    #[test]
    fn new_item_requires_title() {
        let err = TodoItem::new(TodoListId::new(), "   ").unwrap_err();
        assert_eq!(err, DomainError::EmptyTitle { entity: "Todo item" });
    }

    #[test]
    fn mark_as_done_appends_exactly_one_event() {
        let mut item = new_item();
        item.mark_as_done();

        assert!(item.is_done());
        assert_eq!(item.domain_events().len(), 1);
        match &item.domain_events()[0] {
            TodoEvent::TodoItemCompleted(data) => {
                assert_eq!(data.item_id, item.id());
                assert_eq!(data.title, "Buy milk");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn mark_as_done_twice_is_a_no_op() {
        let mut item = new_item();
        item.mark_as_done();
        item.mark_as_done();

        assert_eq!(item.domain_events().len(), 1);
    }

    #[test]
    fn snapshot_roundtrip_drops_events() {
        let mut item = TodoItem::new(TodoListId::new(), "Walk dog").unwrap();
        item.set_note("twice a day");
        item.set_priority(Some(PriorityLevel::High));

        let restored = TodoItem::from_snapshot(item.snapshot());

        assert_eq!(restored.snapshot(), item.snapshot());
        assert!(restored.domain_events().is_empty());
    }

    #[test]
    fn update_title_rejects_blank() {
        let mut item = new_item();
        assert!(item.update_title("").is_err());
        assert_eq!(item.title(), "Buy milk");

        item.update_title("Buy oat milk").unwrap();
        assert_eq!(item.title(), "Buy oat milk");
    }
}
