//! Integration tests for todo lists and items.
//!
//! These tests exercise the public entity API the way the persistence layer
//! and application handlers use it.

use common::TodoListId;
use domain::{
    Colour, DomainError, DomainEvent, Entity, PriorityLevel, TodoEvent, TodoItem, TodoList,
};

mod event_queue {
    use super::*;

    #[test]
    fn created_then_completed_events_queue_in_order() {
        let mut item = TodoItem::new(TodoListId::new(), "Write report").unwrap();
        item.mark_as_done();

        let types: Vec<_> = item
            .domain_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect();
        assert_eq!(types, vec!["TodoItemCreated", "TodoItemCompleted"]);
    }

    #[test]
    fn clearing_queue_then_mutating_raises_only_new_events() {
        let mut item = TodoItem::new(TodoListId::new(), "Write report").unwrap();
        item.clear_domain_events();

        item.set_note("draft first");
        item.set_priority(Some(PriorityLevel::Medium));
        assert!(item.domain_events().is_empty());

        item.mark_as_done();
        assert_eq!(item.domain_events().len(), 1);
    }

    #[test]
    fn restored_items_start_with_empty_queue() {
        let mut item = TodoItem::new(TodoListId::new(), "Water plants").unwrap();
        item.mark_as_done();

        let restored = TodoItem::from_snapshot(item.snapshot());
        assert!(restored.is_done());
        assert!(restored.domain_events().is_empty());
    }
}

mod lists {
    use super::*;

    #[test]
    fn list_event_carries_colour() {
        let list = TodoList::new("Holidays", Colour::from_code("#FFC300").unwrap()).unwrap();

        match list.domain_events() {
            [TodoEvent::TodoListCreated(data)] => {
                assert_eq!(data.title, "Holidays");
                assert_eq!(data.colour, Colour::ORANGE);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn unsupported_colour_is_rejected() {
        let err = Colour::from_code("#000000").unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedColour(code) if code == "#000000"));
    }

    #[test]
    fn snapshot_serializes_colour_as_code() {
        let list = TodoList::new("Work", Colour::BLUE).unwrap();
        let json = serde_json::to_value(list.snapshot()).unwrap();

        assert_eq!(json["colour"], "#6666FF");
        assert_eq!(json["title"], "Work");
    }
}
