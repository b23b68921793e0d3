//! Domain layer for Exemplum.
//!
//! This crate provides the core domain abstractions including:
//! - Entity base with audit metadata and a domain event queue
//! - DomainEvent trait for facts raised by entity mutations
//! - Todo lists and items with their value objects
//! - Weather forecast read model

pub mod entity;
pub mod error;
pub mod event;
pub mod todo;
pub mod weather;

pub use entity::{AuditInfo, Entity};
pub use error::DomainError;
pub use event::{DomainEvent, DomainEvents};
pub use todo::{
    Colour, PriorityLevel, TodoEvent, TodoItem, TodoItemCompletedData, TodoItemCreatedData,
    TodoItemSnapshot, TodoList, TodoListCreatedData, TodoListSnapshot,
};
pub use weather::{DailyForecast, Location, WeatherForecast};
