//! Todo lists and items: requests, handlers, validators, and subscribers.

mod commands;
mod dto;
mod queries;
mod subscribers;
mod validators;

use std::sync::Arc;

use domain::TodoEvent;
use persistence::{EventPublisher, UnitOfWork};

pub use commands::{
    CreateTodoItem, CreateTodoList, DeleteTodoItem, MarkTodoItemDone, TodoCommands, UpdateTodoItem,
};
pub use dto::{TodoItemDto, TodoListDto};
pub use queries::{GetTodoItemsInList, GetTodoLists, TodoQueries};
pub use subscribers::LogTodoItemCompleted;
pub use validators::{
    CreateTodoItemValidator, CreateTodoListValidator, MAX_TITLE_LENGTH, UpdateTodoItemValidator,
};

use crate::error::MediatorError;
use crate::mediator::MediatorBuilder;
use crate::security::Policy;

/// Registers the todo handlers, validators, and policies.
pub fn register(builder: &mut MediatorBuilder, uow: Arc<UnitOfWork>) -> Result<(), MediatorError> {
    let commands = TodoCommands::new(uow.clone());
    let queries = TodoQueries::new(uow.shared_store());

    builder
        .register_handler::<CreateTodoList, _>(commands.clone())?
        .register_policy::<CreateTodoList>(Policy::TODO_WRITE_ACCESS)
        .register_validator::<CreateTodoList, _>(CreateTodoListValidator);

    builder
        .register_handler::<CreateTodoItem, _>(commands.clone())?
        .register_policy::<CreateTodoItem>(Policy::TODO_WRITE_ACCESS)
        .register_validator::<CreateTodoItem, _>(CreateTodoItemValidator);

    builder
        .register_handler::<MarkTodoItemDone, _>(commands.clone())?
        .register_policy::<MarkTodoItemDone>(Policy::TODO_WRITE_ACCESS);

    builder
        .register_handler::<UpdateTodoItem, _>(commands.clone())?
        .register_policy::<UpdateTodoItem>(Policy::TODO_WRITE_ACCESS)
        .register_validator::<UpdateTodoItem, _>(UpdateTodoItemValidator);

    builder
        .register_handler::<DeleteTodoItem, _>(commands)?
        .register_policy::<DeleteTodoItem>(Policy::TODO_DELETE_ACCESS);

    builder.register_handler::<GetTodoLists, _>(queries.clone())?;
    builder.register_handler::<GetTodoItemsInList, _>(queries)?;

    Ok(())
}

/// Subscribes the todo event subscribers.
pub fn subscribe(publisher: &mut EventPublisher<TodoEvent>) {
    publisher.subscribe(TodoEvent::ITEM_COMPLETED, Arc::new(LogTodoItemCompleted));
}
