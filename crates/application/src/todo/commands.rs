//! Todo commands and their handler.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{TodoItemId, TodoListId};
use domain::{Colour, Entity, PriorityLevel, TodoItem, TodoList};
use persistence::{ChangeSet, TodoStoreExt, UnitOfWork};
use serde::{Deserialize, Serialize};

use super::TodoItemDto;
use crate::error::{BoxError, NotFound};
use crate::request::{Handler, Request, RequestContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoList {
    pub title: String,

    /// Colour code; white when absent.
    #[serde(default)]
    pub colour: Option<String>,
}

impl Request for CreateTodoList {
    type Response = TodoListId;
    const NAME: &'static str = "CreateTodoList";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoItem {
    pub list_id: TodoListId,
    pub title: String,
}

impl Request for CreateTodoItem {
    type Response = TodoItemId;
    const NAME: &'static str = "CreateTodoItem";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkTodoItemDone {
    pub list_id: TodoListId,
    pub item_id: TodoItemId,
}

impl Request for MarkTodoItemDone {
    type Response = TodoItemDto;
    const NAME: &'static str = "MarkTodoItemDone";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTodoItem {
    pub list_id: TodoListId,
    pub item_id: TodoItemId,
    pub title: String,

    /// Replaces the note when present.
    #[serde(default)]
    pub note: Option<String>,

    /// Priority level name; replaces the priority when present.
    #[serde(default)]
    pub priority: Option<String>,

    /// Replaces the reminder when present.
    #[serde(default)]
    pub reminder: Option<DateTime<Utc>>,
}

impl Request for UpdateTodoItem {
    type Response = TodoItemDto;
    const NAME: &'static str = "UpdateTodoItem";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTodoItem {
    pub list_id: TodoListId,
    pub item_id: TodoItemId,
}

impl Request for DeleteTodoItem {
    type Response = ();
    const NAME: &'static str = "DeleteTodoItem";
}

/// Handles every todo command against the unit of work.
#[derive(Clone)]
pub struct TodoCommands {
    uow: Arc<UnitOfWork>,
}

impl TodoCommands {
    pub fn new(uow: Arc<UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Loads an item, treating an item of another list as missing.
    async fn load_item_in_list(
        &self,
        list_id: TodoListId,
        item_id: TodoItemId,
    ) -> Result<TodoItem, BoxError> {
        match self.uow.store().load_item(item_id).await? {
            Some(item) if item.list_id() == list_id => Ok(item),
            _ => Err(NotFound::new(TodoItem::entity_type(), item_id).into()),
        }
    }
}

#[async_trait]
impl Handler<CreateTodoList> for TodoCommands {
    async fn handle(
        &self,
        request: &CreateTodoList,
        ctx: &RequestContext,
    ) -> Result<TodoListId, BoxError> {
        let colour = match request.colour.as_deref() {
            Some(code) => Colour::from_code(code)?,
            None => Colour::default(),
        };

        let mut list = TodoList::new(&request.title, colour)?;
        self.uow
            .save(ChangeSet::new().add_list(&mut list), ctx.user_id())
            .await?;

        tracing::info!(list_id = %list.id(), "todo list created");
        Ok(list.id())
    }
}

#[async_trait]
impl Handler<CreateTodoItem> for TodoCommands {
    async fn handle(
        &self,
        request: &CreateTodoItem,
        ctx: &RequestContext,
    ) -> Result<TodoItemId, BoxError> {
        if !self.uow.store().list_exists(request.list_id).await? {
            return Err(NotFound::new(TodoList::entity_type(), request.list_id).into());
        }

        let mut item = TodoItem::new(request.list_id, &request.title)?;
        self.uow
            .save(ChangeSet::new().add_item(&mut item), ctx.user_id())
            .await?;

        Ok(item.id())
    }
}

#[async_trait]
impl Handler<MarkTodoItemDone> for TodoCommands {
    async fn handle(
        &self,
        request: &MarkTodoItemDone,
        ctx: &RequestContext,
    ) -> Result<TodoItemDto, BoxError> {
        let mut item = self
            .load_item_in_list(request.list_id, request.item_id)
            .await?;

        item.mark_as_done();
        self.uow
            .save(ChangeSet::new().add_item(&mut item), ctx.user_id())
            .await?;

        Ok(TodoItemDto::from(&item))
    }
}

#[async_trait]
impl Handler<UpdateTodoItem> for TodoCommands {
    async fn handle(
        &self,
        request: &UpdateTodoItem,
        ctx: &RequestContext,
    ) -> Result<TodoItemDto, BoxError> {
        let mut item = self
            .load_item_in_list(request.list_id, request.item_id)
            .await?;

        item.update_title(&request.title)?;
        if let Some(note) = &request.note {
            item.set_note(note.as_str());
        }
        if let Some(priority) = &request.priority {
            item.set_priority(Some(PriorityLevel::from_str(priority)?));
        }
        if request.reminder.is_some() {
            item.set_reminder(request.reminder);
        }

        self.uow
            .save(ChangeSet::new().add_item(&mut item), ctx.user_id())
            .await?;

        Ok(TodoItemDto::from(&item))
    }
}

#[async_trait]
impl Handler<DeleteTodoItem> for TodoCommands {
    async fn handle(&self, request: &DeleteTodoItem, ctx: &RequestContext) -> Result<(), BoxError> {
        let item = self
            .load_item_in_list(request.list_id, request.item_id)
            .await?;

        self.uow
            .save(ChangeSet::new().delete_item(item.id()), ctx.user_id())
            .await?;

        tracing::info!(item_id = %item.id(), "todo item deleted");
        Ok(())
    }
}
