//! Todo queries and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use common::TodoListId;
use domain::{Entity, TodoList};
use persistence::{TodoStore, TodoStoreExt};
use serde::{Deserialize, Serialize};

use super::{TodoItemDto, TodoListDto};
use crate::error::{BoxError, NotFound};
use crate::request::{Handler, Request, RequestContext};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetTodoLists;

impl Request for GetTodoLists {
    type Response = Vec<TodoListDto>;
    const NAME: &'static str = "GetTodoLists";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetTodoItemsInList {
    pub list_id: TodoListId,
}

impl Request for GetTodoItemsInList {
    type Response = Vec<TodoItemDto>;
    const NAME: &'static str = "GetTodoItemsInList";
}

/// Answers todo queries straight from the store.
#[derive(Clone)]
pub struct TodoQueries {
    store: Arc<dyn TodoStore>,
}

impl TodoQueries {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetTodoLists> for TodoQueries {
    async fn handle(
        &self,
        _request: &GetTodoLists,
        _ctx: &RequestContext,
    ) -> Result<Vec<TodoListDto>, BoxError> {
        let lists = self.store.all_lists().await?;
        Ok(lists.into_iter().map(TodoListDto::from).collect())
    }
}

#[async_trait]
impl Handler<GetTodoItemsInList> for TodoQueries {
    async fn handle(
        &self,
        request: &GetTodoItemsInList,
        _ctx: &RequestContext,
    ) -> Result<Vec<TodoItemDto>, BoxError> {
        if !self.store.list_exists(request.list_id).await? {
            return Err(NotFound::new(TodoList::entity_type(), request.list_id).into());
        }

        let items = self.store.items_in_list(request.list_id).await?;
        Ok(items.into_iter().map(TodoItemDto::from).collect())
    }
}
