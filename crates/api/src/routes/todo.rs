//! Todo list and item endpoints.

use std::sync::Arc;

use application::todo::{
    CreateTodoItem, CreateTodoList, DeleteTodoItem, GetTodoItemsInList, GetTodoLists,
    MarkTodoItemDone, TodoItemDto, TodoListDto, UpdateTodoItem,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{TodoItemId, TodoListId};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateTodoListRequest {
    pub title: String,
    pub colour: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTodoItemRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateTodoItemRequest {
    pub title: String,
    pub note: Option<String>,
    pub priority: Option<String>,
    pub reminder: Option<DateTime<Utc>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreatedResponse<T> {
    pub id: T,
}

// -- Handlers --

/// GET /todolists
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<TodoListDto>>, ApiError> {
    let lists = state.mediator.send(GetTodoLists, &ctx).await?;
    Ok(Json(lists))
}

/// POST /todolists
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    body: Result<Json<CreateTodoListRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<TodoListId>>), ApiError> {
    let Json(req) = body?;
    let id = state
        .mediator
        .send(
            CreateTodoList {
                title: req.title,
                colour: req.colour,
            },
            &ctx,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /todolists/{list_id}/todoitems
#[tracing::instrument(skip_all)]
pub async fn items(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    path: Result<Path<TodoListId>, PathRejection>,
) -> Result<Json<Vec<TodoItemDto>>, ApiError> {
    let Path(list_id) = path?;
    let items = state
        .mediator
        .send(GetTodoItemsInList { list_id }, &ctx)
        .await?;
    Ok(Json(items))
}

/// POST /todolists/{list_id}/todoitems
#[tracing::instrument(skip_all)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    path: Result<Path<TodoListId>, PathRejection>,
    body: Result<Json<CreateTodoItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<TodoItemId>>), ApiError> {
    let Path(list_id) = path?;
    let Json(req) = body?;
    let id = state
        .mediator
        .send(
            CreateTodoItem {
                list_id,
                title: req.title,
            },
            &ctx,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /todolists/{list_id}/todoitems/{item_id}
#[tracing::instrument(skip_all)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    path: Result<Path<(TodoListId, TodoItemId)>, PathRejection>,
    body: Result<Json<UpdateTodoItemRequest>, JsonRejection>,
) -> Result<Json<TodoItemDto>, ApiError> {
    let Path((list_id, item_id)) = path?;
    let Json(req) = body?;
    let item = state
        .mediator
        .send(
            UpdateTodoItem {
                list_id,
                item_id,
                title: req.title,
                note: req.note,
                priority: req.priority,
                reminder: req.reminder,
            },
            &ctx,
        )
        .await?;
    Ok(Json(item))
}

/// PUT /todolists/{list_id}/todoitems/{item_id}/markdone
#[tracing::instrument(skip_all)]
pub async fn mark_done(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    path: Result<Path<(TodoListId, TodoItemId)>, PathRejection>,
) -> Result<Json<TodoItemDto>, ApiError> {
    let Path((list_id, item_id)) = path?;
    let item = state
        .mediator
        .send(MarkTodoItemDone { list_id, item_id }, &ctx)
        .await?;
    Ok(Json(item))
}

/// DELETE /todolists/{list_id}/todoitems/{item_id}
#[tracing::instrument(skip_all)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    path: Result<Path<(TodoListId, TodoItemId)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((list_id, item_id)) = path?;
    state
        .mediator
        .send(DeleteTodoItem { list_id, item_id }, &ctx)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
