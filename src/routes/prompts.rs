//! Prompts API routes
//!
//! CRUD plus search and grouped views over the caller's prompt notebook.
//! Every route requires an authenticated actor.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::{
    filter_prompts, group_by_collection, group_by_tag, Prompt, PromptFilters, PromptRepository,
    SavePrompt,
};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the prompts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prompts).post(create_prompt))
        .route("/grouped", get(grouped_prompts))
        .route(
            "/:id",
            get(get_prompt).put(update_prompt).delete(delete_prompt),
        )
}

/// List the caller's prompts, optionally filtered
async fn list_prompts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filters): Query<PromptFilters>,
) -> Result<Json<Vec<Prompt>>> {
    let repo = PromptRepository::new(state.db());
    let prompts = repo.list_for_user(&user.user_id).await?;
    Ok(Json(filter_prompts(&prompts, &filters)))
}

/// Create (or upsert, when the client supplies an id) a prompt
async fn create_prompt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(data): Json<SavePrompt>,
) -> Result<(StatusCode, Json<Prompt>)> {
    let repo = PromptRepository::new(state.db());
    let prompt = repo.save(&user.user_id, &data).await?;
    Ok((StatusCode::CREATED, Json(prompt)))
}

/// Get a prompt by id
async fn get_prompt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Prompt>> {
    let repo = PromptRepository::new(state.db());
    let prompt = repo
        .get(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt not found: {}", id)))?;
    Ok(Json(prompt))
}

/// Update a prompt in place
async fn update_prompt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(mut data): Json<SavePrompt>,
) -> Result<Json<Prompt>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest(format!("Invalid prompt id: {}", id)))?;

    let repo = PromptRepository::new(state.db());
    repo.get(&user.user_id, &id.to_string())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt not found: {}", id)))?;

    data.id = Some(id);
    let prompt = repo.save(&user.user_id, &data).await?;
    Ok(Json(prompt))
}

/// Delete a prompt; its tags cascade
async fn delete_prompt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let repo = PromptRepository::new(state.db());
    repo.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    /// `collection` (default) or `tag`
    #[serde(default)]
    by: Option<String>,
}

/// Grouped view for sidebar-style navigation
async fn grouped_prompts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<GroupQuery>,
) -> Result<Json<BTreeMap<String, Vec<Prompt>>>> {
    let repo = PromptRepository::new(state.db());
    let prompts = repo.list_for_user(&user.user_id).await?;

    let groups = match query.by.as_deref() {
        Some("tag") => group_by_tag(&prompts),
        _ => group_by_collection(&prompts),
    };

    Ok(Json(groups))
}
