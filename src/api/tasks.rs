/// Task endpoints, including bulk creation from work item templates

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    task::{CreateTask, TaskFilter, TasksFromTemplates, UpdateTask},
    Task, User,
};
use crate::error::ServiceResult;

pub fn create_task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/{id}/tasks", get(list_tasks).post(create_task))
        .route("/api/projects/{id}/tasks/from-templates", post(create_from_templates))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

/// GET /api/projects/{id}/tasks?status=todo&milestone_id=...&assignee_id=...&search=...
async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Query(filter): Query<TaskFilter>,
) -> ServiceResult<Json<Vec<Task>>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.tasks.list(project_id, &filter).await?))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateTask>,
) -> ServiceResult<(StatusCode, Json<Task>)> {
    state.owned_project(project_id, &user).await?;
    Ok(created(state.services.tasks.create(project_id, payload).await?))
}

/// POST /api/projects/{id}/tasks/from-templates
/// Body: { "template_ids": [...], "milestone_id": null, "start_date": "2026-05-04" }
async fn create_from_templates(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<TasksFromTemplates>,
) -> ServiceResult<(StatusCode, Json<Vec<Task>>)> {
    state.owned_project(project_id, &user).await?;
    let templates = state.templates.resolve(&payload.template_ids, user.id)?;
    let tasks = state
        .services
        .tasks
        .create_from_templates(project_id, &templates, payload.milestone_id, payload.start_date)
        .await?;
    Ok(created(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Task>> {
    Ok(Json(owned_task(&state, id, &user).await?))
}

async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTask>,
) -> ServiceResult<Json<Task>> {
    owned_task(&state, id, &user).await?;
    Ok(Json(state.services.tasks.update(id, payload).await?))
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    owned_task(&state, id, &user).await?;
    state.services.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_task(state: &AppState, id: Uuid, user: &User) -> ServiceResult<Task> {
    let task = state.services.tasks.get(id).await?;
    state.owned_project(task.project_id, user).await?;
    Ok(task)
}
