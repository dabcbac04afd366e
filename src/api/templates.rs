/// Work item template endpoints
///
/// Reads come from the in-memory catalog; every write reloads the changed
/// template into it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    template::{CreateTemplate, UpdateTemplate},
    User, WorkItemTemplate,
};
use crate::error::ServiceResult;

pub fn create_template_routes() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/{id}", put(update_template).delete(delete_template))
}

/// GET /api/templates
/// Built-in defaults plus the caller's own templates
async fn list_templates(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<Vec<WorkItemTemplate>> {
    Json(state.templates.visible_to(user.id))
}

async fn create_template(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTemplate>,
) -> ServiceResult<(StatusCode, Json<WorkItemTemplate>)> {
    let template = state.services.templates.create(user.id, payload).await?;
    state.templates.reload_template(template.id).await?;
    Ok(created(template))
}

async fn update_template(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplate>,
) -> ServiceResult<Json<WorkItemTemplate>> {
    let template = state.services.templates.update(id, user.id, payload).await?;
    state.templates.reload_template(id).await?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.services.templates.delete(id, user.id).await?;
    state.templates.reload_template(id).await?;
    tracing::info!("🗑️ Deleted template {}", id);
    Ok(StatusCode::NO_CONTENT)
}
