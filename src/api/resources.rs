/// Resource procurement endpoints
///
/// Responses carry the derived `total_cost` and `delivery_overdue` fields.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    resource::{CreateResource, ResourceFilter, ResourceStatusChange, UpdateResource},
    Resource, ResourceView, User,
};
use crate::error::ServiceResult;

pub fn create_resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/projects/{id}/resources",
            get(list_resources).post(create_resource),
        )
        .route(
            "/api/resources/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route("/api/resources/{id}/status", put(change_status))
}

fn view(resource: Resource) -> ResourceView {
    ResourceView::new(resource, Utc::now().date_naive())
}

/// GET /api/projects/{id}/resources?status=ordered&overdue=true
async fn list_resources(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Query(filter): Query<ResourceFilter>,
) -> ServiceResult<Json<Vec<ResourceView>>> {
    state.owned_project(project_id, &user).await?;
    let today = Utc::now().date_naive();
    let resources = state.services.resources.list(project_id, &filter, today).await?;
    Ok(Json(
        resources
            .into_iter()
            .map(|r| ResourceView::new(r, today))
            .collect(),
    ))
}

async fn create_resource(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateResource>,
) -> ServiceResult<(StatusCode, Json<ResourceView>)> {
    state.owned_project(project_id, &user).await?;
    let resource = state.services.resources.create(project_id, payload).await?;
    Ok(created(view(resource)))
}

async fn get_resource(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ResourceView>> {
    Ok(Json(view(owned_resource(&state, id, &user).await?)))
}

async fn update_resource(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResource>,
) -> ServiceResult<Json<ResourceView>> {
    owned_resource(&state, id, &user).await?;
    Ok(Json(view(state.services.resources.update(id, payload).await?)))
}

/// PUT /api/resources/{id}/status
/// Body: { "status": "ordered", "expected_delivery": "2026-06-01" }
async fn change_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResourceStatusChange>,
) -> ServiceResult<Json<ResourceView>> {
    owned_resource(&state, id, &user).await?;
    let resource = state
        .services
        .resources
        .set_status(id, payload.status, payload.expected_delivery)
        .await?;
    Ok(Json(view(resource)))
}

async fn delete_resource(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    owned_resource(&state, id, &user).await?;
    state.services.resources.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_resource(state: &AppState, id: Uuid, user: &User) -> ServiceResult<Resource> {
    let resource = state.services.resources.get(id).await?;
    state.owned_project(resource.project_id, user).await?;
    Ok(resource)
}
