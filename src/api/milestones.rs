/// Milestone endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    milestone::{CreateMilestone, MilestoneStatusChange, UpdateMilestone},
    Milestone, User,
};
use crate::error::ServiceResult;

/// Milestone with the completion percentage of its tasks
#[derive(Debug, Serialize)]
pub struct MilestoneDetail {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub percent_complete: f64,
}

pub fn create_milestone_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/projects/{id}/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route(
            "/api/milestones/{id}",
            get(get_milestone).put(update_milestone).delete(delete_milestone),
        )
        .route("/api/milestones/{id}/status", put(change_status))
}

async fn list_milestones(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
) -> ServiceResult<Json<Vec<Milestone>>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.milestones.list(project_id).await?))
}

async fn create_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateMilestone>,
) -> ServiceResult<(StatusCode, Json<Milestone>)> {
    state.owned_project(project_id, &user).await?;
    Ok(created(state.services.milestones.create(project_id, payload).await?))
}

async fn get_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<MilestoneDetail>> {
    let milestone = owned_milestone(&state, id, &user).await?;
    let percent_complete = state.services.milestones.progress(id).await?;
    Ok(Json(MilestoneDetail {
        milestone,
        percent_complete,
    }))
}

async fn update_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMilestone>,
) -> ServiceResult<Json<Milestone>> {
    owned_milestone(&state, id, &user).await?;
    Ok(Json(state.services.milestones.update(id, payload).await?))
}

/// PUT /api/milestones/{id}/status
/// Body: { "status": "completed" }
async fn change_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MilestoneStatusChange>,
) -> ServiceResult<Json<Milestone>> {
    owned_milestone(&state, id, &user).await?;
    Ok(Json(state.services.milestones.set_status(id, payload.status).await?))
}

async fn delete_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    owned_milestone(&state, id, &user).await?;
    state.services.milestones.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_milestone(state: &AppState, id: Uuid, user: &User) -> ServiceResult<Milestone> {
    let milestone = state.services.milestones.get(id).await?;
    state.owned_project(milestone.project_id, user).await?;
    Ok(milestone)
}
