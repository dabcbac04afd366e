/// Project REST endpoints, progress summary and PDF report

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::{created, file_response, AppState};
use crate::domain::{
    project::{CreateProject, ProjectFilter, UpdateProject},
    ProgressSummary, Project, User,
};
use crate::error::ServiceResult;
use crate::export::{render_project_report, ProjectReport};

pub fn create_project_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/progress", get(project_progress))
        .route("/api/projects/{id}/report.pdf", get(project_report))
}

/// GET /api/projects?status=active&search=kitchen
async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filter): Query<ProjectFilter>,
) -> ServiceResult<Json<Vec<Project>>> {
    Ok(Json(state.services.projects.list(user.id, &filter).await?))
}

/// POST /api/projects
async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateProject>,
) -> ServiceResult<(StatusCode, Json<Project>)> {
    let project = state.services.projects.create(user.id, payload).await?;
    Ok(created(project))
}

async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Project>> {
    Ok(Json(state.owned_project(id, &user).await?))
}

async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> ServiceResult<Json<Project>> {
    state.owned_project(id, &user).await?;
    Ok(Json(state.services.projects.update(id, payload).await?))
}

async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.owned_project(id, &user).await?;
    state.services.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{id}/progress
async fn project_progress(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ProgressSummary>> {
    state.owned_project(id, &user).await?;
    let today = Utc::now().date_naive();
    Ok(Json(state.services.projects.progress(id, today).await?))
}

/// GET /api/projects/{id}/report.pdf
async fn project_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Response> {
    let project = state.owned_project(id, &user).await?;
    let file_name = format!("{}-report.pdf", project.name);
    let report = ProjectReport::collect(&state.services, project, Utc::now().date_naive()).await?;

    // printpdf is synchronous and allocation heavy
    let bytes = tokio::task::spawn_blocking(move || render_project_report(&report))
        .await
        .map_err(anyhow::Error::from)??;

    tracing::info!("🧾 Exported report for project {}", id);
    Ok(file_response(bytes, "application/pdf", &file_name))
}
