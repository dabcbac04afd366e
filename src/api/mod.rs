/// HTTP API Layer
///
/// REST endpoints for projects and everything hanging off them. It handles:
/// - Session login/logout against the identity provider
/// - Project-scoped CRUD with ownership checks
/// - Multipart uploads and downloads for documents and photos

// Login, current user and logout
pub mod auth;

// Budget view, recalculation and budget items
pub mod budget;

// Document upload/download
pub mod documents;

// Milestones and their status transitions
pub mod milestones;

// Photo upload/download and captions
pub mod photos;

// Projects, progress and the PDF report
pub mod projects;

// Resource procurement
pub mod resources;

// Supplier address book
pub mod suppliers;

// Tasks and template expansion
pub mod tasks;

// Work item templates
pub mod templates;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{require_session, IdentityProvider};
use crate::config::Config;
use crate::domain::{Project, User};
use crate::error::ServiceResult;
use crate::runtime::SweepScheduler;
use crate::services::{Services, TemplateCatalog};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Resolves provider access tokens at login
    pub identity: Arc<dyn IdentityProvider>,
    /// In-memory template snapshot
    pub templates: Arc<TemplateCatalog>,
    /// Background overdue sweep, `None` when disabled
    pub sweep: Option<Arc<SweepScheduler>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Load a project the current user owns (404 missing, 403 foreign)
    pub async fn owned_project(&self, project_id: Uuid, user: &User) -> ServiceResult<Project> {
        self.services.projects.ensure_owner(project_id, user.id).await
    }
}

/// Build every API route; everything except login and health requires a session
pub fn create_api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::create_session_routes())
        .merge(projects::create_project_routes())
        .merge(milestones::create_milestone_routes())
        .merge(tasks::create_task_routes())
        .merge(budget::create_budget_routes())
        .merge(documents::create_document_routes())
        .merge(photos::create_photo_routes())
        .merge(resources::create_resource_routes())
        .merge(suppliers::create_supplier_routes())
        .merge(templates::create_template_routes())
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/healthz", get(health))
        .merge(auth::create_login_routes())
        .merge(protected)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 201 with the created entity as JSON
pub(crate) fn created<T: serde::Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

/// Binary download served inline under its original file name
pub(crate) fn file_response(bytes: Vec<u8>, mime_type: &str, file_name: &str) -> Response {
    let disposition = format!(
        "inline; filename=\"{}\"",
        crate::storage::sanitize_file_name(file_name)
    );
    (
        [
            (header::CONTENT_TYPE, mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}
