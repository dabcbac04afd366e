/// Budget endpoints
///
/// The budget itself is read-only: its totals change through budget items
/// and priced tasks, or through an explicit recalculation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    budget::{CreateBudgetItem, UpdateBudgetItem},
    BudgetItem, BudgetView, User,
};
use crate::error::ServiceResult;

pub fn create_budget_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/{id}/budget", get(get_budget))
        .route("/api/projects/{id}/budget/recalculate", post(recalculate))
        .route("/api/projects/{id}/budget/items", get(list_items).post(add_item))
        .route("/api/budget-items/{id}", put(update_item).delete(delete_item))
}

/// GET /api/projects/{id}/budget
/// Returns totals plus `variance_percent`, `alert` and `remaining`
async fn get_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
) -> ServiceResult<Json<BudgetView>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.budget.get(project_id).await?))
}

async fn recalculate(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
) -> ServiceResult<Json<BudgetView>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.budget.recalculate(project_id).await?))
}

async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
) -> ServiceResult<Json<Vec<BudgetItem>>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.budget.list_items(project_id).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateBudgetItem>,
) -> ServiceResult<(StatusCode, Json<BudgetItem>)> {
    state.owned_project(project_id, &user).await?;
    Ok(created(state.services.budget.add_item(project_id, payload).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBudgetItem>,
) -> ServiceResult<Json<BudgetItem>> {
    let project_id = state.services.budget.item_project(id).await?;
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.budget.update_item(id, payload).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    let project_id = state.services.budget.item_project(id).await?;
    state.owned_project(project_id, &user).await?;
    state.services.budget.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
