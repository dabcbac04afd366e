/// Supplier address book endpoints (scoped to the current user)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::api::{created, AppState};
use crate::domain::{
    supplier::{CreateSupplier, SupplierFilter, UpdateSupplier},
    Supplier, User,
};
use crate::error::ServiceResult;

pub fn create_supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/api/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

/// GET /api/suppliers?search=tile&category=flooring
async fn list_suppliers(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filter): Query<SupplierFilter>,
) -> ServiceResult<Json<Vec<Supplier>>> {
    Ok(Json(state.services.suppliers.list(user.id, &filter).await?))
}

async fn create_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateSupplier>,
) -> ServiceResult<(StatusCode, Json<Supplier>)> {
    Ok(created(state.services.suppliers.create(user.id, payload).await?))
}

async fn get_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Supplier>> {
    Ok(Json(state.services.suppliers.get_owned(id, user.id).await?))
}

async fn update_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplier>,
) -> ServiceResult<Json<Supplier>> {
    state.services.suppliers.get_owned(id, user.id).await?;
    Ok(Json(state.services.suppliers.update(id, payload).await?))
}

async fn delete_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.services.suppliers.get_owned(id, user.id).await?;
    state.services.suppliers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
