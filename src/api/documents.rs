/// Document endpoints: multipart upload, listing and download

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{created, file_response, AppState};
use crate::domain::{document::NewDocument, Document, DocumentKind, User};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    pub kind: Option<DocumentKind>,
}

pub fn create_document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/projects/{id}/documents",
            get(list_documents).post(upload_document),
        )
        .route("/api/documents/{id}", get(get_document).delete(delete_document))
        .route("/api/documents/{id}/content", get(download_document))
}

async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<DocumentQuery>,
) -> ServiceResult<Json<Vec<Document>>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.documents.list(project_id, query.kind).await?))
}

/// POST /api/projects/{id}/documents (multipart)
/// Fields: `file` (required), `name` (defaults to the file name), `kind`
async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    multipart: Multipart,
) -> ServiceResult<(StatusCode, Json<Document>)> {
    state.owned_project(project_id, &user).await?;
    let upload = read_document_upload(multipart).await?;
    let document = state.services.documents.upload(project_id, user.id, upload).await?;
    Ok(created(document))
}

async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Document>> {
    Ok(Json(owned_document(&state, id, &user).await?))
}

async fn download_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Response> {
    let document = owned_document(&state, id, &user).await?;
    let bytes = state.services.documents.read_content(&document).await?;
    Ok(file_response(bytes, &document.mime_type, &document.name))
}

async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    owned_document(&state, id, &user).await?;
    state.services.documents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_document(state: &AppState, id: Uuid, user: &User) -> ServiceResult<Document> {
    let document = state.services.documents.get(id).await?;
    state.owned_project(document.project_id, user).await?;
    Ok(document)
}

async fn read_document_upload(mut multipart: Multipart) -> ServiceResult<NewDocument> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut name = None;
    let mut kind = DocumentKind::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("name") => name = Some(field.text().await.map_err(multipart_error)?),
            Some("kind") => {
                let raw = field.text().await.map_err(multipart_error)?;
                kind = raw
                    .trim()
                    .parse()
                    .map_err(|_| ServiceError::validation(format!("unknown document kind '{raw}'")))?;
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ServiceError::validation("missing 'file' field"))?;
    Ok(NewDocument {
        name: name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| file_name.clone()),
        file_name,
        kind,
        content_type,
        bytes,
    })
}

pub(crate) fn multipart_error(e: MultipartError) -> ServiceError {
    ServiceError::validation(e.body_text())
}
