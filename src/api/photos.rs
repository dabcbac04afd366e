/// Photo endpoints: multipart upload, captions and download

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Json, Response},
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::api::{created, documents::multipart_error, file_response, AppState};
use crate::domain::{
    photo::{NewPhoto, UpdatePhoto},
    Photo, User,
};
use crate::error::{ServiceError, ServiceResult};

pub fn create_photo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/{id}/photos", get(list_photos).post(upload_photo))
        .route(
            "/api/photos/{id}",
            get(get_photo).put(update_photo).delete(delete_photo),
        )
        .route("/api/photos/{id}/content", get(download_photo))
}

async fn list_photos(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
) -> ServiceResult<Json<Vec<Photo>>> {
    state.owned_project(project_id, &user).await?;
    Ok(Json(state.services.photos.list(project_id).await?))
}

/// POST /api/projects/{id}/photos (multipart)
/// Fields: `file` (required), `caption`, `area`
async fn upload_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ServiceResult<(StatusCode, Json<Photo>)> {
    state.owned_project(project_id, &user).await?;

    let mut upload: Option<NewPhoto> = None;
    let mut caption = None;
    let mut area = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(NewPhoto {
                    file_name,
                    caption: None,
                    area: None,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("caption") => caption = Some(field.text().await.map_err(multipart_error)?),
            Some("area") => area = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let mut upload = upload.ok_or_else(|| ServiceError::validation("missing 'file' field"))?;
    upload.caption = caption;
    upload.area = area;

    let photo = state.services.photos.upload(project_id, user.id, upload).await?;
    Ok(created(photo))
}

async fn get_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<Photo>> {
    Ok(Json(owned_photo(&state, id, &user).await?))
}

async fn update_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePhoto>,
) -> ServiceResult<Json<Photo>> {
    owned_photo(&state, id, &user).await?;
    Ok(Json(state.services.photos.update(id, payload).await?))
}

async fn download_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Response> {
    let photo = owned_photo(&state, id, &user).await?;
    let bytes = state.services.photos.read_content(&photo).await?;
    Ok(file_response(bytes, &photo.mime_type, &photo.file_name))
}

async fn delete_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    owned_photo(&state, id, &user).await?;
    state.services.photos.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_photo(state: &AppState, id: Uuid, user: &User) -> ServiceResult<Photo> {
    let photo = state.services.photos.get(id).await?;
    state.owned_project(photo.project_id, user).await?;
    Ok(photo)
}
