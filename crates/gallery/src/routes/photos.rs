use api_types::{Photo, PhotoResponse, format_size};
use axum::{
    Json, Router,
    extract::{Multipart, Path, State, rejection::PathRejection},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use super::error::RouteError;
use crate::{AppState, photos::PhotoUpload};

/// Field carrying any number of files.
const MULTI_FILE_FIELD: &str = "images";
/// Field carrying a single file, used only when no `images` parts are present.
const SINGLE_FILE_FIELD: &str = "image";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos", get(list_photos).post(create_photos))
        .route("/photos/{id}", get(get_photo).delete(delete_photo))
}

pub fn photo_response(state: &AppState, photo: Photo) -> PhotoResponse {
    let image_url = state.blob_url(&photo.original_path);
    let thumbnail_url = photo
        .thumbnail_path
        .as_deref()
        .map(|path| state.blob_url(path))
        .unwrap_or_default();

    PhotoResponse {
        id: photo.id,
        user: photo.owner_id,
        name: photo.name,
        created_at: photo.created_at,
        image: photo.original_path,
        image_url,
        thumbnail_url,
        size: format_size(photo.size_bytes),
    }
}

#[instrument(name = "photos.list", skip(state))]
async fn list_photos(State(state): State<AppState>) -> Result<Json<Vec<PhotoResponse>>, RouteError> {
    let photos = state.photos().list_recent().await?;
    let body = photos
        .into_iter()
        .map(|photo| photo_response(&state, photo))
        .collect();
    Ok(Json(body))
}

/// Pull the uploaded files out of the form. `images` parts win over `image`;
/// parts without a filename, or with an empty one (a file input left blank),
/// are skipped.
async fn collect_uploads(mut multipart: Multipart) -> Result<Vec<PhotoUpload>, RouteError> {
    let mut multi = Vec::new();
    let mut single = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != MULTI_FILE_FIELD && field_name != SINGLE_FILE_FIELD {
            continue;
        }
        let Some(filename) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let data = field.bytes().await?;
        let upload = PhotoUpload::new(filename, data);

        if field_name == MULTI_FILE_FIELD {
            multi.push(upload);
        } else if single.is_none() {
            single = Some(upload);
        }
    }

    if multi.is_empty() {
        Ok(single.into_iter().collect())
    } else {
        Ok(multi)
    }
}

#[instrument(name = "photos.create_batch", skip(state, multipart))]
async fn create_photos(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<PhotoResponse>>), RouteError> {
    let uploads = collect_uploads(multipart).await?;
    if uploads.is_empty() {
        return Err(RouteError::Validation("No image uploaded."));
    }

    let requested = uploads.len();
    let created = state.photos().create_batch(uploads).await;
    tracing::info!(requested, created = created.len(), "Processed photo upload");

    let body = created
        .into_iter()
        .map(|photo| photo_response(&state, photo))
        .collect();
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(name = "photos.get", skip(state))]
async fn get_photo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PhotoResponse>, RouteError> {
    let Path(id) = id?;
    let photo = state.photos().find(id).await?;
    Ok(Json(photo_response(&state, photo)))
}

#[instrument(name = "photos.delete", skip(state))]
async fn delete_photo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, RouteError> {
    let Path(id) = id?;
    state.photos().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
