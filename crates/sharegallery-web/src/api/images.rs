use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use sharegallery_core::content_type_for;

use super::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images))
        .route("/image/{id}", get(get_image))
        .route("/thumbnail/{id}", get(get_thumbnail))
}

async fn list_images(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.gallery.list().into_iter().map(String::from).collect())
}

async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.gallery.get_original(&id).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&id))], bytes))
}

async fn get_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.gallery.get_thumbnail(&id).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&id))], bytes))
}
