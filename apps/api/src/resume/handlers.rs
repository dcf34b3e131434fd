use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::document::info::ResumeInfo;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resume::service::UploadedResume;
use crate::state::AppState;

/// Multipart field carrying the document.
const UPLOAD_FIELD: &str = "resume";

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/resumes/upload?user_id=
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedResume>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("the resume field has no file name".into()))?;
        let data = field.bytes().await.map_err(multipart_error)?;

        let uploaded = state
            .resumes
            .upload(params.user_id, &file_name, data)
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::Validation(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UnsupportedInput(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}

/// GET /api/v1/resumes?user_id=
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(state.resumes.list_for_user(params.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(state.resumes.get(id).await?))
}

/// DELETE /api/v1/resumes/:id?user_id=
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.resumes.delete(id, params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/info
pub async fn handle_resume_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeInfo>, AppError> {
    Ok(Json(state.resumes.info(id).await?))
}
