// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use super::run_blocking;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{FileResponse, RestoreVersionRequest, VersionContentResponse},
    state::AppState,
    storage::VersionSummary,
};

#[utoipa::path(
    get,
    path = "/api/history/{file_id}/versions",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "History",
    responses(
        (status = 200, description = "Versions, newest first", body = [VersionSummary]),
        (status = 404, description = "File not found")
    )
)]
pub async fn list_versions(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<VersionSummary>>, ApiError> {
    let versions = run_blocking(&state, move |repo| repo.list_versions(&file_id)).await?;
    Ok(Json(versions))
}

#[utoipa::path(
    get,
    path = "/api/history/{file_id}/versions/{version_id}",
    params(
        ("file_id" = String, Path, description = "File identifier"),
        ("version_id" = String, Path, description = "Version identifier")
    ),
    tag = "History",
    responses(
        (status = 200, body = VersionContentResponse),
        (status = 404, description = "Version not found for this file")
    )
)]
pub async fn get_version_content(
    Auth(_user): Auth,
    Path((file_id, version_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<VersionContentResponse>, ApiError> {
    let content = run_blocking(&state, move |repo| {
        repo.read_file_version_content(&file_id, &version_id)
    })
    .await?;
    Ok(Json(VersionContentResponse { content }))
}

#[utoipa::path(
    post,
    path = "/api/history/{file_id}/restore",
    params(("file_id" = String, Path, description = "File identifier")),
    request_body = RestoreVersionRequest,
    tag = "History",
    responses(
        (status = 200, description = "File with the restored content", body = FileResponse),
        (status = 404, description = "File or version not found")
    )
)]
pub async fn restore_version(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RestoreVersionRequest>,
) -> Result<Json<FileResponse>, ApiError> {
    let response = run_blocking(&state, move |repo| {
        let outcome = repo.restore_version(&file_id, &request.version_id)?;
        let content = repo.content(&outcome.file)?;
        Ok(FileResponse::new(outcome.file, content))
    })
    .await?;
    Ok(Json(response))
}
