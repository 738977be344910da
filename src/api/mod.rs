// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        CreateFileRequest, FileListItem, FileResponse, ImportFileEntry, ImportRequest,
        ImportResponse, ReorderRequest, ReorderResponse, RestoreVersionRequest, SaveFileRequest,
        SaveFileResponse, UpdateFileRequest, VersionContentResponse,
    },
    state::AppState,
    storage::{EditorResult, FileRepository, VersionSummary},
};

pub mod files;
pub mod health;
pub mod history;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health (no auth)
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Files
        .route("/files", get(files::list_files).post(files::create_file))
        .route("/files/trash", get(files::list_trash))
        .route("/files/reorder", post(files::reorder_files))
        .route("/files/import", post(files::import_files))
        .route(
            "/files/{file_id}",
            get(files::get_file)
                .put(files::update_file)
                .delete(files::delete_file),
        )
        .route("/files/{file_id}/save", post(files::save_file))
        .route("/files/{file_id}/restore", post(files::restore_file))
        .route("/files/{file_id}/duplicate", post(files::duplicate_file))
        .route("/files/{file_id}/export", get(files::export_file))
        // History
        .route("/history/{file_id}/versions", get(history::list_versions))
        .route(
            "/history/{file_id}/versions/{version_id}",
            get(history::get_version_content),
        )
        .route("/history/{file_id}/restore", post(history::restore_version))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

/// Run a repository call on the blocking pool.
///
/// redb transactions do synchronous disk I/O and must stay off the async
/// worker threads.
pub(crate) async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&FileRepository) -> EditorResult<T> + Send + 'static,
    T: Send + 'static,
{
    let files: Arc<FileRepository> = state.files.clone();
    tokio::task::spawn_blocking(move || op(&files))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Blocking repository task failed");
            ApiError::internal("Internal error")
        })?
        .map_err(ApiError::from)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        files::list_files,
        files::list_trash,
        files::create_file,
        files::get_file,
        files::update_file,
        files::delete_file,
        files::save_file,
        files::restore_file,
        files::duplicate_file,
        files::export_file,
        files::reorder_files,
        files::import_files,
        history::list_versions,
        history::get_version_content,
        history::restore_version
    ),
    components(
        schemas(
            FileListItem,
            FileResponse,
            CreateFileRequest,
            UpdateFileRequest,
            SaveFileRequest,
            SaveFileResponse,
            ReorderRequest,
            ReorderResponse,
            ImportFileEntry,
            ImportRequest,
            ImportResponse,
            VersionSummary,
            VersionContentResponse,
            RestoreVersionRequest,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Files", description = "Encrypted file management"),
        (name = "History", description = "Version history and restore")
    )
)]
struct ApiDoc;

#[cfg(test)]
pub(crate) fn test_user() -> crate::auth::Auth {
    crate::auth::Auth(crate::auth::AuthenticatedUser {
        user_id: "user_test".to_string(),
        expires_at: i64::MAX,
    })
}
