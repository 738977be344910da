// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::run_blocking;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        CreateFileRequest, FileListItem, FileResponse, ImportRequest, ImportResponse,
        ReorderRequest, ReorderResponse, SaveFileRequest, SaveFileResponse, UpdateFileRequest,
    },
    state::AppState,
    storage::{FileMetadataUpdate, ImportEntry, NewFile},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Include trashed files in the listing.
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeleteFileQuery {
    /// Delete the file and its history for good instead of trashing it.
    #[serde(default)]
    pub permanent: bool,
}

#[utoipa::path(
    get,
    path = "/api/files",
    params(ListFilesQuery),
    tag = "Files",
    responses(
        (status = 200, body = [FileListItem]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_files(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Query(params): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileListItem>>, ApiError> {
    let files = run_blocking(&state, move |repo| repo.list(params.include_deleted)).await?;
    Ok(Json(files.iter().map(FileListItem::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/files/trash",
    tag = "Files",
    responses((status = 200, body = [FileListItem]))
)]
pub async fn list_trash(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<FileListItem>>, ApiError> {
    let files = run_blocking(&state, |repo| repo.list_trash()).await?;
    Ok(Json(files.iter().map(FileListItem::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/files",
    request_body = CreateFileRequest,
    tag = "Files",
    responses(
        (status = 201, body = FileResponse),
        (status = 400, description = "Empty name or path")
    )
)]
pub async fn create_file(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateFileRequest>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let content = request.content.clone();
    let mut new = NewFile::new(request.name, request.path, request.content);
    if let Some(language) = request.language.filter(|l| !l.trim().is_empty()) {
        new = new.with_language(language);
    }

    let file = run_blocking(&state, move |repo| repo.create(new)).await?;
    Ok((StatusCode::CREATED, Json(FileResponse::new(file, content))))
}

#[utoipa::path(
    get,
    path = "/api/files/{file_id}",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    responses(
        (status = 200, body = FileResponse),
        (status = 404, description = "File not found or trashed")
    )
)]
pub async fn get_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FileResponse>, ApiError> {
    let response = run_blocking(&state, move |repo| {
        let file = repo.get(&file_id)?;
        let content = repo.content(&file)?;
        Ok(FileResponse::new(file, content))
    })
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/files/{file_id}",
    params(("file_id" = String, Path, description = "File identifier")),
    request_body = UpdateFileRequest,
    tag = "Files",
    responses(
        (status = 200, body = FileResponse),
        (status = 404, description = "File not found or trashed")
    )
)]
pub async fn update_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateFileRequest>,
) -> Result<Json<FileResponse>, ApiError> {
    let update = FileMetadataUpdate {
        name: request.name,
        path: request.path,
        language: request.language,
    };
    let response = run_blocking(&state, move |repo| {
        let file = repo.update_metadata(&file_id, update)?;
        let content = repo.content(&file)?;
        Ok(FileResponse::new(file, content))
    })
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/files/{file_id}",
    params(
        ("file_id" = String, Path, description = "File identifier"),
        DeleteFileQuery
    ),
    tag = "Files",
    responses(
        (status = 204),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<DeleteFileQuery>,
) -> Result<StatusCode, ApiError> {
    run_blocking(&state, move |repo| {
        if params.permanent {
            repo.permanent_delete(&file_id)
        } else {
            repo.soft_delete(&file_id).map(|_| ())
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/files/{file_id}/save",
    params(("file_id" = String, Path, description = "File identifier")),
    request_body = SaveFileRequest,
    tag = "Files",
    responses(
        (status = 200, body = SaveFileResponse),
        (status = 404, description = "File not found or trashed")
    )
)]
pub async fn save_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SaveFileRequest>,
) -> Result<Json<SaveFileResponse>, ApiError> {
    let outcome = run_blocking(&state, move |repo| {
        repo.save(&file_id, &request.content, request.create_snapshot)
    })
    .await?;

    Ok(Json(SaveFileResponse {
        file: FileListItem::from(&outcome.file),
        snapshot_created: outcome.snapshot.is_some(),
        version_number: outcome.snapshot.map(|v| v.version_number),
    }))
}

#[utoipa::path(
    post,
    path = "/api/files/{file_id}/restore",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    responses(
        (status = 200, body = FileListItem),
        (status = 404, description = "File not found")
    )
)]
pub async fn restore_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FileListItem>, ApiError> {
    let file = run_blocking(&state, move |repo| repo.restore_from_trash(&file_id)).await?;
    Ok(Json(FileListItem::from(&file)))
}

#[utoipa::path(
    post,
    path = "/api/files/{file_id}/duplicate",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    responses(
        (status = 201, body = FileResponse),
        (status = 404, description = "File not found or trashed")
    )
)]
pub async fn duplicate_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let response = run_blocking(&state, move |repo| {
        let copy = repo.duplicate(&file_id)?;
        let content = repo.content(&copy)?;
        Ok(FileResponse::new(copy, content))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/files/{file_id}/export",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    responses(
        (status = 200, description = "Plaintext download", body = String, content_type = "text/plain"),
        (status = 404, description = "File not found or trashed")
    )
)]
pub async fn export_file(
    Auth(_user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, content) = run_blocking(&state, move |repo| {
        let file = repo.get(&file_id)?;
        let content = repo.content(&file)?;
        Ok((file.name, content))
    })
    .await?;

    let disposition = format!("attachment; filename=\"{}\"", attachment_name(&name));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

#[utoipa::path(
    post,
    path = "/api/files/reorder",
    request_body = ReorderRequest,
    tag = "Files",
    responses((status = 200, body = ReorderResponse))
)]
pub async fn reorder_files(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let updated = run_blocking(&state, move |repo| repo.reorder(&request.file_ids)).await?;
    Ok(Json(ReorderResponse { updated }))
}

#[utoipa::path(
    post,
    path = "/api/files/import",
    request_body = ImportRequest,
    tag = "Files",
    responses((status = 200, body = ImportResponse))
)]
pub async fn import_files(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let entries: Vec<ImportEntry> = request.files.into_iter().map(Into::into).collect();
    let report = run_blocking(&state, move |repo| repo.import(entries)).await?;
    Ok(Json(ImportResponse {
        imported: report.imported,
        skipped: report.skipped,
    }))
}

/// Keep a file name safe inside a quoted header parameter.
fn attachment_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    if cleaned.trim().is_empty() {
        "download.txt".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_user;
    use crate::state::test_state;
    use axum::body::to_bytes;

    fn create_request(name: &str, path: &str, content: &str) -> CreateFileRequest {
        CreateFileRequest {
            name: name.into(),
            path: path.into(),
            content: content.into(),
            language: None,
        }
    }

    async fn create(state: &AppState, name: &str, content: &str) -> FileResponse {
        let (_, Json(file)) = create_file(
            test_user(),
            State(state.clone()),
            Json(create_request(name, &format!("/{name}"), content)),
        )
        .await
        .expect("file creation succeeds");
        file
    }

    #[tokio::test]
    async fn create_file_returns_201_with_content() {
        let (state, _dir) = test_state();
        let (status, Json(file)) = create_file(
            test_user(),
            State(state.clone()),
            Json(create_request("a.txt", "/a.txt", "hello")),
        )
        .await
        .expect("file creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(file.content, "hello");
        assert_eq!(file.language, "plaintext");
        assert!(!file.id.is_empty());
        assert_eq!(state.files.list_versions(&file.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_file_with_blank_name_is_bad_request() {
        let (state, _dir) = test_state();
        let err = create_file(
            test_user(),
            State(state),
            Json(create_request("", "/x", "")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_file_decrypts_content() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "secret text").await;

        let Json(file) = get_file(test_user(), Path(created.id.clone()), State(state))
            .await
            .expect("file exists");
        assert_eq!(file.content, "secret text");
        assert_eq!(file.id, created.id);
    }

    #[tokio::test]
    async fn get_missing_file_is_404() {
        let (state, _dir) = test_state();
        let err = get_file(test_user(), Path("nope".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_file_reports_forced_snapshot() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "v1").await;

        let Json(absorbed) = save_file(
            test_user(),
            Path(created.id.clone()),
            State(state.clone()),
            Json(SaveFileRequest {
                content: "v2".into(),
                create_snapshot: false,
            }),
        )
        .await
        .unwrap();
        assert!(!absorbed.snapshot_created);
        assert_eq!(absorbed.version_number, None);

        let Json(forced) = save_file(
            test_user(),
            Path(created.id.clone()),
            State(state.clone()),
            Json(SaveFileRequest {
                content: "v3".into(),
                create_snapshot: true,
            }),
        )
        .await
        .unwrap();
        assert!(forced.snapshot_created);
        assert_eq!(forced.version_number, Some(2));
    }

    #[tokio::test]
    async fn soft_delete_then_restore_from_trash() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "x").await;

        let status = delete_file(
            test_user(),
            Path(created.id.clone()),
            State(state.clone()),
            Query(DeleteFileQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(active) = list_files(
            test_user(),
            State(state.clone()),
            Query(ListFilesQuery::default()),
        )
        .await
        .unwrap();
        assert!(active.is_empty());

        let Json(trash) = list_trash(test_user(), State(state.clone())).await.unwrap();
        assert_eq!(trash.len(), 1);
        assert!(trash[0].is_deleted);

        let Json(restored) = restore_file(test_user(), Path(created.id.clone()), State(state))
            .await
            .unwrap();
        assert!(!restored.is_deleted);
        assert!(restored.deleted_at.is_none());
    }

    #[tokio::test]
    async fn permanent_delete_removes_file() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "x").await;

        delete_file(
            test_user(),
            Path(created.id.clone()),
            State(state.clone()),
            Query(DeleteFileQuery { permanent: true }),
        )
        .await
        .unwrap();

        let Json(all) = list_files(
            test_user(),
            State(state.clone()),
            Query(ListFilesQuery {
                include_deleted: true,
            }),
        )
        .await
        .unwrap();
        assert!(all.is_empty());

        let err = delete_file(
            test_user(),
            Path(created.id),
            State(state),
            Query(DeleteFileQuery { permanent: true }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_file_changes_metadata_only() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "body").await;

        let Json(updated) = update_file(
            test_user(),
            Path(created.id.clone()),
            State(state),
            Json(UpdateFileRequest {
                name: Some("b.md".into()),
                path: None,
                language: Some("markdown".into()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "b.md");
        assert_eq!(updated.path, "/a.txt");
        assert_eq!(updated.language, "markdown");
        assert_eq!(updated.content, "body");
    }

    #[tokio::test]
    async fn duplicate_file_returns_copy() {
        let (state, _dir) = test_state();
        let created = create(&state, "a.txt", "body").await;

        let (status, Json(copy)) =
            duplicate_file(test_user(), Path(created.id.clone()), State(state))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(copy.name, "a_copy.txt");
        assert_eq!(copy.path, "/a_copy.txt");
        assert_eq!(copy.content, "body");
    }

    #[tokio::test]
    async fn export_file_sets_attachment_headers() {
        let (state, _dir) = test_state();
        let created = create(&state, "notes.md", "# Title").await;

        let response = export_file(test_user(), Path(created.id), State(state))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"notes.md\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"# Title");
    }

    #[tokio::test]
    async fn reorder_then_list_follows_new_order() {
        let (state, _dir) = test_state();
        let a = create(&state, "a", "").await;
        let b = create(&state, "b", "").await;

        let Json(result) = reorder_files(
            test_user(),
            State(state.clone()),
            Json(ReorderRequest {
                file_ids: vec![b.id.clone(), a.id.clone(), "ghost".into()],
            }),
        )
        .await
        .unwrap();
        assert_eq!(result.updated, 2);

        let Json(files) = list_files(
            test_user(),
            State(state),
            Query(ListFilesQuery::default()),
        )
        .await
        .unwrap();
        let ids: Vec<_> = files.into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn import_files_reports_counts() {
        let (state, _dir) = test_state();
        create(&state, "a.txt", "original").await;

        let Json(report) = import_files(
            test_user(),
            State(state),
            Json(ImportRequest {
                files: vec![
                    crate::models::ImportFileEntry {
                        name: Some("a.txt".into()),
                        path: Some("/a.txt".into()),
                        content: Some("dup".into()),
                        language: None,
                    },
                    crate::models::ImportFileEntry {
                        name: Some("new.txt".into()),
                        ..Default::default()
                    },
                ],
            }),
        )
        .await
        .unwrap();

        assert_eq!(report, ImportResponse { imported: 1, skipped: 1 });
    }

    #[test]
    fn attachment_name_strips_quotes_and_non_ascii() {
        assert_eq!(attachment_name("a\"b.txt"), "ab.txt");
        assert_eq!(attachment_name("résumé.md"), "rsum.md");
        assert_eq!(attachment_name("\"\""), "download.txt");
    }
}
