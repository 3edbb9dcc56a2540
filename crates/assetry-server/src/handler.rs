use std::sync::Arc;

use assetry_pipeline::{AssetError, AssetService, IngestionMode, PendingReplacement, FILE_FIELD_NAME};
use assetry_types::{OCTET_STREAM, THUMBNAIL_MEDIA_TYPE};
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::form::{read_form, FileTarget, FormFile};
use crate::metadata::{FilePatch, FileRecord, MetadataStore};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetService>,
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    pub fn new(assets: Arc<AssetService>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { assets, metadata }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "skipFileUpload")]
    pub skip_file_upload: Option<String>,
}

impl UploadQuery {
    fn mode(&self) -> IngestionMode {
        IngestionMode::from_skip_flag(flag_set(self.skip_file_upload.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    pub thumbnail: Option<String>,
}

fn flag_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Unknown and malformed ids both mean "no such record".
fn parse_id(raw: &str) -> ServerResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ServerError::RecordNotFound(raw.to_string()))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let config = state.assets.config();
    Json(json!({
        "name": "assetry",
        "version": env!("CARGO_PKG_VERSION"),
        "maxFileSize": config.max_file_size,
        "thumbnailWidth": config.thumbnail_width,
        "fileField": FILE_FIELD_NAME,
    }))
}

pub async fn list_files(State(state): State<AppState>) -> ServerResult<Json<Vec<FileRecord>>> {
    Ok(Json(state.metadata.list().await?))
}

pub async fn create_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ServerResult<Response> {
    let mode = query.mode();
    if mode == IngestionMode::MetadataOnly {
        return Err(ServerError::BadRequest(
            "a new file record needs file content; skipFileUpload is only valid on update".into(),
        ));
    }

    let form = read_form(&mut multipart, &state.assets, mode, FileTarget::New).await?;
    let FormFile::Ingested(asset) = form.file else {
        return Err(AssetError::MissingField(FILE_FIELD_NAME.to_string()).into());
    };

    let record = FileRecord::from_asset(asset, form.category, form.description);
    let record = match state.metadata.insert(record.clone()).await {
        Ok(record) => record,
        Err(e) => {
            warn!(name = %record.name, error = %e, "metadata insert failed; stored blob is unreferenced");
            return Err(e);
        }
    };
    info!(id = %record.id, name = %record.name, size = record.size, "file created");

    let location = format!("/v1/files/{}", record.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(record),
    )
        .into_response())
}

pub async fn fetch_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<FetchQuery>,
) -> ServerResult<Response> {
    let id = parse_id(&raw_id)?;
    let record = state
        .metadata
        .get(id)
        .await?
        .ok_or(ServerError::RecordNotFound(raw_id))?;

    if flag_set(query.thumbnail.as_deref()) {
        if !state.assets.has_blob(&record.name).await? {
            return Err(AssetError::NotFound(format!("blob {}", record.name)).into());
        }
        let thumb = state
            .assets
            .thumbnail(&record.name, &record.mime_type)
            .await?;
        let mut response = stream_response(thumb.file, THUMBNAIL_MEDIA_TYPE);
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(thumb.size));
        return Ok(response);
    }

    let reader = state.assets.open_blob(&record.name).await?;
    Ok(stream_response(reader, record.mime_type.as_str()))
}

pub async fn update_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ServerResult<Json<FileRecord>> {
    let id = parse_id(&raw_id)?;
    let existing = state
        .metadata
        .get(id)
        .await?
        .ok_or_else(|| ServerError::RecordNotFound(raw_id.clone()))?;

    let form = read_form(
        &mut multipart,
        &state.assets,
        query.mode(),
        FileTarget::Replace(&existing.name),
    )
    .await?;
    let pending = match form.file {
        FormFile::Replacing(pending) => Some(pending),
        _ => None,
    };
    let patch = FilePatch {
        category: form.category,
        description: form.description,
        asset: pending
            .as_ref()
            .and_then(|p| p.new_asset())
            .cloned(),
    };

    match state.metadata.update(id, patch).await {
        Ok(Some((before, updated))) => {
            // Another update may have swapped the blob since `existing` was
            // read; retire whatever this swap displaced.
            if let Some(pending) = pending {
                pending.confirm_against(&before.name).await?;
            }
            info!(id = %updated.id, name = %updated.name, "file updated");
            Ok(Json(updated))
        }
        Ok(None) => {
            abandon(pending).await;
            Err(ServerError::RecordNotFound(raw_id))
        }
        Err(e) => {
            abandon(pending).await;
            Err(e)
        }
    }
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ServerResult<Json<FileRecord>> {
    let id = parse_id(&raw_id)?;
    let record = state
        .metadata
        .remove(id)
        .await?
        .ok_or(ServerError::RecordNotFound(raw_id))?;
    state.assets.delete_asset(&record.name).await?;
    info!(id = %record.id, name = %record.name, "file deleted");
    Ok(Json(record))
}

async fn abandon(pending: Option<PendingReplacement>) {
    if let Some(pending) = pending {
        if let Err(e) = pending.abandon().await {
            warn!(error = %e, "failed to discard replacement blob");
        }
    }
}

fn stream_response<R>(reader: R, content_type: &str) -> Response
where
    R: AsyncRead + Send + 'static,
{
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));
    let mut response = Response::new(Body::from_stream(ReaderStream::new(reader)));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}
