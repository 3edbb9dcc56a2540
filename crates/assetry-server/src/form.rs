//! Multipart form reading.
//!
//! The `file` part is streamed straight into the asset pipeline while the
//! form is being read; it is never buffered whole. Text parts are small and
//! collected as strings.

use std::io;

use assetry_pipeline::{
    AssetError, AssetService, IngestedAsset, IngestionMode, PendingReplacement, UploadRequest,
    FILE_FIELD_NAME,
};
use assetry_types::{AssignedName, MediaType};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};

/// Where the uploaded file is headed.
#[derive(Clone, Copy, Debug)]
pub enum FileTarget<'r> {
    /// A brand new record.
    New,
    /// Replacing the blob of an existing record.
    Replace(&'r AssignedName),
}

#[derive(Debug, Default)]
pub enum FormFile {
    #[default]
    Absent,
    Ingested(IngestedAsset),
    Replacing(PendingReplacement),
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub category: Option<String>,
    pub description: Option<String>,
    pub file: FormFile,
}

impl UploadForm {
    /// Undo whatever the file part stored. Used when the request fails after
    /// the file has already been ingested.
    pub async fn discard(self, assets: &AssetService) {
        let outcome = match self.file {
            FormFile::Absent => Ok(()),
            FormFile::Ingested(asset) => assets.delete_asset(&asset.name).await,
            FormFile::Replacing(pending) => pending.abandon().await,
        };
        if let Err(e) = outcome {
            warn!(error = %e, "failed to discard uploaded blob");
        }
    }
}

/// Read the whole form, ingesting the `file` part according to `mode` and
/// `target`. Any blob stored before a later failure is removed again.
pub async fn read_form(
    multipart: &mut Multipart,
    assets: &AssetService,
    mode: IngestionMode,
    target: FileTarget<'_>,
) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();
    match read_fields(multipart, assets, mode, target, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard(assets).await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    assets: &AssetService,
    mode: IngestionMode,
    target: FileTarget<'_>,
    form: &mut UploadForm,
) -> ServerResult<()> {
    let limit = assets.config().max_file_size;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| transport_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "category" => form.category = Some(read_text(field, limit).await?),
            "description" => form.description = Some(read_text(field, limit).await?),
            FILE_FIELD_NAME if mode == IngestionMode::MetadataOnly => {
                debug!("metadata-only request, skipping file part");
            }
            FILE_FIELD_NAME => {
                if !matches!(form.file, FormFile::Absent) {
                    return Err(ServerError::BadRequest(format!(
                        "more than one `{FILE_FIELD_NAME}` part"
                    )));
                }
                let upload = upload_request(field);
                form.file = match target {
                    FileTarget::New => match assets.ingest(mode, Some(upload)).await {
                        Ok(Some(asset)) => FormFile::Ingested(asset),
                        Ok(None) => FormFile::Absent,
                        Err(e) => return Err(size_from_transport(e, limit).into()),
                    },
                    FileTarget::Replace(existing) => {
                        match assets.replace(existing, mode, Some(upload)).await {
                            Ok(pending) => FormFile::Replacing(pending),
                            Err(e) => return Err(size_from_transport(e, limit).into()),
                        }
                    }
                };
            }
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(())
}

fn upload_request(field: Field<'_>) -> UploadRequest<'_> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let media_type = field
        .content_type()
        .and_then(|ct| MediaType::new(ct).ok())
        .unwrap_or_else(MediaType::octet_stream);
    let content = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
    UploadRequest::new(FILE_FIELD_NAME, original_name, media_type, Box::new(content))
}

async fn read_text(field: Field<'_>, limit: u64) -> ServerResult<String> {
    field.text().await.map_err(|e| transport_error(e, limit))
}

/// The body limit surfaces as a multipart error mid-stream. Report it the
/// same way as the blob store's own ceiling.
fn transport_error(e: MultipartError, limit: u64) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AssetError::SizeExceeded { limit }.into()
    } else {
        ServerError::BadRequest(e.body_text())
    }
}

fn size_from_transport(e: AssetError, limit: u64) -> AssetError {
    match e {
        AssetError::UploadInterrupted(io)
            if io
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
                .is_some_and(|m| m.status() == StatusCode::PAYLOAD_TOO_LARGE) =>
        {
            AssetError::SizeExceeded { limit }
        }
        other => other,
    }
}
