use crate::draw::composite::Raster;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::ImageOutputFormat;
use std::io::Cursor;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

pub const DEFAULT_EXPORT_FIELD_NAME: &str = "instax";
pub const DEFAULT_EXPORT_FILE_PREFIX: &str = "drawing";
pub const EXPORT_CONTENT_TYPE: &str = "image/png";

/// Encoded merge result, ready to be attached to a multipart upload under
/// `field_name`. Upload transport is up to the host.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub field_name: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SubmissionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPayload")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNaming {
    pub field_name: String,
    pub file_prefix: String,
}

impl Default for ExportNaming {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_EXPORT_FIELD_NAME.to_owned(),
            file_prefix: DEFAULT_EXPORT_FILE_PREFIX.to_owned(),
        }
    }
}

pub fn export_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.png", prefix, now.timestamp_millis())
}

pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    raster
        .to_rgba_image()
        .write_to(&mut out, ImageOutputFormat::Png)
        .with_context(|| format!("encode {}x{} export as png", raster.width(), raster.height()))?;
    Ok(out.into_inner())
}

pub fn build_payload(merged: &Raster, naming: &ExportNaming, now: DateTime<Utc>) -> Result<SubmissionPayload> {
    Ok(SubmissionPayload {
        field_name: naming.field_name.clone(),
        file_name: export_file_name(&naming.file_prefix, now),
        content_type: EXPORT_CONTENT_TYPE,
        bytes: encode_png(merged)?,
    })
}

#[derive(Debug)]
pub struct EncodedExport {
    pub request_id: u64,
    pub result: Result<SubmissionPayload>,
}

/// Encodes an already-merged snapshot on a worker thread. The snapshot is owned
/// by the job, so later drawing cannot leak into this export.
pub fn spawn_encode(
    request_id: u64,
    merged: Raster,
    naming: ExportNaming,
    requested_at: DateTime<Utc>,
    tx: Sender<EncodedExport>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let result = build_payload(&merged, &naming, requested_at);
        if tx.send(EncodedExport { request_id, result }).is_err() {
            tracing::debug!(request_id, "export encode finished after receiver closed");
        }
    })
}
