use crate::draw::save::SubmissionPayload;

/// One discrete operation requested by the host through a trigger edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCommand {
    Save,
    Undo,
    Redo,
    Clear,
}

/// Results handed back to the host, mostly from the async decode/encode jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    BackgroundLoaded { width: u32, height: u32 },
    BackgroundFailed { error: String },
    ExportReady(SubmissionPayload),
    ExportFailed { error: String },
}
