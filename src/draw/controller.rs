use crate::draw::background::{spawn_decode, BackgroundSource, DecodedBackground};
use crate::draw::messages::{SurfaceCommand, SurfaceEvent};
use crate::draw::save::{spawn_encode, EncodedExport};
use crate::draw::surface::DrawSurface;
use chrono::Utc;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Host-owned trigger values. Save fires on a false to true edge; the
/// others fire whenever their value differs from the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerSignals {
    pub save: bool,
    pub undo: bool,
    pub redo: bool,
    pub clear: bool,
}

impl TriggerSignals {
    /// Commands implied by going from `previous` to `self`, in a fixed order.
    pub fn edges_since(&self, previous: &TriggerSignals) -> Vec<SurfaceCommand> {
        let mut commands = Vec::new();
        if self.undo != previous.undo {
            commands.push(SurfaceCommand::Undo);
        }
        if self.redo != previous.redo {
            commands.push(SurfaceCommand::Redo);
        }
        if self.clear != previous.clear {
            commands.push(SurfaceCommand::Clear);
        }
        if self.save && !previous.save {
            commands.push(SurfaceCommand::Save);
        }
        commands
    }
}

/// Drives a [`DrawSurface`] from host triggers and collects results of the
/// background decode and export encode workers.
pub struct SurfaceController {
    surface: DrawSurface,
    signals: Option<TriggerSignals>,
    decode_tx: Sender<DecodedBackground>,
    decode_rx: Receiver<DecodedBackground>,
    encode_tx: Sender<EncodedExport>,
    encode_rx: Receiver<EncodedExport>,
    next_export_id: u64,
    pending_exports: usize,
}

impl SurfaceController {
    pub fn new(surface: DrawSurface) -> Self {
        let (decode_tx, decode_rx) = channel();
        let (encode_tx, encode_rx) = channel();
        Self {
            surface,
            signals: None,
            decode_tx,
            decode_rx,
            encode_tx,
            encode_rx,
            next_export_id: 0,
            pending_exports: 0,
        }
    }

    pub fn surface(&self) -> &DrawSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawSurface {
        &mut self.surface
    }

    pub fn pending_exports(&self) -> usize {
        self.pending_exports
    }

    /// Starts decoding `source` off-thread. Any load still in flight is superseded.
    pub fn load_background(&mut self, source: BackgroundSource) -> u64 {
        let generation = self.surface.begin_loading();
        tracing::debug!(generation, source = %source.describe(), "background load requested");
        spawn_decode(generation, source, self.decode_tx.clone());
        generation
    }

    /// Compares `signals` with the previous observation and applies every
    /// resulting command. The first observation only records a baseline.
    pub fn observe_triggers(&mut self, signals: TriggerSignals) -> Vec<SurfaceCommand> {
        let Some(previous) = self.signals.replace(signals) else {
            return Vec::new();
        };
        let commands = signals.edges_since(&previous);
        for command in &commands {
            self.apply(*command);
        }
        commands
    }

    pub fn apply(&mut self, command: SurfaceCommand) {
        match command {
            SurfaceCommand::Undo => {
                if !self.surface.undo() {
                    tracing::debug!("undo with empty history");
                }
            }
            SurfaceCommand::Redo => {
                if !self.surface.redo() {
                    tracing::debug!("redo with empty history");
                }
            }
            SurfaceCommand::Clear => self.surface.clear(),
            SurfaceCommand::Save => self.request_export(),
        }
    }

    /// Snapshots the merged layers now and encodes them on a worker.
    pub fn request_export(&mut self) {
        let _ = self.surface.end_stroke();
        let Some(merged) = self.surface.merge() else {
            return;
        };
        self.next_export_id += 1;
        self.pending_exports += 1;
        tracing::debug!(request_id = self.next_export_id, "export requested");
        spawn_encode(
            self.next_export_id,
            merged,
            self.surface.settings().export_naming(),
            Utc::now(),
            self.encode_tx.clone(),
        );
    }

    /// Drains finished worker results without blocking.
    pub fn pump(&mut self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();

        loop {
            match self.decode_rx.try_recv() {
                Ok(decoded) => {
                    if let Some(event) = self
                        .surface
                        .finish_loading(decoded.generation, decoded.result)
                    {
                        events.push(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        loop {
            match self.encode_rx.try_recv() {
                Ok(encoded) => {
                    self.pending_exports = self.pending_exports.saturating_sub(1);
                    match encoded.result {
                        Ok(payload) => {
                            tracing::info!(
                                request_id = encoded.request_id,
                                file_name = %payload.file_name,
                                bytes = payload.bytes.len(),
                                "export ready"
                            );
                            events.push(SurfaceEvent::ExportReady(payload));
                        }
                        Err(err) => {
                            tracing::error!(request_id = encoded.request_id, error = %format!("{err:#}"), "export failed");
                            events.push(SurfaceEvent::ExportFailed {
                                error: format!("{err:#}"),
                            });
                        }
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        events
    }

    /// Pumps until `done` accepts the collected events or `timeout` passes.
    pub fn pump_until<F>(&mut self, timeout: std::time::Duration, mut done: F) -> Vec<SurfaceEvent>
    where
        F: FnMut(&[SurfaceEvent]) -> bool,
    {
        let deadline = std::time::Instant::now() + timeout;
        let mut events = Vec::new();
        loop {
            events.extend(self.pump());
            if done(&events) || std::time::Instant::now() >= deadline {
                return events;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}
