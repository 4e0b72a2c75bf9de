//! Export orchestration: single downloads, paced batches and zip bundles.
//!
//! Every export walks `Idle -> Preparing -> Capturing | Bundling -> Idle`.
//! Work runs on the caller's task; captures happen strictly one after
//! another, and there is no timeout or mid-batch cancellation.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::capture::{CaptureEngine, CardArena, CardHandle};
use crate::config::ExportSettings;
use crate::error::{CaptureError, ExportError};
use crate::records::{Category, Record};

/// One card queued for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    pub handle: CardHandle,
    /// Roll number or faculty ID, used for file names.
    pub natural_key: String,
}

/// Receives finished files, the stand-in for a browser download.
pub trait DownloadSink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Writes each delivered file into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(filename), bytes)
    }
}

/// Keeps delivered files in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Preparing,
    Capturing,
    Bundling,
}

/// Result of a single-card download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleReport {
    pub filename: String,
    pub bytes: usize,
}

impl SingleReport {
    pub fn notice(&self) -> String {
        format!("Downloaded 1 ID card as {}", self.filename)
    }
}

/// A card dropped from a sequential batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCard {
    pub natural_key: String,
    pub reason: String,
}

/// Result of a sequential batch download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Cards attempted, successful or not.
    pub processed: usize,
    pub delivered: Vec<String>,
    pub skipped: Vec<SkippedCard>,
}

impl BatchReport {
    pub fn notice(&self) -> String {
        if self.skipped.is_empty() {
            format!("Processed {} ID cards", self.processed)
        } else {
            format!(
                "Processed {} ID cards ({} skipped: {})",
                self.processed,
                self.skipped.len(),
                self.skipped
                    .iter()
                    .map(|s| s.natural_key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

/// Result of an archive export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub filename: String,
    pub entries: Vec<String>,
    pub bytes: usize,
}

impl ArchiveReport {
    pub fn notice(&self) -> String {
        format!("Bundled {} ID cards into {}", self.entries.len(), self.filename)
    }
}

/// `ID_Card_<key>.jpg`, with path separators in the key replaced.
pub fn card_filename(natural_key: &str) -> String {
    let safe: String = natural_key
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("ID_Card_{safe}.jpg")
}

/// `<prefix>_<ordinal>.jpeg`, ordinal starting at 1.
pub fn archive_entry_name(prefix: &str, ordinal: usize) -> String {
    format!("{prefix}_{ordinal}.jpeg")
}

/// File name for a JSON export of one category.
pub fn json_filename(category: Category) -> &'static str {
    match category {
        Category::Student => "students-data.json",
        Category::Faculty => "faculty-data.json",
    }
}

/// Encode an opaque bitmap as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).encode_image(image)?;
    Ok(buffer)
}

/// Drop queued cards an aborted export will never reach.
fn release_rest(arena: &mut CardArena, rest: &[CaptureTarget]) {
    for target in rest {
        arena.release(target.handle);
    }
    if !rest.is_empty() {
        tracing::debug!(released = rest.len(), "queued cards released");
    }
}

/// Drives captures and deliveries for export requests.
#[derive(Debug)]
pub struct ExportOrchestrator {
    engine: CaptureEngine,
    settings: ExportSettings,
    state: ExportState,
}

impl ExportOrchestrator {
    pub fn new(engine: CaptureEngine, settings: ExportSettings) -> Self {
        Self {
            engine,
            settings,
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    fn transition(&mut self, next: ExportState) {
        tracing::debug!(from = ?self.state, to = ?next, "export state");
        self.state = next;
    }

    /// Capture one card and release it from the arena whatever the outcome.
    async fn capture(
        &self,
        arena: &mut CardArena,
        target: &CaptureTarget,
    ) -> Result<RgbImage, CaptureError> {
        tokio::task::yield_now().await;
        let result = self.engine.capture_handle(arena, target.handle);
        arena.release(target.handle);
        result
    }

    fn prepare(&mut self, arena: &CardArena, targets: &[CaptureTarget]) -> Result<(), ExportError> {
        self.transition(ExportState::Preparing);
        if !targets.iter().any(|t| arena.get(t.handle).is_some()) {
            tracing::warn!("export requested with no realized cards");
            self.transition(ExportState::Idle);
            return Err(ExportError::NothingToExport);
        }
        Ok(())
    }

    /// Capture one card and deliver it as `ID_Card_<key>.jpg`.
    pub async fn export_single(
        &mut self,
        arena: &mut CardArena,
        target: &CaptureTarget,
        sink: &mut dyn DownloadSink,
    ) -> Result<SingleReport, ExportError> {
        self.prepare(arena, std::slice::from_ref(target))?;
        self.transition(ExportState::Capturing);
        let result = self.deliver_one(arena, target, sink).await;
        self.transition(ExportState::Idle);
        let report = result?;
        tracing::info!(file = %report.filename, bytes = report.bytes, "card downloaded");
        Ok(report)
    }

    async fn deliver_one(
        &self,
        arena: &mut CardArena,
        target: &CaptureTarget,
        sink: &mut dyn DownloadSink,
    ) -> Result<SingleReport, ExportError> {
        let key = target.natural_key.clone();
        let bitmap = self
            .capture(arena, target)
            .await
            .map_err(|source| ExportError::Capture {
                key: key.clone(),
                source,
            })?;
        let bytes = encode_jpeg(&bitmap, self.settings.single_quality)
            .map_err(|source| ExportError::Encode { key, source })?;
        let filename = card_filename(&target.natural_key);
        sink.deliver(&filename, &bytes)
            .map_err(|source| ExportError::Delivery {
                filename: filename.clone(),
                source,
            })?;
        Ok(SingleReport {
            filename,
            bytes: bytes.len(),
        })
    }

    /// Download cards one by one in list order, pausing between downloads.
    ///
    /// A card that fails to capture or encode is logged and skipped. A
    /// delivery failure is fatal and ends the batch.
    pub async fn export_sequential(
        &mut self,
        arena: &mut CardArena,
        targets: &[CaptureTarget],
        sink: &mut dyn DownloadSink,
    ) -> Result<BatchReport, ExportError> {
        self.prepare(arena, targets)?;
        self.transition(ExportState::Capturing);
        let result = self.run_sequential(arena, targets, sink).await;
        self.transition(ExportState::Idle);
        let report = result?;
        tracing::info!(
            processed = report.processed,
            delivered = report.delivered.len(),
            skipped = report.skipped.len(),
            "batch export finished"
        );
        Ok(report)
    }

    async fn run_sequential(
        &self,
        arena: &mut CardArena,
        targets: &[CaptureTarget],
        sink: &mut dyn DownloadSink,
    ) -> Result<BatchReport, ExportError> {
        let pacing = Duration::from_millis(self.settings.pacing_ms);
        let mut report = BatchReport::default();
        for (idx, target) in targets.iter().enumerate() {
            report.processed += 1;
            tracing::info!(
                key = %target.natural_key,
                position = idx + 1,
                total = targets.len(),
                "exporting card"
            );
            match self.deliver_one(arena, target, sink).await {
                Ok(single) => report.delivered.push(single.filename),
                Err(err @ ExportError::Delivery { .. }) => {
                    release_rest(arena, &targets[idx + 1..]);
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(key = %target.natural_key, %err, "card skipped");
                    report.skipped.push(SkippedCard {
                        natural_key: target.natural_key.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }
            if idx + 1 < targets.len() && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
        Ok(report)
    }

    /// Capture every card into one zip named `archive_name`.
    ///
    /// Any capture failure aborts the bundle and nothing is delivered.
    pub async fn export_archive(
        &mut self,
        arena: &mut CardArena,
        targets: &[CaptureTarget],
        archive_name: &str,
        sink: &mut dyn DownloadSink,
    ) -> Result<ArchiveReport, ExportError> {
        self.prepare(arena, targets)?;
        self.transition(ExportState::Bundling);
        let result = self.run_archive(arena, targets, archive_name, sink).await;
        self.transition(ExportState::Idle);
        match &result {
            Ok(report) => tracing::info!(
                file = %report.filename,
                entries = report.entries.len(),
                "archive exported"
            ),
            Err(err) => tracing::warn!(%err, "archive export aborted"),
        }
        result
    }

    async fn run_archive(
        &self,
        arena: &mut CardArena,
        targets: &[CaptureTarget],
        archive_name: &str,
        sink: &mut dyn DownloadSink,
    ) -> Result<ArchiveReport, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::with_capacity(targets.len());

        for (idx, target) in targets.iter().enumerate() {
            let name = archive_entry_name(&self.settings.archive_prefix, idx + 1);
            if let Err(err) = self.bundle_one(arena, target, &name, &mut zip).await {
                // the operator re-triggers the whole bundle
                release_rest(arena, &targets[idx + 1..]);
                return Err(err);
            }
            entries.push(name);
        }

        let archive = zip.finish()?.into_inner();
        sink.deliver(archive_name, &archive)
            .map_err(|source| ExportError::Delivery {
                filename: archive_name.to_string(),
                source,
            })?;
        Ok(ArchiveReport {
            filename: archive_name.to_string(),
            entries,
            bytes: archive.len(),
        })
    }

    async fn bundle_one(
        &self,
        arena: &mut CardArena,
        target: &CaptureTarget,
        name: &str,
        zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    ) -> Result<(), ExportError> {
        let key = target.natural_key.clone();
        let bitmap = self
            .capture(arena, target)
            .await
            .map_err(|source| ExportError::Capture {
                key: key.clone(),
                source,
            })?;
        let bytes = encode_jpeg(&bitmap, self.settings.archive_quality)
            .map_err(|source| ExportError::Encode { key, source })?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(&bytes).map_err(zip::result::ZipError::Io)?;
        tracing::debug!(entry = %name, bytes = bytes.len(), "archive entry added");
        Ok(())
    }

    /// Deliver `records` as a pretty-printed JSON array named for `category`.
    pub fn export_json(
        &self,
        records: &[&Record],
        category: Category,
        sink: &mut dyn DownloadSink,
    ) -> Result<String, ExportError> {
        let json = serde_json::to_vec_pretty(records)?;
        let filename = json_filename(category).to_string();
        sink.deliver(&filename, &json)
            .map_err(|source| ExportError::Delivery {
                filename: filename.clone(),
                source,
            })?;
        tracing::info!(file = %filename, records = records.len(), "records exported as json");
        Ok(filename)
    }
}
