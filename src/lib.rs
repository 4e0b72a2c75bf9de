//! Core library for generating student, bus-student and faculty ID cards.

pub mod avatar;
pub mod capture;
pub mod codes;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
mod graphics;
pub mod layout;
pub mod logging;
pub mod records;
pub mod store;

pub use avatar::{
    AvatarResolver, AvatarSource, FsPhotoLoader, ImageOrigin, LoadedImage, PhotoLoader,
};
pub use capture::{CAPTURE_SCALE, CaptureEngine, CardArena, CardHandle, RenderedCard, Visibility};
pub use config::{AppConfig, ExportSettings, InstitutionConfig};
pub use context::{AppContext, ViewMode};
pub use error::{AssetError, CaptureError, CodeError, ExportError, IdCardError, IdCardResult};
pub use export::{
    ArchiveReport, BatchReport, CaptureTarget, DirectorySink, DownloadSink, ExportOrchestrator,
    ExportState, MemorySink, SingleReport,
};
pub use graphics::FontStack;
pub use layout::{CardLayout, CardVariant, LayoutResolver, ThemeColor, VariantChoice};
pub use records::{Category, FacultyRecord, Record, RecordBody, RecordId, StudentRecord};
pub use store::RecordStore;
