//! Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IdCardError, IdCardResult};

/// Environment variable consulted when no explicit config path is given.
pub const CONFIG_ENV: &str = "IDCARDS_CONFIG";

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Issuing institution details printed on every card.
    pub institution: InstitutionConfig,

    /// Export tuning (JPEG quality, pacing, archive naming).
    pub export: ExportSettings,

    /// Photo and placeholder avatar settings.
    pub avatar: AvatarConfig,

    /// Text rendering settings.
    pub render: RenderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Institution identity shown in card headers and encoded in QR symbols.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstitutionConfig {
    pub name: String,
    pub tagline: String,
    /// Fixed QR payload used by student cards.
    pub website_url: String,
    /// Faculty QR payloads are `<faculty_profile_base>/<facultyId>`.
    pub faculty_profile_base: String,
}

/// Export parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    /// JPEG quality (1-100) for single and sequential downloads.
    pub single_quality: u8,

    /// JPEG quality (1-100) for images placed in an archive.
    pub archive_quality: u8,

    /// Delay between consecutive downloads in sequential batch mode.
    pub pacing_ms: u64,

    /// Entry name prefix inside archives, `<prefix>_<n>.jpeg`.
    pub archive_prefix: String,
}

/// Avatar resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AvatarConfig {
    /// Placeholder avatar service; the URL-encoded name is appended as `name=`.
    pub endpoint: String,

    /// Directory that relative photo paths are resolved against.
    pub photo_dir: Option<PathBuf>,
}

/// Text rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Extra font files tried before the bundled face, e.g. a Telugu font
    /// for `teluguName`.
    pub fonts: Vec<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "idcards=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            name: "Government Institute of Technology".to_string(),
            tagline: "Affiliated to the State Technical University".to_string(),
            website_url: "https://www.git.ac.in".to_string(),
            faculty_profile_base: "https://www.git.ac.in/faculty".to_string(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            single_quality: 90,
            archive_quality: 100,
            pacing_ms: 500,
            archive_prefix: "ID_Card".to_string(),
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ui-avatars.com/api/".to_string(),
            photo_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from `path`, then `$IDCARDS_CONFIG`, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let candidate = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let Some(config_path) = candidate else {
            return Self::default();
        };
        match Self::read(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Strictly read and validate a config file.
    pub fn read(path: &Path) -> IdCardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config as pretty JSON.
    pub fn save(&self, path: &Path) -> IdCardResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> IdCardResult<()> {
        let export = &self.export;
        for (label, quality) in [
            ("single_quality", export.single_quality),
            ("archive_quality", export.archive_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(IdCardError::config(format!(
                    "export.{label} must be within 1..=100 (got {quality})"
                )));
            }
        }
        if export.archive_prefix.trim().is_empty() {
            return Err(IdCardError::config("export.archive_prefix cannot be empty"));
        }
        Ok(())
    }
}
