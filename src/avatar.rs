//! Photo resolution with a placeholder fallback.
//!
//! Resolution happens in two steps. [`AvatarResolver::declare`] looks at the
//! record alone: an empty photo goes straight to the placeholder. Then
//! [`AvatarResolver::realize`] tries to load a declared photo and swaps in
//! the same placeholder when loading fails. Both paths end at one contract:
//! a placeholder keyed by the URL-encoded display name.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};

use crate::error::AssetError;
use crate::graphics::FontStack;

/// Edge length of generated placeholder tiles.
pub const PLACEHOLDER_SIZE: u32 = 256;

/// The image a card should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// Stored photo reference as given in the record.
    Photo(String),
    /// Placeholder service URL for the record's name.
    Placeholder(String),
}

/// Where loaded pixels came from, for capture taint checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Local,
    CrossOrigin { cors_permitted: bool },
}

/// Decoded image plus its origin.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: RgbaImage,
    pub origin: ImageOrigin,
}

/// Fetches photo bytes for a photo reference.
pub trait PhotoLoader {
    fn load(&self, uri: &str) -> Result<LoadedImage, AssetError>;
}

/// Loads `data:` URIs and local files. Network URIs are reported as unsupported.
#[derive(Debug, Clone, Default)]
pub struct FsPhotoLoader {
    base_dir: Option<PathBuf>,
}

impl FsPhotoLoader {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw.strip_prefix("file://").unwrap_or(raw));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl PhotoLoader for FsPhotoLoader {
    fn load(&self, uri: &str) -> Result<LoadedImage, AssetError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(AssetError::Empty);
        }
        if let Some(rest) = uri.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| AssetError::DataUri("missing ',' separator".to_string()))?;
            if !meta.ends_with(";base64") {
                return Err(AssetError::DataUri("only base64 payloads are supported".to_string()));
            }
            let bytes = STANDARD
                .decode(payload.trim())
                .map_err(|e| AssetError::DataUri(e.to_string()))?;
            let pixels = image::load_from_memory(&bytes)?.to_rgba8();
            return Ok(LoadedImage {
                pixels,
                origin: ImageOrigin::Local,
            });
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Err(AssetError::Unsupported(uri.to_string()));
        }
        let path = self.resolve_path(uri);
        if !path.exists() {
            return Err(AssetError::NotFound(path));
        }
        let pixels = image::open(&path)?.to_rgba8();
        Ok(LoadedImage {
            pixels,
            origin: ImageOrigin::Local,
        })
    }
}

/// Final avatar for a realized card.
#[derive(Debug, Clone)]
pub struct ResolvedAvatar {
    pub source: AvatarSource,
    pub image: LoadedImage,
}

/// Decides between stored photos and name-keyed placeholders.
#[derive(Debug, Clone)]
pub struct AvatarResolver {
    endpoint: String,
}

impl Default for AvatarResolver {
    fn default() -> Self {
        Self::new(crate::config::AvatarConfig::default().endpoint)
    }
}

impl AvatarResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Placeholder URL; only the `name` parameter depends on the record.
    pub fn placeholder_url(&self, name: &str) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}name={}&size={}&background=random",
            self.endpoint,
            sep,
            urlencoding::encode(name.trim()),
            PLACEHOLDER_SIZE
        )
    }

    /// Step one: pick a source from the record fields alone.
    pub fn declare(&self, photo: &str, name: &str) -> AvatarSource {
        if photo.trim().is_empty() {
            AvatarSource::Placeholder(self.placeholder_url(name))
        } else {
            AvatarSource::Photo(photo.trim().to_string())
        }
    }

    /// Step two: load a declared photo, falling back to the placeholder on failure.
    pub fn realize(
        &self,
        declared: &AvatarSource,
        name: &str,
        loader: &dyn PhotoLoader,
    ) -> ResolvedAvatar {
        if let AvatarSource::Photo(uri) = declared {
            match loader.load(uri) {
                Ok(image) => {
                    return ResolvedAvatar {
                        source: declared.clone(),
                        image,
                    };
                }
                Err(err) => {
                    tracing::warn!(uri = %uri, %err, "photo unavailable, using placeholder");
                }
            }
        }
        ResolvedAvatar {
            source: AvatarSource::Placeholder(self.placeholder_url(name)),
            image: LoadedImage {
                pixels: placeholder_image(name),
                origin: ImageOrigin::Local,
            },
        }
    }
}

/// Up to two initials from the name, uppercase.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// Initials on a background color derived from the name hash.
pub fn placeholder_image(name: &str) -> RgbaImage {
    let digest = Sha256::digest(name.trim().as_bytes());
    // keep the tile dark enough for white initials
    let bg = Rgba([digest[0] / 2 + 40, digest[1] / 2 + 40, digest[2] / 2 + 40, 0xff]);
    let mut tile = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, bg);
    let text = initials(name);
    let fonts = FontStack::shared();
    let px = PLACEHOLDER_SIZE as f32 * 0.4;
    let x = (PLACEHOLDER_SIZE as i32 - fonts.measure(&text, px) as i32) / 2;
    let y = (PLACEHOLDER_SIZE as i32 - px.round() as i32) / 2;
    fonts.draw(&mut tile, x, y, &text, Rgba([0xff, 0xff, 0xff, 0xff]), px);
    tile
}
