//! Realized cards and their rasterization.
//!
//! [`CardArena::realize`] turns a layout into a [`RenderedCard`] (avatar
//! loaded, ready to paint) and hands back a [`CardHandle`]. The
//! [`CaptureEngine`] rasterizes whatever a handle points at; it never looks
//! cards up any other way.

use std::fmt;
use std::sync::Arc;

use image::{Rgb, RgbImage, Rgba};

use crate::avatar::{AvatarSource, ImageOrigin, PhotoLoader, ResolvedAvatar};
use crate::error::CaptureError;
use crate::graphics::{FontStack, paint_card};
use crate::layout::{CardLayout, LayoutResolver};

/// Whether a realized card is currently shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    OnScreen,
    Offscreen,
}

/// Explicit reference to a realized card inside a [`CardArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardHandle(usize);

impl CardHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A layout bound to its final avatar, ready for capture.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub layout: CardLayout,
    pub avatar: Option<ResolvedAvatar>,
    pub visibility: Visibility,
}

/// Owns realized cards until they are captured and released.
#[derive(Debug, Default)]
pub struct CardArena {
    slots: Vec<Option<RenderedCard>>,
}

impl CardArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the layout's avatar and store the card. Handles are never reused.
    pub fn realize(
        &mut self,
        layout: CardLayout,
        resolver: &LayoutResolver,
        loader: &dyn PhotoLoader,
        visibility: Visibility,
    ) -> CardHandle {
        let avatar = layout
            .avatar()
            .map(|declared| resolver.avatars().realize(declared, &layout.name, loader));
        let handle = CardHandle(self.slots.len());
        tracing::debug!(%handle, key = %layout.natural_key, ?visibility, "card realized");
        self.slots.push(Some(RenderedCard {
            layout,
            avatar,
            visibility,
        }));
        handle
    }

    pub fn get(&self, handle: CardHandle) -> Option<&RenderedCard> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Discard a card, returning it if it was still live.
    pub fn release(&mut self, handle: CardHandle) -> Option<RenderedCard> {
        self.slots.get_mut(handle.0).and_then(Option::take)
    }

    /// Number of cards still held.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Device pixels per logical card pixel in every capture.
pub const CAPTURE_SCALE: u32 = 2;

/// Rasterizes realized cards at [`CAPTURE_SCALE`] onto an opaque background.
#[derive(Debug, Clone)]
pub struct CaptureEngine {
    background: Rgba<u8>,
    fonts: Arc<FontStack>,
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureEngine {
    /// White background, bundled font only.
    pub fn new() -> Self {
        Self {
            background: Rgba([0xff, 0xff, 0xff, 0xff]),
            fonts: Arc::new(FontStack::embedded()),
        }
    }

    /// Override the background; alpha is ignored.
    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        let Rgb([r, g, b]) = background;
        self.background = Rgba([r, g, b, 0xff]);
        self
    }

    pub fn with_fonts(mut self, fonts: FontStack) -> Self {
        self.fonts = Arc::new(fonts);
        self
    }

    pub fn scale(&self) -> u32 {
        CAPTURE_SCALE
    }

    /// Capture the card behind `handle`.
    pub fn capture_handle(
        &self,
        arena: &CardArena,
        handle: CardHandle,
    ) -> Result<RgbImage, CaptureError> {
        let card = arena
            .get(handle)
            .ok_or(CaptureError::UnknownHandle(handle.index()))?;
        self.capture(card)
    }

    /// Rasterize `card` at twice its logical size. Visibility is irrelevant.
    pub fn capture(&self, card: &RenderedCard) -> Result<RgbImage, CaptureError> {
        let geometry = card.layout.geometry;
        if geometry.width == 0 || geometry.height == 0 {
            return Err(CaptureError::EmptySurface {
                width: geometry.width,
                height: geometry.height,
            });
        }
        if let Some(avatar) = &card.avatar {
            if avatar.image.origin == (ImageOrigin::CrossOrigin { cors_permitted: false }) {
                let uri = match &avatar.source {
                    AvatarSource::Photo(uri) | AvatarSource::Placeholder(uri) => uri.clone(),
                };
                return Err(CaptureError::Tainted { uri });
            }
        }
        let painted = paint_card(
            &card.layout,
            card.avatar.as_ref().map(|a| &a.image.pixels),
            CAPTURE_SCALE,
            self.background,
            &self.fonts,
        );
        let bitmap = image::DynamicImage::ImageRgba8(painted).to_rgb8();
        tracing::debug!(
            key = %card.layout.natural_key,
            width = bitmap.width(),
            height = bitmap.height(),
            "card captured"
        );
        Ok(bitmap)
    }
}
