//! Explicit application context handed to the pipeline.

use crate::avatar::{AvatarResolver, PhotoLoader};
use crate::capture::{CaptureEngine, CardArena, Visibility};
use crate::config::AppConfig;
use crate::error::IdCardResult;
use crate::export::{CaptureTarget, ExportOrchestrator};
use crate::graphics::FontStack;
use crate::layout::{LayoutResolver, ThemeColor, VariantChoice};
use crate::records::Record;

/// How the operator is looking at cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// One card at full size.
    #[default]
    Single,
    /// Thumbnails; full-size capture nodes are kept off-screen.
    Grid,
}

impl ViewMode {
    pub fn visibility(self) -> Visibility {
        match self {
            ViewMode::Single => Visibility::OnScreen,
            ViewMode::Grid => Visibility::Offscreen,
        }
    }
}

/// Operator settings for one session. Nothing in the pipeline reads global state.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub config: AppConfig,
    pub theme: ThemeColor,
    pub view_mode: ViewMode,
    pub variant: VariantChoice,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn layout_resolver(&self) -> LayoutResolver {
        LayoutResolver::new(
            self.config.institution.clone(),
            AvatarResolver::new(self.config.avatar.endpoint.clone()),
        )
    }

    pub fn orchestrator(&self) -> ExportOrchestrator {
        let fonts = FontStack::with_files(&self.config.render.fonts);
        let engine = CaptureEngine::new().with_fonts(fonts);
        ExportOrchestrator::new(engine, self.config.export.clone())
    }

    /// Resolve and realize one card per record, in order.
    pub fn prepare_cards(
        &self,
        records: &[&Record],
        arena: &mut CardArena,
        loader: &dyn PhotoLoader,
    ) -> IdCardResult<Vec<CaptureTarget>> {
        let resolver = self.layout_resolver();
        let visibility = self.view_mode.visibility();
        let mut targets = Vec::with_capacity(records.len());
        for record in records {
            let variant = self.variant.pick(&record.body);
            let layout = resolver.resolve(record, variant, self.theme)?;
            let natural_key = layout.natural_key.clone();
            let handle = arena.realize(layout, &resolver, loader, visibility);
            targets.push(CaptureTarget {
                handle,
                natural_key,
            });
        }
        Ok(targets)
    }
}
