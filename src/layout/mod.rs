//! Record to card layout resolution.
//!
//! A [`CardLayout`] is a fully specified, surface-independent description of
//! one card: fixed geometry, placed fields, badges, symbols and the declared
//! avatar source. Painting it is the capture engine's job.

mod text;
mod theme;
mod variant;

use std::fmt::Write;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::avatar::{AvatarResolver, AvatarSource};
use crate::codes::{BarcodeSymbol, QrSymbol};
use crate::config::InstitutionConfig;
use crate::error::{IdCardError, IdCardResult};
use crate::records::{Record, RecordBody};

pub use text::{
    DEFAULT_AADHAAR, DEFAULT_BLOOD_GROUP, DEFAULT_BUS_HALT, DEFAULT_FIELD, DEFAULT_PAN, ELLIPSIS,
    FittedText, NAME_BASE_SIZE, NAME_BUDGET, NAME_TIERS, display_date, expand_department,
    fit_name,
};
pub use theme::ThemeColor;

/// The three card designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardVariant {
    Student,
    BusStudent,
    Faculty,
}

impl CardVariant {
    /// The design a record would naturally get.
    pub fn for_record(body: &RecordBody) -> Self {
        match body {
            RecordBody::Faculty(_) => CardVariant::Faculty,
            RecordBody::Student(s) if s.is_bus_student() => CardVariant::BusStudent,
            RecordBody::Student(_) => CardVariant::Student,
        }
    }

    pub fn geometry(self) -> Geometry {
        match self {
            CardVariant::Student | CardVariant::BusStudent => variant::PORTRAIT,
            CardVariant::Faculty => variant::LANDSCAPE,
        }
    }
}

/// Operator variant selection; `Auto` follows [`CardVariant::for_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantChoice {
    #[default]
    Auto,
    Fixed(CardVariant),
}

impl VariantChoice {
    pub fn pick(self, body: &RecordBody) -> CardVariant {
        match self {
            VariantChoice::Auto => CardVariant::for_record(body),
            VariantChoice::Fixed(v) => v,
        }
    }
}

/// Header/body/footer band heights in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bands {
    pub header: u32,
    pub body: u32,
    pub footer: u32,
}

/// Fixed card size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bands: Bands,
}

/// Placement rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Which record field a text block shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InstitutionName,
    Tagline,
    CardTitle,
    Name,
    LocalizedName,
    NaturalKey,
    Department,
    Course,
    Year,
    AcademicYear,
    DateOfBirth,
    BloodGroup,
    Aadhaar,
    Contact,
    Address,
    BusHalt,
    StudentCell,
    ParentCell,
    Designation,
    Qualification,
    JoiningDate,
    Email,
    PanNumber,
    FooterNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A single line of text bound to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub field: Field,
    pub label: Option<&'static str>,
    pub content: String,
    pub size: u32,
    pub color: Rgba<u8>,
    pub align: Align,
}

impl TextBlock {
    /// Text as painted, label included.
    pub fn rendered(&self) -> String {
        match self.label {
            Some(label) => format!("{label}: {}", self.content),
            None => self.content.clone(),
        }
    }
}

/// Where a bus participant badge sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgePlacement {
    CornerRibbon,
    FooterBanner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Fill(Rgba<u8>),
    Text(TextBlock),
    Avatar(AvatarSource),
    Barcode(BarcodeSymbol),
    /// Always computed; `visible == false` keeps it off the painted card.
    Qr { symbol: QrSymbol, visible: bool },
    BusBadge(BadgePlacement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub rect: Rect,
    pub element: Element,
}

/// Fully specified card for one record and one theme.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub variant: CardVariant,
    pub geometry: Geometry,
    pub theme: ThemeColor,
    pub natural_key: String,
    pub name: String,
    /// Paint order; later elements draw over earlier ones.
    pub elements: Vec<Placed>,
}

impl CardLayout {
    pub fn text_block(&self, field: Field) -> Option<&TextBlock> {
        self.elements.iter().find_map(|p| match &p.element {
            Element::Text(block) if block.field == field => Some(block),
            _ => None,
        })
    }

    /// Content of the block bound to `field`, without its label.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.text_block(field).map(|b| b.content.as_str())
    }

    pub fn bus_badges(&self) -> Vec<BadgePlacement> {
        self.elements
            .iter()
            .filter_map(|p| match p.element {
                Element::BusBadge(place) => Some(place),
                _ => None,
            })
            .collect()
    }

    pub fn avatar(&self) -> Option<&AvatarSource> {
        self.elements.iter().find_map(|p| match &p.element {
            Element::Avatar(source) => Some(source),
            _ => None,
        })
    }

    pub fn barcode(&self) -> Option<&BarcodeSymbol> {
        self.elements.iter().find_map(|p| match &p.element {
            Element::Barcode(symbol) => Some(symbol),
            _ => None,
        })
    }

    /// The QR symbol and whether it is painted.
    pub fn qr(&self) -> Option<(&QrSymbol, bool)> {
        self.elements.iter().find_map(|p| match &p.element {
            Element::Qr { symbol, visible } => Some((symbol, *visible)),
            _ => None,
        })
    }

    /// Multi-line human-readable summary.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        writeln!(
            &mut out,
            "{:?} card {} ({}x{}, theme {})",
            self.variant, self.natural_key, self.geometry.width, self.geometry.height, self.theme
        )
        .ok();
        for placed in &self.elements {
            let r = placed.rect;
            let what = match &placed.element {
                Element::Fill(_) => "fill".to_string(),
                Element::Text(block) => {
                    format!("{:?} [{}px] {}", block.field, block.size, block.rendered())
                }
                Element::Avatar(AvatarSource::Photo(uri)) => format!("photo {uri}"),
                Element::Avatar(AvatarSource::Placeholder(url)) => format!("placeholder {url}"),
                Element::Barcode(symbol) => {
                    format!("barcode {} ({} modules)", symbol.payload, symbol.modules.len())
                }
                Element::Qr { symbol, visible } => format!(
                    "qr {} ({}x{}){}",
                    symbol.payload,
                    symbol.width,
                    symbol.width,
                    if *visible { "" } else { " hidden" }
                ),
                Element::BusBadge(place) => format!("bus badge {place:?}"),
            };
            writeln!(&mut out, "  @({},{} {}x{}) {}", r.x, r.y, r.width, r.height, what).ok();
        }
        out
    }
}

/// Maps records to layouts.
#[derive(Debug, Clone)]
pub struct LayoutResolver {
    institution: InstitutionConfig,
    avatars: AvatarResolver,
}

impl LayoutResolver {
    pub fn new(institution: InstitutionConfig, avatars: AvatarResolver) -> Self {
        Self {
            institution,
            avatars,
        }
    }

    pub fn avatars(&self) -> &AvatarResolver {
        &self.avatars
    }

    /// Resolve `record` into the `variant` design using `theme`.
    pub fn resolve(
        &self,
        record: &Record,
        variant: CardVariant,
        theme: ThemeColor,
    ) -> IdCardResult<CardLayout> {
        let layout = match (&record.body, variant) {
            (RecordBody::Student(student), CardVariant::Student | CardVariant::BusStudent) => {
                variant::student(&self.institution, &self.avatars, student, variant, theme)
            }
            (RecordBody::Faculty(faculty), CardVariant::Faculty) => {
                variant::faculty(&self.institution, &self.avatars, faculty, theme)
            }
            (body, variant) => {
                return Err(IdCardError::VariantMismatch {
                    variant,
                    category: body.category().as_str(),
                });
            }
        };
        tracing::debug!(
            id = record.id,
            key = %layout.natural_key,
            ?variant,
            elements = layout.elements.len(),
            "card layout resolved"
        );
        Ok(layout)
    }
}
