//! Shared clap helper types for CLI commands.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use idcards::{CardVariant, Category, VariantChoice, ViewMode};

/// Card design selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VariantArg {
    Auto,
    Student,
    Bus,
    Faculty,
}

impl From<VariantArg> for VariantChoice {
    fn from(value: VariantArg) -> VariantChoice {
        match value {
            VariantArg::Auto => VariantChoice::Auto,
            VariantArg::Student => VariantChoice::Fixed(CardVariant::Student),
            VariantArg::Bus => VariantChoice::Fixed(CardVariant::BusStudent),
            VariantArg::Faculty => VariantChoice::Fixed(CardVariant::Faculty),
        }
    }
}

impl fmt::Display for VariantArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantArg::Auto => write!(f, "auto"),
            VariantArg::Student => write!(f, "student"),
            VariantArg::Bus => write!(f, "bus"),
            VariantArg::Faculty => write!(f, "faculty"),
        }
    }
}

/// Single card or thumbnail grid.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ViewArg {
    Single,
    Grid,
}

impl From<ViewArg> for ViewMode {
    fn from(value: ViewArg) -> ViewMode {
        match value {
            ViewArg::Single => ViewMode::Single,
            ViewArg::Grid => ViewMode::Grid,
        }
    }
}

impl fmt::Display for ViewArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewArg::Single => write!(f, "single"),
            ViewArg::Grid => write!(f, "grid"),
        }
    }
}

/// Record category for JSON export.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CategoryArg {
    Student,
    Faculty,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Category {
        match value {
            CategoryArg::Student => Category::Student,
            CategoryArg::Faculty => Category::Faculty,
        }
    }
}

/// Records file plus the category/year filter that picks cards.
#[derive(Args, Debug)]
pub struct SelectionArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
    /// `student`, `faculty`, `bus` or `all`.
    #[arg(short = 'c', long, default_value = "all")]
    pub category: String,
    /// Academic year, or `All`.
    #[arg(short = 'y', long, default_value = idcards::store::ALL_YEARS)]
    pub year: String,
}
