//! Text rules for card fields: name sizing, defaults, department names, dates.

use chrono::NaiveDate;

/// Name size tiers, checked top-down. The first tier whose threshold the
/// name length exceeds supplies the font size.
pub const NAME_TIERS: [(usize, u32); 3] = [(40, 10), (30, 12), (20, 14)];
/// Size used when no tier matches.
pub const NAME_BASE_SIZE: u32 = 16;
/// Names longer than the largest tier threshold keep this many characters.
pub const NAME_BUDGET: usize = 40;
pub const ELLIPSIS: &str = "...";

pub const DEFAULT_BLOOD_GROUP: &str = "N/A";
pub const DEFAULT_BUS_HALT: &str = "Not Assigned";
pub const DEFAULT_PAN: &str = "Not Available";
pub const DEFAULT_AADHAAR: &str = "Not Available";
/// Fallback for any other empty field.
pub const DEFAULT_FIELD: &str = "-";

/// Display text plus the font size selected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedText {
    pub text: String,
    pub size: u32,
}

/// Pick a size tier for `name` and truncate it when it exceeds every tier.
///
/// Length is counted in characters, so the result does not depend on how a
/// surface would wrap or measure the text.
pub fn fit_name(name: &str) -> FittedText {
    let name = name.trim();
    let len = name.chars().count();
    let size = NAME_TIERS
        .iter()
        .find(|(threshold, _)| len > *threshold)
        .map(|(_, size)| *size)
        .unwrap_or(NAME_BASE_SIZE);
    let largest = NAME_TIERS
        .iter()
        .map(|(threshold, _)| *threshold)
        .max()
        .unwrap_or(NAME_BUDGET);
    let text = if len > largest {
        let mut cut: String = name.chars().take(NAME_BUDGET).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        name.to_string()
    };
    FittedText { text, size }
}

/// `value` unless it is blank, otherwise `default`.
pub fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn opt_or_default(value: Option<&str>, default: &str) -> String {
    or_default(value.unwrap_or(""), default)
}

static DEPARTMENTS: &[(&str, &str)] = &[
    ("CSE", "Computer Science & Engineering"),
    ("CSM", "CSE (Artificial Intelligence & Machine Learning)"),
    ("CSD", "CSE (Data Science)"),
    ("AIML", "Artificial Intelligence & Machine Learning"),
    ("AIDS", "Artificial Intelligence & Data Science"),
    ("IT", "Information Technology"),
    ("ECE", "Electronics & Communication Engineering"),
    ("EEE", "Electrical & Electronics Engineering"),
    ("MECH", "Mechanical Engineering"),
    ("CIVIL", "Civil Engineering"),
    ("MBA", "Master of Business Administration"),
    ("MCA", "Master of Computer Applications"),
    ("BSH", "Basic Sciences & Humanities"),
];

/// Expand a department code to its full name. Unknown codes pass through verbatim.
pub fn expand_department(code: &str) -> String {
    let key = code.trim();
    DEPARTMENTS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(key))
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Show ISO dates as `DD-MM-YYYY`; anything else is returned unchanged.
pub fn display_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
