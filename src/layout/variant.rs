//! Fixed geometry and field placement for each card design.

use image::Rgba;

use super::text::{
    DEFAULT_AADHAAR, DEFAULT_BLOOD_GROUP, DEFAULT_BUS_HALT, DEFAULT_FIELD, DEFAULT_PAN,
    display_date, expand_department, fit_name, opt_or_default, or_default,
};
use super::{
    Align, BadgePlacement, Bands, CardLayout, CardVariant, Element, Field, Geometry, Placed, Rect,
    TextBlock, ThemeColor,
};
use crate::avatar::AvatarResolver;
use crate::codes::{QR_SIZE, barcode_for, qr_for};
use crate::config::InstitutionConfig;
use crate::records::{FacultyRecord, StudentRecord, TransportProfile};

/// Student and bus-student cards: 54 x 85 mm portrait.
pub(super) const PORTRAIT: Geometry = Geometry {
    width: 350,
    height: 550,
    bands: Bands {
        header: 110,
        body: 380,
        footer: 60,
    },
};

/// Faculty cards: 85 x 54 mm landscape.
pub(super) const LANDSCAPE: Geometry = Geometry {
    width: 550,
    height: 350,
    bands: Bands {
        header: 80,
        body: 230,
        footer: 40,
    },
};

const BODY_TEXT: Rgba<u8> = Rgba([0x1f, 0x29, 0x37, 0xff]);
const FIELD_SIZE: u32 = 10;
const MAX_BARCODE_WIDTH: u32 = 310;
const FOOTER_NOTE: &str = "If found, please return to the institution office";

/// A labelled body row.
type Row = (Field, &'static str, String);

/// Accumulates placed elements in paint order.
struct Builder {
    elements: Vec<Placed>,
}

impl Builder {
    fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    fn place(&mut self, rect: Rect, element: Element) {
        self.elements.push(Placed { rect, element });
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        rect: Rect,
        field: Field,
        label: Option<&'static str>,
        content: String,
        size: u32,
        color: Rgba<u8>,
        align: Align,
    ) {
        self.place(
            rect,
            Element::Text(TextBlock {
                field,
                label,
                content,
                size,
                color,
                align,
            }),
        );
    }

    /// Labelled body rows stacked from `top`, one every `step` pixels.
    fn rows(&mut self, x: i32, top: i32, width: u32, step: i32, rows: Vec<Row>) {
        for (idx, (field, label, content)) in rows.into_iter().enumerate() {
            let y = top + idx as i32 * step;
            self.text(
                Rect::new(x, y, width, step as u32),
                field,
                Some(label),
                content,
                FIELD_SIZE,
                BODY_TEXT,
                Align::Left,
            );
        }
    }

    /// Unlabelled single line.
    fn line(&mut self, rect: Rect, field: Field, content: String, size: u32, color: Rgba<u8>) {
        self.text(rect, field, None, content, size, color, Align::Left);
    }

    fn centered(&mut self, rect: Rect, field: Field, content: String, size: u32, color: Rgba<u8>) {
        self.text(rect, field, None, content, size, color, Align::Center);
    }

    fn barcode(&mut self, payload: &str, x_center: i32, y: i32, max_width: u32) {
        if let Some(symbol) = barcode_for(payload) {
            let width = symbol.width().min(max_width);
            let rect = Rect::new(x_center - width as i32 / 2, y, width, symbol.height());
            self.place(rect, Element::Barcode(symbol));
        }
    }

    fn qr(&mut self, payload: &str, rect: Rect, visible: bool) {
        if let Some(symbol) = qr_for(payload) {
            self.place(rect, Element::Qr { symbol, visible });
        }
    }
}

fn header(
    b: &mut Builder,
    institution: &InstitutionConfig,
    geometry: Geometry,
    theme: ThemeColor,
    title: &str,
) {
    let w = geometry.width;
    let ink = theme.contrast_text();
    b.place(Rect::new(0, 0, w, geometry.bands.header), Element::Fill(theme.rgba()));
    let title_y = geometry.bands.header as i32 - 28;
    let name = institution.name.clone();
    b.centered(Rect::new(10, 12, w - 20, 20), Field::InstitutionName, name, 14, ink);
    let tagline = institution.tagline.clone();
    b.centered(Rect::new(10, 36, w - 20, 12), Field::Tagline, tagline, 7, ink);
    b.centered(Rect::new(10, title_y, w - 20, 18), Field::CardTitle, title.to_string(), 12, ink);
}

fn footer_band(b: &mut Builder, geometry: Geometry, theme: ThemeColor) -> i32 {
    let top = (geometry.height - geometry.bands.footer) as i32;
    b.place(
        Rect::new(0, top, geometry.width, geometry.bands.footer),
        Element::Fill(theme.rgba()),
    );
    top
}

pub(super) fn student(
    institution: &InstitutionConfig,
    avatars: &AvatarResolver,
    student: &StudentRecord,
    variant: CardVariant,
    theme: ThemeColor,
) -> CardLayout {
    let geometry = PORTRAIT;
    let core = &student.core;
    let is_bus = student.is_bus_student();
    let w = geometry.width;
    let mut b = Builder::new();

    let title = match variant {
        CardVariant::BusStudent => "STUDENT BUS PASS",
        _ => "STUDENT IDENTITY CARD",
    };
    header(&mut b, institution, geometry, theme, title);

    b.place(
        Rect::new(125, 120, 100, 120),
        Element::Avatar(avatars.declare(&core.photo, &core.name)),
    );
    // Hidden in this design but still computed.
    b.qr(&institution.website_url, Rect::new(260, 130, QR_SIZE, QR_SIZE), false);

    let fitted = fit_name(&core.name);
    let name_rect = Rect::new(10, 248, w - 20, 26);
    b.centered(name_rect, Field::Name, fitted.text, fitted.size, theme.rgba());
    let roll = or_default(&core.roll_number, DEFAULT_FIELD);
    b.centered(Rect::new(10, 276, w - 20, 18), Field::NaturalKey, roll, 13, BODY_TEXT);

    let rows = match variant {
        CardVariant::BusStudent => {
            let empty = TransportProfile::default();
            bus_rows(student, student.transport.as_ref().unwrap_or(&empty))
        }
        _ => student_rows(student),
    };
    b.rows(24, 300, w - 48, 16, rows);

    b.barcode(&core.roll_number, w as i32 / 2, 432, MAX_BARCODE_WIDTH);

    let footer_top = footer_band(&mut b, geometry, theme);
    let ink = theme.contrast_text();
    if is_bus {
        // Both badges hang off the same flag.
        b.place(Rect::new(262, 0, 88, 22), Element::BusBadge(BadgePlacement::CornerRibbon));
        b.place(Rect::new(0, footer_top, w, 28), Element::BusBadge(BadgePlacement::FooterBanner));
    }
    let note_y = footer_top + if is_bus { 34 } else { 22 };
    let note = FOOTER_NOTE.to_string();
    b.centered(Rect::new(10, note_y, w - 20, 14), Field::FooterNote, note, 7, ink);

    CardLayout {
        variant,
        geometry,
        theme,
        natural_key: core.roll_number.clone(),
        name: core.name.clone(),
        elements: b.elements,
    }
}

pub(super) fn faculty(
    institution: &InstitutionConfig,
    avatars: &AvatarResolver,
    faculty: &FacultyRecord,
    theme: ThemeColor,
) -> CardLayout {
    let geometry = LANDSCAPE;
    let w = geometry.width;
    let mut b = Builder::new();

    header(&mut b, institution, geometry, theme, "FACULTY IDENTITY CARD");

    b.place(
        Rect::new(20, 92, 110, 130),
        Element::Avatar(avatars.declare(&faculty.photo, &faculty.name)),
    );
    b.barcode(&faculty.faculty_id, 75, 236, 120);

    let fitted = fit_name(&faculty.name);
    b.line(Rect::new(145, 90, 385, 22), Field::Name, fitted.text, fitted.size, theme.rgba());
    let mut top = 114;
    if let Some(local) = faculty.telugu_name.as_deref().filter(|n| !n.trim().is_empty()) {
        let local = local.trim().to_string();
        b.line(Rect::new(145, top, 385, 14), Field::LocalizedName, local, 11, BODY_TEXT);
        top += 16;
    }
    b.text(
        Rect::new(145, top, 385, 14),
        Field::NaturalKey,
        Some("ID"),
        or_default(&faculty.faculty_id, DEFAULT_FIELD),
        12,
        BODY_TEXT,
        Align::Left,
    );
    top += 18;
    b.rows(145, top, 290, 14, faculty_rows(faculty));

    let profile = format!(
        "{}/{}",
        institution.faculty_profile_base.trim_end_matches('/'),
        faculty.faculty_id
    );
    b.qr(&profile, Rect::new(450, 200, QR_SIZE, QR_SIZE), true);

    let footer_top = footer_band(&mut b, geometry, theme);
    let note = FOOTER_NOTE.to_string();
    let ink = theme.contrast_text();
    b.centered(Rect::new(10, footer_top + 13, w - 20, 14), Field::FooterNote, note, 7, ink);

    CardLayout {
        variant: CardVariant::Faculty,
        geometry,
        theme,
        natural_key: faculty.faculty_id.clone(),
        name: faculty.name.clone(),
        elements: b.elements,
    }
}

#[rustfmt::skip]
fn student_rows(student: &StudentRecord) -> Vec<Row> {
    let core = &student.core;
    let dept = expand_department(&or_default(&core.department, DEFAULT_FIELD));
    vec![
        (Field::Department, "Dept", dept),
        (Field::Course, "Course", or_default(&core.course, DEFAULT_FIELD)),
        (Field::Year, "Year", or_default(&core.year, DEFAULT_FIELD)),
        (Field::AcademicYear, "Batch", or_default(&core.academic_year, DEFAULT_FIELD)),
        (Field::DateOfBirth, "DOB", display_date(&or_default(&core.dob, DEFAULT_FIELD))),
        (Field::BloodGroup, "Blood Group", or_default(&core.blood_group, DEFAULT_BLOOD_GROUP)),
        (Field::Aadhaar, "Aadhaar", or_default(&core.aadhaar, DEFAULT_AADHAAR)),
        (Field::Address, "Address", or_default(&core.address, DEFAULT_FIELD)),
    ]
}

#[rustfmt::skip]
fn bus_rows(student: &StudentRecord, t: &TransportProfile) -> Vec<Row> {
    let core = &student.core;
    let dept = expand_department(&or_default(&core.department, DEFAULT_FIELD));
    vec![
        (Field::Department, "Dept", dept),
        (Field::Year, "Year", or_default(&core.year, DEFAULT_FIELD)),
        (Field::BloodGroup, "Blood Group", or_default(&core.blood_group, DEFAULT_BLOOD_GROUP)),
        (Field::BusHalt, "Bus Halt", or_default(&t.bus_halt, DEFAULT_BUS_HALT)),
        (Field::StudentCell, "Student Cell", or_default(&t.student_cell_no, DEFAULT_FIELD)),
        (Field::ParentCell, "Parent Cell", or_default(&t.parent_cell_no, DEFAULT_FIELD)),
        (Field::Contact, "Contact", or_default(&core.contact, DEFAULT_FIELD)),
        (Field::Address, "Address", or_default(&core.address, DEFAULT_FIELD)),
    ]
}

#[rustfmt::skip]
fn faculty_rows(f: &FacultyRecord) -> Vec<Row> {
    vec![
        (Field::Designation, "Designation", or_default(&f.designation, DEFAULT_FIELD)),
        (Field::Department, "Dept", expand_department(&or_default(&f.department, DEFAULT_FIELD))),
        (Field::Qualification, "Qualification", or_default(&f.qualification, DEFAULT_FIELD)),
        (Field::JoiningDate, "Joined", display_date(&or_default(&f.joining_date, DEFAULT_FIELD))),
        (Field::BloodGroup, "Blood Group", or_default(&f.blood_group, DEFAULT_BLOOD_GROUP)),
        (Field::Contact, "Contact", or_default(&f.contact, DEFAULT_FIELD)),
        (Field::Email, "Email", or_default(&f.email, DEFAULT_FIELD)),
        (Field::PanNumber, "PAN", opt_or_default(f.pan_number.as_deref(), DEFAULT_PAN)),
        (Field::Aadhaar, "Aadhaar", opt_or_default(f.aadhaar.as_deref(), DEFAULT_AADHAAR)),
    ]
}
