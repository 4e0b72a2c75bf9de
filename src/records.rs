//! Student and faculty record types plus their JSON wire format.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned identifier. Never reused once handed out.
pub type RecordId = u64;

/// Record category tag, serialized as the `category` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Student,
    Faculty,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Student => "student",
            Category::Faculty => "faculty",
        }
    }

    /// Case-insensitive parse of `student` / `faculty`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Category::Student),
            "faculty" => Some(Category::Faculty),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields every student carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStudent {
    pub roll_number: String,
    pub name: String,
    pub department: String,
    pub course: String,
    pub year: String,
    pub academic_year: String,
    pub dob: String,
    pub blood_group: String,
    pub aadhaar: String,
    pub contact: String,
    pub address: String,
    /// Photo URI or path; empty when none was supplied.
    pub photo: String,
}

/// Bus-service extension. Its presence is what makes a student a bus student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportProfile {
    pub bus_halt: String,
    pub student_cell_no: String,
    pub parent_cell_no: String,
}

/// A student without its store id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StudentWire", into = "StudentWire")]
pub struct StudentRecord {
    pub core: CoreStudent,
    pub transport: Option<TransportProfile>,
}

impl StudentRecord {
    pub fn is_bus_student(&self) -> bool {
        self.transport.is_some()
    }
}

/// Flat camelCase shape used on import and in JSON exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StudentWire {
    roll_number: String,
    name: String,
    department: String,
    course: String,
    year: String,
    academic_year: String,
    dob: String,
    blood_group: String,
    aadhaar: String,
    contact: String,
    address: String,
    photo: String,
    is_bus_student: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bus_halt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    student_cell_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_cell_no: Option<String>,
}

impl From<StudentWire> for StudentRecord {
    fn from(w: StudentWire) -> Self {
        let transport = w.is_bus_student.then(|| TransportProfile {
            bus_halt: w.bus_halt.unwrap_or_default(),
            student_cell_no: w.student_cell_no.unwrap_or_default(),
            parent_cell_no: w.parent_cell_no.unwrap_or_default(),
        });
        Self {
            core: CoreStudent {
                roll_number: w.roll_number,
                name: w.name,
                department: w.department,
                course: w.course,
                year: w.year,
                academic_year: w.academic_year,
                dob: w.dob,
                blood_group: w.blood_group,
                aadhaar: w.aadhaar,
                contact: w.contact,
                address: w.address,
                photo: w.photo,
            },
            transport,
        }
    }
}

impl From<StudentRecord> for StudentWire {
    fn from(s: StudentRecord) -> Self {
        let c = s.core;
        let is_bus_student = s.transport.is_some();
        let t = s.transport;
        Self {
            roll_number: c.roll_number,
            name: c.name,
            department: c.department,
            course: c.course,
            year: c.year,
            academic_year: c.academic_year,
            dob: c.dob,
            blood_group: c.blood_group,
            aadhaar: c.aadhaar,
            contact: c.contact,
            address: c.address,
            photo: c.photo,
            is_bus_student,
            bus_halt: t.as_ref().map(|t| t.bus_halt.clone()),
            student_cell_no: t.as_ref().map(|t| t.student_cell_no.clone()),
            parent_cell_no: t.map(|t| t.parent_cell_no),
        }
    }
}

/// A faculty member without its store id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacultyRecord {
    pub faculty_id: String,
    pub name: String,
    pub department: String,
    pub designation: String,
    pub qualification: String,
    pub joining_date: String,
    pub blood_group: String,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aadhaar: Option<String>,
    /// Name in the regional script, printed beneath the primary name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telugu_name: Option<String>,
}

/// Record payload tagged by `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum RecordBody {
    Student(StudentRecord),
    Faculty(FacultyRecord),
}

/// Rejection raised by importers before a record reaches the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{category} record is missing required field '{field}'")]
    MissingField {
        category: Category,
        field: &'static str,
    },
}

impl RecordBody {
    pub fn category(&self) -> Category {
        match self {
            RecordBody::Student(_) => Category::Student,
            RecordBody::Faculty(_) => Category::Faculty,
        }
    }

    /// Roll number or faculty ID.
    pub fn natural_key(&self) -> &str {
        match self {
            RecordBody::Student(s) => &s.core.roll_number,
            RecordBody::Faculty(f) => &f.faculty_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RecordBody::Student(s) => &s.core.name,
            RecordBody::Faculty(f) => &f.name,
        }
    }

    pub fn photo(&self) -> &str {
        match self {
            RecordBody::Student(s) => &s.core.photo,
            RecordBody::Faculty(f) => &f.photo,
        }
    }

    pub fn is_bus_student(&self) -> bool {
        matches!(self, RecordBody::Student(s) if s.is_bus_student())
    }

    /// Check the identifying fields an importer must supply.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let category = self.category();
        let key_field = match self {
            RecordBody::Student(_) => "rollNumber",
            RecordBody::Faculty(_) => "facultyId",
        };
        if self.natural_key().trim().is_empty() {
            return Err(ValidationError::MissingField {
                category,
                field: key_field,
            });
        }
        if self.name().trim().is_empty() {
            return Err(ValidationError::MissingField {
                category,
                field: "name",
            });
        }
        Ok(())
    }
}

/// A record owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub body: RecordBody,
}

/// Partial update for a student. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub roll_number: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    pub year: Option<String>,
    pub academic_year: Option<String>,
    pub dob: Option<String>,
    pub blood_group: Option<String>,
    pub aadhaar: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
    /// `Some(None)` withdraws the student from bus service.
    pub transport: Option<Option<TransportProfile>>,
}

/// Partial update for a faculty member. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct FacultyPatch {
    pub faculty_id: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub qualification: Option<String>,
    pub joining_date: Option<String>,
    pub blood_group: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar: Option<String>,
    pub telugu_name: Option<String>,
}

/// Partial update addressed to one record kind.
#[derive(Debug, Clone)]
pub enum RecordPatch {
    Student(StudentPatch),
    Faculty(FacultyPatch),
}

fn merge(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn merge_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

impl RecordPatch {
    /// Merge into `body`. Returns `false` when the patch targets the other kind.
    pub(crate) fn apply(self, body: &mut RecordBody) -> bool {
        match (self, body) {
            (RecordPatch::Student(p), RecordBody::Student(s)) => {
                let c = &mut s.core;
                merge(&mut c.roll_number, p.roll_number);
                merge(&mut c.name, p.name);
                merge(&mut c.department, p.department);
                merge(&mut c.course, p.course);
                merge(&mut c.year, p.year);
                merge(&mut c.academic_year, p.academic_year);
                merge(&mut c.dob, p.dob);
                merge(&mut c.blood_group, p.blood_group);
                merge(&mut c.aadhaar, p.aadhaar);
                merge(&mut c.contact, p.contact);
                merge(&mut c.address, p.address);
                merge(&mut c.photo, p.photo);
                if let Some(transport) = p.transport {
                    s.transport = transport;
                }
                true
            }
            (RecordPatch::Faculty(p), RecordBody::Faculty(f)) => {
                merge(&mut f.faculty_id, p.faculty_id);
                merge(&mut f.name, p.name);
                merge(&mut f.department, p.department);
                merge(&mut f.designation, p.designation);
                merge(&mut f.qualification, p.qualification);
                merge(&mut f.joining_date, p.joining_date);
                merge(&mut f.blood_group, p.blood_group);
                merge(&mut f.contact, p.contact);
                merge(&mut f.email, p.email);
                merge(&mut f.address, p.address);
                merge(&mut f.photo, p.photo);
                merge_opt(&mut f.pan_number, p.pan_number);
                merge_opt(&mut f.aadhaar, p.aadhaar);
                merge_opt(&mut f.telugu_name, p.telugu_name);
                true
            }
            _ => false,
        }
    }
}
