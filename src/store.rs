//! Volatile in-memory record store.
//!
//! The store is the only owner of records. It is rebuilt empty on every
//! process start; nothing here touches the filesystem.

use crate::records::{Category, Record, RecordBody, RecordId, RecordPatch};

/// Year filter value meaning "do not filter by year".
pub const ALL_YEARS: &str = "All";

/// Category filter value that selects bus participants regardless of category.
pub const BUS_CATEGORY: &str = "bus";

/// In-memory collection of student and faculty records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
    next_id: RecordId,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create an empty store whose first assigned id is 1.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// The id the next insert will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record, assigning it the next id.
    pub fn insert_one(&mut self, body: RecordBody) -> &Record {
        let id = self.next_id;
        self.next_id += 1;
        tracing::debug!(id, key = body.natural_key(), "record inserted");
        self.records.push(Record { id, body });
        let last = self.records.len() - 1;
        &self.records[last]
    }

    /// Append records in input order. Each insert is independent; there is no rollback.
    pub fn insert_many<I>(&mut self, bodies: I) -> Vec<Record>
    where
        I: IntoIterator<Item = RecordBody>,
    {
        bodies
            .into_iter()
            .map(|body| self.insert_one(body).clone())
            .collect()
    }

    /// Merge `patch` into the record with `id`. Returns `false` when absent or of another kind.
    pub fn update(&mut self, id: RecordId, patch: RecordPatch) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => patch.apply(&mut record.body),
            None => false,
        }
    }

    /// Remove the record with `id`. Its id is never handed out again.
    pub fn delete(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// Drop every record. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// First record whose roll number or faculty ID equals `key`.
    pub fn find_by_natural_key(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.body.natural_key() == key)
    }

    /// Every record regardless of category, in insertion order.
    pub fn all(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.body.category() == category)
            .collect()
    }

    /// Records flagged as bus participants. Looks at the transport flag only.
    pub fn bus_students(&self) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.body.is_bus_student())
            .collect()
    }

    /// Category plus year filter.
    ///
    /// `year == "All"` filters by category alone. `category == "bus"` always
    /// returns [`bus_students`](Self::bus_students), whatever `year` says.
    /// An unknown category selects nothing.
    pub fn by_category_and_year(&self, category: &str, year: &str) -> Vec<&Record> {
        if category.eq_ignore_ascii_case(BUS_CATEGORY) {
            return self.bus_students();
        }
        let Some(category) = Category::parse(category) else {
            return Vec::new();
        };
        if year == ALL_YEARS {
            return self.by_category(category);
        }
        self.records
            .iter()
            .filter(|r| match &r.body {
                RecordBody::Student(s) if category == Category::Student => s.core.year == year,
                _ => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FacultyRecord, StudentPatch, StudentRecord, TransportProfile};
    use pretty_assertions::assert_eq;

    fn student(roll: &str, year: &str, bus: bool) -> RecordBody {
        let mut s = StudentRecord::default();
        s.core.roll_number = roll.to_string();
        s.core.name = format!("Student {roll}");
        s.core.year = year.to_string();
        if bus {
            s.transport = Some(TransportProfile::default());
        }
        RecordBody::Student(s)
    }

    fn faculty(id: &str) -> RecordBody {
        RecordBody::Faculty(FacultyRecord {
            faculty_id: id.to_string(),
            name: format!("Faculty {id}"),
            ..FacultyRecord::default()
        })
    }

    fn keys(records: &[&Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.body.natural_key().to_string())
            .collect()
    }

    #[test]
    fn insert_many_assigns_consecutive_ids_after_prior_counter() {
        let mut store = RecordStore::new();
        store.insert_one(student("A", "I", false));
        store.insert_one(student("B", "I", false));
        store.delete(2);
        let start = store.next_id();
        let inserted = store.insert_many(vec![
            student("C", "I", false),
            faculty("F1"),
            student("D", "II", true),
        ]);
        let ids: Vec<RecordId> = inserted.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![start, start + 1, start + 2]);
        assert_eq!(store.next_id(), start + 3);
    }

    #[test]
    fn deleted_ids_are_never_revived() {
        let mut store = RecordStore::new();
        let id = store.insert_one(student("A", "I", false)).id;
        assert!(store.delete(id));
        assert!(!store.delete(id));
        let next = store.insert_one(student("B", "I", false)).id;
        assert!(next > id);
        store.clear();
        assert!(store.is_empty());
        assert!(store.insert_one(student("C", "I", false)).id > next);
    }

    #[test]
    fn update_on_unknown_id_reports_failure() {
        let mut store = RecordStore::new();
        let patch = RecordPatch::Student(StudentPatch::default());
        assert!(!store.update(99, patch));
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let mut store = RecordStore::new();
        let id = store.insert_one(student("A", "I", false)).id;
        let ok = store.update(
            id,
            RecordPatch::Student(StudentPatch {
                blood_group: Some("B+".to_string()),
                transport: Some(Some(TransportProfile {
                    bus_halt: "Rajahmundry".to_string(),
                    ..TransportProfile::default()
                })),
                ..StudentPatch::default()
            }),
        );
        assert!(ok);
        let RecordBody::Student(s) = &store.get(id).unwrap().body else {
            panic!("expected student");
        };
        assert_eq!(s.core.blood_group, "B+");
        assert_eq!(s.core.roll_number, "A");
        assert_eq!(s.core.year, "I");
        assert!(s.is_bus_student());
    }

    #[test]
    fn bus_category_overrides_year_and_category() {
        let mut store = RecordStore::new();
        store.insert_many(vec![
            student("A", "I", true),
            student("B", "II", false),
            faculty("F1"),
            student("C", "III", true),
        ]);
        let bus = keys(&store.bus_students());
        assert_eq!(bus, vec!["A", "C"]);
        for year in ["All", "I", "IV", ""] {
            assert_eq!(keys(&store.by_category_and_year("bus", year)), bus);
        }
    }

    #[test]
    fn year_filter_applies_within_category() {
        let mut store = RecordStore::new();
        store.insert_many(vec![
            student("A", "I", false),
            student("B", "II", false),
            faculty("F1"),
            student("C", "II", true),
        ]);
        assert_eq!(keys(&store.by_category_and_year("student", "II")), vec!["B", "C"]);
        assert_eq!(
            keys(&store.by_category_and_year("student", ALL_YEARS)),
            vec!["A", "B", "C"]
        );
        assert_eq!(keys(&store.by_category_and_year("faculty", "All")), vec!["F1"]);
        assert!(store.by_category_and_year("faculty", "II").is_empty());
        assert!(store.by_category_and_year("alumni", "All").is_empty());
    }

    #[test]
    fn repeated_queries_are_identical() {
        let mut store = RecordStore::new();
        store.insert_many(vec![student("A", "I", true), faculty("F1")]);
        assert_eq!(store.all(), store.all());
        assert_eq!(
            store.by_category_and_year("student", "I"),
            store.by_category_and_year("student", "I")
        );
    }
}
