use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::api::{CareerId, StudentCareerRecord};

pub const EDUCATION_LEVELS: [&str; 6] = [
    "TECHNICAL",
    "TECHNOLOGICAL",
    "UNDERGRADUATE",
    "SPECIALIZATION",
    "MASTERS",
    "DOCTORATE",
];

pub const ENROLLMENT_STATUSES: [&str; 5] = ["ACTIVO", "GRADUADO", "RETIRADO", "SUSPENDIDO", "EN_PAUSA"];

static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entry_key() -> String {
    let id = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("new-{id:04}")
}

/// Field values of a persisted enrollment as they were when editing started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentSnapshot {
    pub career_id: Option<CareerId>,
    pub status: String,
    pub semester: String,
    pub start_date: String,
    pub end_date: String,
}

/// One editable row of the education form. Values stay as typed until saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationEntry {
    pub key: String,
    pub university_id: String,
    pub university_name: Option<String>,
    pub career_id: String,
    pub career_name: Option<String>,
    pub level: String,
    pub status: String,
    pub semester: String,
    pub start_date: String,
    pub end_date: String,
    pub original: Option<EnrollmentSnapshot>,
}

impl EducationEntry {
    pub fn blank() -> Self {
        Self {
            key: next_entry_key(),
            university_id: String::new(),
            university_name: None,
            career_id: String::new(),
            career_name: None,
            level: String::new(),
            status: String::new(),
            semester: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            original: None,
        }
    }

    /// Builds the row for the `index`-th persisted enrollment.
    pub fn from_record(record: &StudentCareerRecord, index: usize) -> Self {
        let career = record.career.as_ref();
        let university = record.resolved_university();
        let career_id = record.resolved_career_id();
        let status = record.status.clone().unwrap_or_default();
        let semester = record
            .semester
            .filter(|semester| *semester != 0)
            .map(|semester| semester.to_string())
            .unwrap_or_default();
        let start_date = date_part(record.start_date.as_deref());
        let end_date = date_part(record.end_date.as_deref());

        Self {
            key: match career_id {
                Some(id) => format!("{id}-{index}"),
                None => format!("career-{index}"),
            },
            university_id: record
                .resolved_university_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            university_name: university.and_then(|university| university.name.clone()),
            career_id: career_id.map(|id| id.to_string()).unwrap_or_default(),
            career_name: career.and_then(|career| career.name.clone()),
            level: career
                .and_then(|career| career.level.clone())
                .unwrap_or_default(),
            original: Some(EnrollmentSnapshot {
                career_id,
                status: status.clone(),
                semester: semester.clone(),
                start_date: start_date.clone(),
                end_date: end_date.clone(),
            }),
            status,
            semester,
            start_date,
            end_date,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.original.is_some()
    }

    /// Career id the backend knows this row by, if any.
    pub fn persisted_career_id(&self) -> Option<CareerId> {
        self.original.as_ref().and_then(|original| original.career_id)
    }

    /// True when no field was filled in.
    pub fn is_blank(&self) -> bool {
        [
            &self.university_id,
            &self.career_id,
            &self.level,
            &self.status,
            &self.semester,
            &self.start_date,
            &self.end_date,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }

    /// Changing the university invalidates the selected program.
    pub fn set_university(&mut self, university_id: impl Into<String>) {
        self.university_id = university_id.into();
        self.university_name = None;
        self.clear_career();
    }

    pub fn set_level(&mut self, level: impl Into<String>) {
        self.level = level.into();
        self.clear_career();
    }

    pub fn set_career(&mut self, career_id: impl Into<String>, name: Option<String>) {
        self.career_id = career_id.into();
        self.career_name = name;
    }

    /// Whether status, semester or dates differ from the persisted snapshot.
    pub fn metadata_changed(&self) -> bool {
        match &self.original {
            Some(original) => {
                self.status != original.status
                    || self.semester != original.semester
                    || self.start_date != original.start_date
                    || self.end_date != original.end_date
            }
            None => true,
        }
    }

    /// Takes the current values as the persisted snapshot.
    pub fn mark_saved(&mut self) {
        self.original = Some(EnrollmentSnapshot {
            career_id: self.career_id.trim().parse().ok(),
            status: self.status.clone(),
            semester: self.semester.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        });
    }

    fn clear_career(&mut self) {
        self.career_id.clear();
        self.career_name = None;
    }
}

/// `YYYY-MM-DD` prefix of an ISO timestamp.
fn date_part(raw: Option<&str>) -> String {
    raw.map(|value| value.chars().take(10).collect())
        .unwrap_or_default()
}
