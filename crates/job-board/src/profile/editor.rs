use std::sync::Arc;

use tracing::{info, warn};

use super::entry::EducationEntry;
use super::reconcile::{
    apply_education_plan, plan_education_changes, EducationError, EnrollmentGateway,
};
use crate::api::{Student, StudentCareerRecord, StudentUpdate};
use crate::notify::Toasts;

pub const PROFILE_SAVED_MESSAGE: &str = "Profile updated successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub requests: usize,
}

/// Student profile edit session: contact fields plus the education rows.
#[derive(Debug)]
pub struct ProfileEditor<G> {
    gateway: G,
    student_id: String,
    toasts: Arc<Toasts>,
    persisted: Vec<StudentCareerRecord>,
    entries: Vec<EducationEntry>,
    contact: StudentUpdate,
    editing: bool,
}

impl<G: EnrollmentGateway> ProfileEditor<G> {
    pub fn new(gateway: G, student_id: impl Into<String>, toasts: Arc<Toasts>) -> Self {
        Self {
            gateway,
            student_id: student_id.into(),
            toasts,
            persisted: Vec::new(),
            entries: Vec::new(),
            contact: StudentUpdate::default(),
            editing: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn entries(&self) -> &[EducationEntry] {
        &self.entries
    }

    pub fn entry_mut(&mut self, key: &str) -> Option<&mut EducationEntry> {
        self.entries.iter_mut().find(|entry| entry.key == key)
    }

    pub fn contact_mut(&mut self) -> &mut StudentUpdate {
        &mut self.contact
    }

    /// Starts editing from the server's view of the student and their enrollments.
    pub fn begin_edit(&mut self, student: Option<&Student>, records: Vec<StudentCareerRecord>) {
        self.contact = student.map(StudentUpdate::from_student).unwrap_or_default();
        self.load_rows(records);
        self.editing = true;
    }

    /// Edits again on top of the rows reloaded by the last save.
    pub fn resume_edit(&mut self) {
        self.editing = true;
    }

    pub fn add_entry(&mut self) -> String {
        let entry = EducationEntry::blank();
        let key = entry.key.clone();
        self.entries.push(entry);
        key
    }

    /// Drops a row locally. The form always keeps at least one row.
    pub fn remove_entry(&mut self, key: &str) {
        self.entries.retain(|entry| entry.key != key);
        if self.entries.is_empty() {
            self.entries.push(EducationEntry::blank());
        }
    }

    /// Deletes a persisted enrollment right away; unsaved rows are only dropped locally.
    pub async fn remove_persisted(&mut self, key: &str) -> Result<(), EducationError> {
        if self.student_id.is_empty() {
            return Err(EducationError::MissingStudent);
        }
        let career_id = self
            .entries
            .iter()
            .find(|entry| entry.key == key)
            .and_then(EducationEntry::persisted_career_id);

        if let Some(career_id) = career_id {
            self.gateway
                .remove_career(&self.student_id, career_id)
                .await
                .map_err(EducationError::Remove)?;
            self.persisted
                .retain(|record| record.resolved_career_id() != Some(career_id));
            info!(student = %self.student_id, career = career_id, "enrollment removed");
        }
        self.remove_entry(key);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.editing = false;
    }

    /// Validates everything, applies the enrollment changes, then patches the contact fields.
    pub async fn save(&mut self) -> Result<SaveReport, EducationError> {
        if !self.editing {
            return Err(EducationError::NotEditing);
        }
        if self.student_id.is_empty() {
            return Err(EducationError::MissingStudent);
        }
        let plan = plan_education_changes(&self.entries, &self.persisted)?;

        let outcome = async {
            let mut requests = apply_education_plan(&self.gateway, &self.student_id, &plan).await?;
            self.gateway
                .update_student(&self.student_id, &self.contact)
                .await
                .map_err(EducationError::Student)?;
            requests += 1;
            Ok::<_, EducationError>(requests)
        }
        .await;

        match outcome {
            Ok(requests) => {
                self.editing = false;
                self.reload_rows().await;
                self.toasts.success(PROFILE_SAVED_MESSAGE);
                info!(student = %self.student_id, requests, "profile saved");
                Ok(SaveReport { requests })
            }
            Err(err) => {
                self.toasts.error(err.to_string());
                Err(err)
            }
        }
    }

    fn load_rows(&mut self, records: Vec<StudentCareerRecord>) {
        self.entries = if records.is_empty() {
            vec![EducationEntry::blank()]
        } else {
            records
                .iter()
                .enumerate()
                .map(|(index, record)| EducationEntry::from_record(record, index))
                .collect()
        };
        self.persisted = records;
    }

    /// Rebuilds the rows from the server. If that read fails, the saved rows are
    /// taken as persisted locally so they are not created again.
    async fn reload_rows(&mut self) {
        let reloaded = self.gateway.enrollments(&self.student_id).await;
        match reloaded {
            Ok(records) => self.load_rows(records),
            Err(err) => {
                warn!(student = %self.student_id, error = %err, "could not reload enrollments after save");
                self.entries.retain(|entry| !entry.is_blank());
                for entry in &mut self.entries {
                    entry.mark_saved();
                }
                self.persisted = self
                    .entries
                    .iter()
                    .filter_map(EducationEntry::persisted_career_id)
                    .map(|career_id| StudentCareerRecord {
                        career_id: Some(career_id),
                        ..StudentCareerRecord::default()
                    })
                    .collect();
                if self.entries.is_empty() {
                    self.entries.push(EducationEntry::blank());
                }
            }
        }
    }
}
