//! Turns the edited education rows into enrollment mutations.
//!
//! The whole batch is validated and planned before anything is sent. Planned
//! mutations then run in order; a failure stops the batch without undoing the
//! mutations that already went through.

use std::collections::BTreeSet;
use std::future::Future;

use tracing::{debug, info};

use super::entry::EducationEntry;
use crate::api::{CareerAssignment, CareerId, CareerUpdate, StudentCareerRecord, StudentUpdate};
use crate::http::ApiError;

/// Enrollment writes the reconciler needs from the backend.
pub trait EnrollmentGateway: Send + Sync {
    fn assign_career(
        &self,
        student_id: &str,
        assignment: &CareerAssignment,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn update_career(
        &self,
        student_id: &str,
        career_id: CareerId,
        update: &CareerUpdate,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn remove_career(
        &self,
        student_id: &str,
        career_id: CareerId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn update_student(
        &self,
        student_id: &str,
        update: &StudentUpdate,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Current enrollments, read back after a save.
    fn enrollments(
        &self,
        student_id: &str,
    ) -> impl Future<Output = Result<Vec<StudentCareerRecord>, ApiError>> + Send;
}

/// Positions are 1-based over the rows that have at least one field filled in.
#[derive(Debug, thiserror::Error)]
pub enum EducationError {
    #[error("Select a university for program {position}.")]
    MissingUniversity { position: usize },
    #[error("Select a valid program for program {position}.")]
    InvalidCareer { position: usize },
    #[error("Fill in program, status and start date for program {position}.")]
    MissingFields { position: usize },
    #[error("The current semester must be a number for program {position}.")]
    InvalidSemester { position: usize },
    #[error("Program {position} is duplicated.")]
    Duplicate { position: usize, career_id: CareerId },
    #[error("Could not save program {position}: {source}")]
    Mutation { position: usize, source: ApiError },
    #[error("Could not update the profile: {0}")]
    Student(#[source] ApiError),
    #[error("Could not remove the program: {0}")]
    Remove(#[source] ApiError),
    #[error("Student identification is not available.")]
    MissingStudent,
    #[error("The profile is not being edited.")]
    NotEditing,
}

impl EducationError {
    /// True for problems caught before any request was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EducationError::MissingUniversity { .. }
                | EducationError::InvalidCareer { .. }
                | EducationError::MissingFields { .. }
                | EducationError::InvalidSemester { .. }
                | EducationError::Duplicate { .. }
                | EducationError::MissingStudent
                | EducationError::NotEditing
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CareerMutation {
    /// The program of a persisted row changed: delete the old enrollment, then create the new one.
    Replace {
        previous: CareerId,
        assignment: CareerAssignment,
    },
    Update {
        career_id: CareerId,
        update: CareerUpdate,
    },
    Assign(CareerAssignment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMutation {
    pub position: usize,
    pub mutation: CareerMutation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationPlan {
    pub mutations: Vec<PlannedMutation>,
}

impl EducationPlan {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

struct ValidRow {
    career_id: CareerId,
    status: String,
    semester: u32,
    start_date: String,
    end_date: Option<String>,
}

impl ValidRow {
    fn assignment(&self) -> CareerAssignment {
        CareerAssignment {
            career_id: self.career_id,
            status: self.status.clone(),
            semester: self.semester,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    fn update(&self) -> CareerUpdate {
        CareerUpdate {
            status: self.status.clone(),
            semester: self.semester,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

fn validate(entry: &EducationEntry, position: usize) -> Result<ValidRow, EducationError> {
    if entry.university_id.trim().is_empty() {
        return Err(EducationError::MissingUniversity { position });
    }
    let career_id = entry
        .career_id
        .trim()
        .parse::<CareerId>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or(EducationError::InvalidCareer { position })?;
    let status = entry.status.trim();
    let start_date = entry.start_date.trim();
    if status.is_empty() || start_date.is_empty() {
        return Err(EducationError::MissingFields { position });
    }
    let semester = match entry.semester.trim() {
        "" => 1,
        raw => raw
            .parse::<u32>()
            .map_err(|_| EducationError::InvalidSemester { position })?,
    };
    let end_date = Some(entry.end_date.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(ValidRow {
        career_id,
        status: status.to_string(),
        semester,
        start_date: start_date.to_string(),
        end_date,
    })
}

/// Validates every non-blank row and plans the writes, or fails on the first bad row.
pub fn plan_education_changes(
    entries: &[EducationEntry],
    persisted: &[StudentCareerRecord],
) -> Result<EducationPlan, EducationError> {
    let existing: BTreeSet<CareerId> = persisted
        .iter()
        .filter_map(StudentCareerRecord::resolved_career_id)
        .collect();
    let mut planned = BTreeSet::new();
    let mut plan = EducationPlan::default();

    let filled = entries.iter().filter(|entry| !entry.is_blank());
    for (index, entry) in filled.enumerate() {
        let position = index + 1;
        let row = validate(entry, position)?;

        if let Some(previous) = entry.persisted_career_id() {
            if row.career_id == previous {
                if entry.metadata_changed() {
                    plan.mutations.push(PlannedMutation {
                        position,
                        mutation: CareerMutation::Update {
                            career_id: previous,
                            update: row.update(),
                        },
                    });
                }
                continue;
            }
            if existing.contains(&row.career_id) || !planned.insert(row.career_id) {
                return Err(EducationError::Duplicate {
                    position,
                    career_id: row.career_id,
                });
            }
            plan.mutations.push(PlannedMutation {
                position,
                mutation: CareerMutation::Replace {
                    previous,
                    assignment: row.assignment(),
                },
            });
            continue;
        }

        if existing.contains(&row.career_id) || !planned.insert(row.career_id) {
            return Err(EducationError::Duplicate {
                position,
                career_id: row.career_id,
            });
        }
        plan.mutations.push(PlannedMutation {
            position,
            mutation: CareerMutation::Assign(row.assignment()),
        });
    }

    Ok(plan)
}

/// Issues the planned writes in order. Returns how many requests were sent.
pub async fn apply_education_plan<G: EnrollmentGateway>(
    gateway: &G,
    student_id: &str,
    plan: &EducationPlan,
) -> Result<usize, EducationError> {
    let mut sent = 0;
    for PlannedMutation { position, mutation } in &plan.mutations {
        let position = *position;
        let failed = |source| EducationError::Mutation { position, source };
        match mutation {
            CareerMutation::Replace {
                previous,
                assignment,
            } => {
                debug!(position, previous, next = assignment.career_id, "replacing enrollment");
                gateway
                    .remove_career(student_id, *previous)
                    .await
                    .map_err(failed)?;
                sent += 1;
                gateway
                    .assign_career(student_id, assignment)
                    .await
                    .map_err(failed)?;
                sent += 1;
            }
            CareerMutation::Update { career_id, update } => {
                debug!(position, career_id, "updating enrollment");
                gateway
                    .update_career(student_id, *career_id, update)
                    .await
                    .map_err(failed)?;
                sent += 1;
            }
            CareerMutation::Assign(assignment) => {
                debug!(position, career_id = assignment.career_id, "assigning enrollment");
                gateway
                    .assign_career(student_id, assignment)
                    .await
                    .map_err(failed)?;
                sent += 1;
            }
        }
    }
    info!(student = %student_id, sent, "education changes applied");
    Ok(sent)
}
