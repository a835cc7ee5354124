//! Student profile editing and the education reconciler.

pub mod catalog;
pub mod editor;
pub mod entry;
pub mod reconcile;

pub use catalog::{filter_by_level, CareerCatalog, CatalogLoad, CatalogSource};
pub use editor::{ProfileEditor, SaveReport};
pub use entry::{EducationEntry, EnrollmentSnapshot, EDUCATION_LEVELS, ENROLLMENT_STATUSES};
pub use reconcile::{
    apply_education_plan, plan_education_changes, CareerMutation, EducationError, EducationPlan,
    EnrollmentGateway, PlannedMutation,
};
