use std::sync::Arc;

use clap::Args;
use job_board::api::{CareerId, UniversityId};
use job_board::error::AppError;
use job_board::profile::{
    CareerCatalog, EducationEntry, ProfileEditor, EDUCATION_LEVELS, ENROLLMENT_STATUSES,
};
use job_board::session::AccountKind;
use job_board::Queries;

use crate::account::or_dash;
use crate::infra::Runtime;

#[derive(Args, Debug)]
pub(crate) struct ProgramsArgs {
    /// University id; lists universities when omitted
    #[arg(long)]
    pub(crate) university: Option<UniversityId>,
    /// Education level filter
    #[arg(long, default_value = "")]
    pub(crate) level: String,
}

#[derive(Args, Debug)]
pub(crate) struct AddProgramArgs {
    #[arg(long)]
    pub(crate) university: UniversityId,
    #[arg(long)]
    pub(crate) career: CareerId,
    #[arg(long, default_value = "")]
    pub(crate) level: String,
    /// Enrollment status
    #[arg(long, default_value = "ACTIVO")]
    pub(crate) status: String,
    #[arg(long, default_value = "")]
    pub(crate) semester: String,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) start: String,
    /// End date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub(crate) end: String,
}

#[derive(Args, Debug)]
pub(crate) struct RemoveProgramArgs {
    /// Program id to remove
    #[arg(long)]
    pub(crate) career: CareerId,
}

pub(crate) async fn show(runtime: &Runtime) -> Result<(), AppError> {
    let editor = open_editor(runtime).await?;
    let persisted: Vec<&EducationEntry> = editor
        .entries()
        .iter()
        .filter(|entry| entry.is_persisted())
        .collect();
    if persisted.is_empty() {
        println!("No programs registered");
        return Ok(());
    }
    for entry in persisted {
        println!(
            "{:<6} {} ({})",
            entry.career_id,
            entry.career_name.as_deref().unwrap_or("-"),
            or_dash(&entry.level)
        );
        println!(
            "       {} | {} | semester {} | {} - {}",
            entry.university_name.as_deref().unwrap_or("-"),
            or_dash(&entry.status),
            or_dash(&entry.semester),
            or_dash(&entry.start_date),
            or_dash(&entry.end_date)
        );
    }
    Ok(())
}

pub(crate) async fn programs(runtime: &Runtime, args: ProgramsArgs) -> Result<(), AppError> {
    let Some(university_id) = args.university else {
        for university in runtime.queries.universities().await? {
            println!("{:<6} {}", university.id, university.name);
        }
        return Ok(());
    };

    let catalog = CareerCatalog::new(runtime.queries.clone());
    catalog.load(university_id).await?;
    for career in catalog.careers_for_level(university_id, args.level.trim()) {
        println!("{:<6} {:<50} {}", career.id, career.name, career.level);
    }
    Ok(())
}

pub(crate) async fn add(runtime: &Runtime, args: AddProgramArgs) -> Result<(), AppError> {
    let level = args.level.trim().to_ascii_uppercase();
    if !level.is_empty() && !EDUCATION_LEVELS.contains(&level.as_str()) {
        return Err(AppError::Input(format!(
            "unknown level '{}'; expected one of {}",
            args.level,
            EDUCATION_LEVELS.join(", ")
        )));
    }
    let status = args.status.trim().to_ascii_uppercase();
    if !ENROLLMENT_STATUSES.contains(&status.as_str()) {
        return Err(AppError::Input(format!(
            "unknown status '{}'; expected one of {}",
            args.status,
            ENROLLMENT_STATUSES.join(", ")
        )));
    }

    let catalog = CareerCatalog::new(runtime.queries.clone());
    catalog.load(args.university).await?;
    let career = catalog
        .careers_for_level(args.university, &level)
        .into_iter()
        .find(|career| career.id == args.career)
        .ok_or_else(|| {
            AppError::Input(format!(
                "program {} is not offered by university {}",
                args.career, args.university
            ))
        })?;

    let mut editor = open_editor(runtime).await?;
    let key = editor.add_entry();
    if let Some(entry) = editor.entry_mut(&key) {
        entry.set_university(args.university.to_string());
        entry.set_level(level);
        entry.set_career(career.id.to_string(), Some(career.name));
        entry.status = status;
        entry.semester = args.semester;
        entry.start_date = args.start;
        entry.end_date = args.end;
    }

    let result = editor.save().await;
    runtime.flush_toasts();
    let report = result?;
    println!("{} request(s) sent", report.requests);
    Ok(())
}

pub(crate) async fn remove(runtime: &Runtime, args: RemoveProgramArgs) -> Result<(), AppError> {
    let mut editor = open_editor(runtime).await?;
    let key = editor
        .entries()
        .iter()
        .find(|entry| entry.persisted_career_id() == Some(args.career))
        .map(|entry| entry.key.clone())
        .ok_or_else(|| AppError::Input(format!("program {} is not registered", args.career)))?;

    editor.remove_persisted(&key).await?;
    println!("Removed program {}", args.career);
    Ok(())
}

async fn open_editor(runtime: &Runtime) -> Result<ProfileEditor<Queries>, AppError> {
    let user = runtime.require(AccountKind::Student)?;
    let student = runtime.queries.student(&user.id).await?;
    let records = runtime
        .queries
        .student_careers(&user.id)
        .await?
        .unwrap_or_default();

    let mut editor = ProfileEditor::new(
        runtime.queries.clone(),
        user.id,
        Arc::clone(&runtime.toasts),
    );
    editor.begin_edit(student.as_ref(), records);
    Ok(editor)
}
