use clap::Args;
use job_board::api::{
    ApplicationId, ApplicationStatus, OfferDraft, OfferId, OfferRecord, OrganizationUpdate,
};
use job_board::applicants::ApplicantBoard;
use job_board::error::AppError;
use job_board::session::AccountKind;
use job_board::Queries;

use crate::infra::Runtime;

#[derive(Args, Debug)]
pub(crate) struct StatusArgs {
    /// Application id
    pub(crate) id: ApplicationId,
    /// PENDING, IN_REVIEW, ACCEPTED, REJECTED or WITHDRAWN
    pub(crate) status: String,
}

/// Offer fields; anything left out keeps its current value on edit.
#[derive(Args, Debug, Default)]
pub(crate) struct OfferFormArgs {
    #[arg(long)]
    pub(crate) title: Option<String>,
    #[arg(long)]
    pub(crate) description: Option<String>,
    #[arg(long)]
    pub(crate) requirements: Option<String>,
    #[arg(long)]
    pub(crate) contract_type: Option<String>,
    #[arg(long)]
    pub(crate) location: Option<String>,
    #[arg(long)]
    pub(crate) salary: Option<String>,
    /// Closing date, YYYY-MM-DD
    #[arg(long)]
    pub(crate) closes: Option<String>,
    /// Status code stored with the offer
    #[arg(long)]
    pub(crate) status: Option<String>,
}

impl OfferFormArgs {
    fn into_draft(self) -> OfferDraft {
        OfferDraft {
            title: non_blank(self.title),
            description: non_blank(self.description),
            requirements: non_blank(self.requirements),
            contract_type: non_blank(self.contract_type),
            location: non_blank(self.location),
            salary: non_blank(self.salary),
            closes_at: non_blank(self.closes),
            status: non_blank(self.status),
            ..OfferDraft::default()
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct EditOfferArgs {
    /// Offer id
    pub(crate) id: OfferId,
    #[command(flatten)]
    pub(crate) form: OfferFormArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OrganizationUpdateArgs {
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) email: Option<String>,
    #[arg(long)]
    pub(crate) sector: Option<String>,
    #[arg(long)]
    pub(crate) description: Option<String>,
    #[arg(long)]
    pub(crate) logo_url: Option<String>,
    #[arg(long)]
    pub(crate) location: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds the create payload, owned by the signed-in organization.
fn new_offer_draft(form: OfferFormArgs, organization_id: String) -> Result<OfferDraft, AppError> {
    let mut draft = form.into_draft();
    if draft.title.is_none() {
        return Err(AppError::Input("an offer needs a --title".to_string()));
    }
    draft.organization_id = Some(organization_id);
    Ok(draft)
}

fn print_offer(offer: &OfferRecord) {
    println!(
        "#{:<6} {:<40} {:<12} {:<16} closes {}",
        offer.id,
        offer.title,
        offer.status.as_deref().unwrap_or("-"),
        offer.location,
        offer.closes_at.as_deref().unwrap_or("-")
    );
}

fn board(runtime: &Runtime) -> Result<ApplicantBoard<Queries>, AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    Ok(ApplicantBoard::new(runtime.queries.clone(), user.id))
}

pub(crate) async fn list(runtime: &Runtime) -> Result<(), AppError> {
    let applicants = board(runtime)?.applicants().await?;
    if applicants.is_empty() {
        println!("No applications received");
        return Ok(());
    }
    for application in applicants {
        println!(
            "#{:<5} offer {:<6} student {:<14} {:<10} {}",
            application.id,
            application.offer_id,
            application.student_id,
            application.status,
            application.submitted_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub(crate) async fn set_status(runtime: &Runtime, args: StatusArgs) -> Result<(), AppError> {
    let status = ApplicationStatus::parse(&args.status).ok_or_else(|| {
        AppError::Input(format!(
            "unknown status '{}'; expected one of {}",
            args.status,
            ApplicationStatus::ALL
                .iter()
                .map(|status| status.code())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;
    board(runtime)?.update_status(args.id, status).await?;
    println!("Application {} is now {}", args.id, status);
    Ok(())
}

pub(crate) async fn hire(runtime: &Runtime, id: ApplicationId) -> Result<(), AppError> {
    board(runtime)?.hire(id).await?;
    println!("Application {id} accepted");
    Ok(())
}

pub(crate) async fn my_offers(runtime: &Runtime) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    let offers = runtime
        .queries
        .organization_offers(&user.id)
        .await?
        .unwrap_or_default();
    if offers.is_empty() {
        println!("No offers published yet");
        return Ok(());
    }
    for offer in &offers {
        print_offer(offer);
    }
    Ok(())
}

pub(crate) async fn post_offer(runtime: &Runtime, form: OfferFormArgs) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    let draft = new_offer_draft(form, user.id)?;
    let offer = runtime.queries.create_offer(&draft).await?;
    println!("Offer {} published", offer.id);
    print_offer(&offer);
    Ok(())
}

pub(crate) async fn edit_offer(runtime: &Runtime, args: EditOfferArgs) -> Result<(), AppError> {
    runtime.require(AccountKind::Organization)?;
    let draft = args.form.into_draft();
    if draft == OfferDraft::default() {
        return Err(AppError::Input("nothing to change".to_string()));
    }
    let offer = runtime.queries.update_offer(args.id, &draft).await?;
    println!("Offer {} updated", offer.id);
    print_offer(&offer);
    Ok(())
}

pub(crate) async fn delete_offer(runtime: &Runtime, id: OfferId) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    runtime.queries.delete_offer(id, &user.id).await?;
    println!("Offer {id} deleted");
    Ok(())
}

pub(crate) async fn show_profile(runtime: &Runtime) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    let Some(organization) = runtime.queries.organization(&user.id).await? else {
        return Err(AppError::Input("organization not found".to_string()));
    };
    println!("{} (NIT {})", organization.name, organization.nit);
    println!("  email     {}", organization.email);
    println!("  sector    {}", organization.sector);
    println!("  location  {}", organization.location);
    if !organization.description.is_empty() {
        println!("  {}", organization.description);
    }
    Ok(())
}

pub(crate) async fn update_profile(
    runtime: &Runtime,
    args: OrganizationUpdateArgs,
) -> Result<(), AppError> {
    let user = runtime.require(AccountKind::Organization)?;
    let update = OrganizationUpdate {
        name: non_blank(args.name),
        email: non_blank(args.email),
        sector: non_blank(args.sector),
        description: non_blank(args.description),
        logo_url: non_blank(args.logo_url),
        location: non_blank(args.location),
    };
    if update == OrganizationUpdate::default() {
        return Err(AppError::Input("nothing to change".to_string()));
    }
    let organization = runtime.queries.update_organization(&user.id, &update).await?;
    println!("Organization {} updated", organization.name);
    Ok(())
}

pub(crate) async fn featured(runtime: &Runtime) -> Result<(), AppError> {
    let organizations = runtime.queries.featured_organizations().await?;
    if organizations.is_empty() {
        println!("No featured organizations");
        return Ok(());
    }
    for organization in organizations {
        println!(
            "{:<32} {:<20} {}",
            organization.name, organization.sector, organization.location
        );
    }
    Ok(())
}
