use clap::{Parser, Subcommand};
use job_board::error::AppError;

use crate::account::{self, LoginArgs, OrganizationSignupArgs, StudentSignupArgs};
use crate::infra::Runtime;
use crate::offers::{self, ApplyArgs, ExportArgs, ListArgs, WatchArgs};
use crate::organization::{
    self, EditOfferArgs, OfferFormArgs, OrganizationUpdateArgs, StatusArgs,
};
use crate::profile::{self, AddProgramArgs, ProgramsArgs, RemoveProgramArgs};

#[derive(Parser, Debug)]
#[command(
    name = "job-board",
    about = "Browse internship offers, apply, and manage profiles on the job board",
    version
)]
struct Cli {
    /// Override the configured backend URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login(LoginArgs),
    /// Create a student or organization account
    Register {
        #[command(subcommand)]
        command: RegisterCommand,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account's profile
    Whoami,
    /// Browse, watch, export and apply to offers
    Offers {
        #[command(subcommand)]
        command: OffersCommand,
    },
    /// List the signed-in student's applications
    Applications,
    /// Manage the signed-in student's education history
    Education {
        #[command(subcommand)]
        command: EducationCommand,
    },
    /// Show or update the signed-in organization
    Organization {
        #[command(subcommand)]
        command: OrganizationCommand,
    },
    /// Organizations highlighted on the landing page
    Organizations {
        #[command(subcommand)]
        command: OrganizationsCommand,
    },
    /// Review applicants as the signed-in organization
    Applicants {
        #[command(subcommand)]
        command: ApplicantsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RegisterCommand {
    Student(StudentSignupArgs),
    Organization(OrganizationSignupArgs),
}

#[derive(Subcommand, Debug)]
enum OffersCommand {
    /// Print one or more pages of the filtered offer list
    List(ListArgs),
    /// Keep polling the offer list until interrupted
    Watch(WatchArgs),
    /// Apply to an offer as the signed-in student
    Apply(ApplyArgs),
    /// Write the filtered offer list as CSV
    Export(ExportArgs),
    /// List the signed-in organization's offers
    Mine,
    /// Publish a new offer
    Post(OfferFormArgs),
    /// Change fields of an existing offer
    Edit(EditOfferArgs),
    /// Delete an offer
    Delete {
        /// Offer id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum OrganizationCommand {
    /// Print the organization's profile
    Show,
    /// Change profile fields
    Update(OrganizationUpdateArgs),
}

#[derive(Subcommand, Debug)]
enum OrganizationsCommand {
    /// List the featured organizations
    Featured,
}

#[derive(Subcommand, Debug)]
enum EducationCommand {
    /// Print the persisted programs
    Show,
    /// List the programs a university offers
    Programs(ProgramsArgs),
    /// Add a program and save the profile
    Add(AddProgramArgs),
    /// Remove a persisted program immediately
    Remove(RemoveProgramArgs),
}

#[derive(Subcommand, Debug)]
enum ApplicantsCommand {
    /// List applications received by the organization
    List,
    /// Move an application to another status
    SetStatus(StatusArgs),
    /// Accept an application
    Hire {
        /// Application id
        id: i64,
    },
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let runtime = Runtime::bootstrap(cli.api_url)?;

    match cli.command {
        Command::Login(args) => account::login(&runtime, args).await,
        Command::Register {
            command: RegisterCommand::Student(args),
        } => account::register_student(&runtime, args).await,
        Command::Register {
            command: RegisterCommand::Organization(args),
        } => account::register_organization(&runtime, args).await,
        Command::Logout => account::logout(&runtime),
        Command::Whoami => account::whoami(&runtime).await,
        Command::Offers { command } => match command {
            OffersCommand::List(args) => offers::list(&runtime, args).await,
            OffersCommand::Watch(args) => offers::watch(&runtime, args).await,
            OffersCommand::Apply(args) => offers::apply(&runtime, args).await,
            OffersCommand::Export(args) => offers::export(&runtime, args).await,
            OffersCommand::Mine => organization::my_offers(&runtime).await,
            OffersCommand::Post(form) => organization::post_offer(&runtime, form).await,
            OffersCommand::Edit(args) => organization::edit_offer(&runtime, args).await,
            OffersCommand::Delete { id } => organization::delete_offer(&runtime, id).await,
        },
        Command::Applications => offers::applications(&runtime).await,
        Command::Education { command } => match command {
            EducationCommand::Show => profile::show(&runtime).await,
            EducationCommand::Programs(args) => profile::programs(&runtime, args).await,
            EducationCommand::Add(args) => profile::add(&runtime, args).await,
            EducationCommand::Remove(args) => profile::remove(&runtime, args).await,
        },
        Command::Organization { command } => match command {
            OrganizationCommand::Show => organization::show_profile(&runtime).await,
            OrganizationCommand::Update(args) => organization::update_profile(&runtime, args).await,
        },
        Command::Organizations {
            command: OrganizationsCommand::Featured,
        } => organization::featured(&runtime).await,
        Command::Applicants { command } => match command {
            ApplicantsCommand::List => organization::list(&runtime).await,
            ApplicantsCommand::SetStatus(args) => organization::set_status(&runtime, args).await,
            ApplicantsCommand::Hire { id } => organization::hire(&runtime, id).await,
        },
    }
}
