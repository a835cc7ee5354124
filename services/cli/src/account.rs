use clap::Args;
use job_board::api::{OrganizationRegistration, Profile, StudentRegistration};
use job_board::error::AppError;
use job_board::session::SessionUser;

use crate::infra::Runtime;

#[derive(Args, Debug)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Args, Debug)]
pub(crate) struct StudentSignupArgs {
    /// Identification number
    #[arg(long)]
    pub(crate) id_number: String,
    /// Identification type (CC, TI, CE, ...)
    #[arg(long, default_value = "CC")]
    pub(crate) id_type: String,
    #[arg(long)]
    pub(crate) first_names: String,
    #[arg(long)]
    pub(crate) last_names: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Args, Debug)]
pub(crate) struct OrganizationSignupArgs {
    #[arg(long)]
    pub(crate) nit: String,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
}

pub(crate) async fn login(runtime: &Runtime, args: LoginArgs) -> Result<(), AppError> {
    let user = runtime
        .client
        .auth()
        .login(&args.email, &args.password)
        .await?;
    print_signed_in(&user);
    Ok(())
}

pub(crate) async fn register_student(
    runtime: &Runtime,
    args: StudentSignupArgs,
) -> Result<(), AppError> {
    let user = runtime
        .client
        .auth()
        .register_student(StudentRegistration {
            id_number: args.id_number,
            id_type: args.id_type,
            first_names: args.first_names,
            last_names: args.last_names,
            email: args.email,
            password: args.password,
        })
        .await?;
    print_signed_in(&user);
    Ok(())
}

pub(crate) async fn register_organization(
    runtime: &Runtime,
    args: OrganizationSignupArgs,
) -> Result<(), AppError> {
    let user = runtime
        .client
        .auth()
        .register_organization(OrganizationRegistration {
            nit: args.nit,
            name: args.name,
            email: args.email,
            password: args.password,
        })
        .await?;
    print_signed_in(&user);
    Ok(())
}

pub(crate) fn logout(runtime: &Runtime) -> Result<(), AppError> {
    runtime.client.auth().logout()?;
    println!("Signed out");
    Ok(())
}

pub(crate) async fn whoami(runtime: &Runtime) -> Result<(), AppError> {
    match runtime.client.auth().profile().await? {
        Profile::Student(student) => {
            println!("Student {} {}", student.first_names, student.last_names);
            println!("  id:    {} {}", student.id_type, student.id);
            println!("  email: {}", student.email);
            println!("  phone: {}", or_dash(&student.phone));
            println!("  city:  {}", or_dash(&student.city));
        }
        Profile::Organization(organization) => {
            println!("Organization {}", organization.name);
            println!("  id:       {}", organization.id);
            println!("  nit:      {}", organization.nit);
            println!("  email:    {}", organization.email);
            println!("  sector:   {}", or_dash(&organization.sector));
            println!("  location: {}", or_dash(&organization.location));
        }
    }
    Ok(())
}

fn print_signed_in(user: &SessionUser) {
    println!("Signed in as {} <{}> ({})", user.name, user.email, user.kind.label());
}

pub(crate) fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
