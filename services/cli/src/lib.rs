mod account;
mod cli;
mod infra;
mod offers;
mod organization;
mod profile;

use job_board::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
