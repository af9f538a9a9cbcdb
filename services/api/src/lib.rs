mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use pto_scheduler::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
