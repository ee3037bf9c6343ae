mod cli;
mod infra;
mod reset;
mod routes;
mod server;

use attendance_notify::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
