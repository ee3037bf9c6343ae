use crate::reset::{run_reset, ResetArgs};
use crate::server;
use attendance_notify::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Attendance Notifier",
    about = "Send attendance e-mails to students over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// E-mail every absent student from roster files and print the dispatch report
    Reset(ResetArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override how many e-mails are sent concurrently per batch
    #[arg(long, value_parser = crate::infra::parse_batch_size)]
    pub(crate) batch_size: Option<usize>,
    /// Override the pause between batches, in milliseconds
    #[arg(long)]
    pub(crate) batch_delay_ms: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Reset(args) => run_reset(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["attendance-notify-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn reset_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "attendance-notify-api",
            "reset",
            "--roster",
            "roster.csv",
            "--batch-size",
            "5",
            "--dry-run",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Reset(args)) => {
                assert_eq!(args.batch_size, Some(5));
                assert!(args.dry_run);
                assert!(args.signed_in.is_none());
            }
            other => panic!("expected reset command, got {other:?}"),
        }
    }

    #[test]
    fn zero_batch_size_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "attendance-notify-api",
            "serve",
            "--batch-size",
            "0",
        ]);
        assert!(result.is_err());
    }
}
