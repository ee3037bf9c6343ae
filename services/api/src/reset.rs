use crate::infra::{override_dispatch, parse_batch_size, ConfiguredMailer};
use attendance_notify::config::AppConfig;
use attendance_notify::error::AppError;
use attendance_notify::notifications::{
    load_students, ConsoleMailer, DispatchReport, JobOutcome, MailSender, MessageTemplate,
    NotificationService, Student,
};
use attendance_notify::telemetry;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ResetArgs {
    /// Full roster as CSV (`id,name,email`) or a JSON array of students
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Students who signed in; everyone on the roster is absent when omitted
    #[arg(long)]
    pub(crate) signed_in: Option<PathBuf>,
    /// Override how many e-mails are sent concurrently per batch
    #[arg(long, value_parser = parse_batch_size)]
    pub(crate) batch_size: Option<usize>,
    /// Override the pause between batches, in milliseconds
    #[arg(long)]
    pub(crate) batch_delay_ms: Option<u64>,
    /// Log messages to the console instead of using the configured transport
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_reset(args: ResetArgs) -> Result<(), AppError> {
    let ResetArgs {
        roster,
        signed_in,
        batch_size,
        batch_delay_ms,
        dry_run,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    config.dispatch = override_dispatch(config.dispatch, batch_size, batch_delay_ms);
    telemetry::init(&config.telemetry)?;

    let roster = load_students(&roster)?;
    let signed_in = match signed_in {
        Some(path) => load_students(path)?,
        None => Vec::new(),
    };

    let report = if dry_run {
        dispatch_with(Arc::new(ConsoleMailer::verbose()), &config, &roster, &signed_in).await?
    } else {
        let mailer = ConfiguredMailer::from_config(&config.mail)?;
        dispatch_with(Arc::new(mailer), &config, &roster, &signed_in).await?
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Report unavailable as JSON: {err}"),
        }
    } else {
        render_report(&report, roster.len(), signed_in.len(), dry_run);
    }

    Ok(())
}

async fn dispatch_with<M>(
    mailer: Arc<M>,
    config: &AppConfig,
    roster: &[Student],
    signed_in: &[Student],
) -> Result<DispatchReport, AppError>
where
    M: MailSender + 'static,
{
    let service =
        NotificationService::new(mailer, config.mail.from_address.clone(), config.dispatch);
    let report = service
        .resolve_and_dispatch(roster, signed_in, &MessageTemplate::absence())
        .await?;
    Ok(report)
}

pub(crate) fn render_report(
    report: &DispatchReport,
    roster_size: usize,
    signed_in_size: usize,
    dry_run: bool,
) {
    println!("Attendance reset");
    println!(
        "Roster: {} students | signed in: {} | absent: {}",
        roster_size,
        signed_in_size,
        report.total()
    );
    if dry_run {
        println!("Transport: console (dry run)");
    }
    println!(
        "Delivered {} / failed {} across {} batch(es)",
        report.sent, report.failed, report.batches
    );

    if report.failed == 0 {
        println!("\nFailures: none");
    } else {
        println!("\nFailures");
        for outcome in report.failures() {
            if let JobOutcome::Failed { recipient, error } = outcome {
                println!(
                    "- {} <{}> (id {}): {}",
                    recipient.name, recipient.email, recipient.id, error
                );
            }
        }
    }
}
