use chrono::NaiveDate;
use clap::Args;
use priomage_core::planner::{PlanSummary, PlannedWrite, WriteAction};
use priomage_core::plan;
use serde::Serialize;
use tracing::{info, warn};

use super::{connect, runtime, select_candidates, today_or, CmdResult, FailureReport, Session, TargetArgs};

#[derive(Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Also score pull requests
    #[arg(long)]
    pub include_prs: bool,
    /// Reference date for urgency (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct WriteError {
    identifier: String,
    error: String,
}

#[derive(Serialize)]
struct UpdateReport<'a> {
    project: &'a str,
    field: &'a str,
    dry_run: bool,
    summary: PlanSummary,
    not_scoreable: usize,
    written: usize,
    writes: &'a [PlannedWrite],
    failures: Vec<FailureReport>,
    write_errors: &'a [WriteError],
}

pub fn run(args: UpdateArgs) -> CmdResult {
    let session = connect(&args.target)?;
    runtime()?.block_on(execute(args, session))
}

async fn execute(args: UpdateArgs, session: Session) -> CmdResult {
    let Session { config, client } = session;
    let engine = config.scoring.build_engine()?;
    let today = today_or(args.today);

    let project = client.fetch_project().await?;
    let field = project.find_priority_field(&config.fields.priority)?;
    let destination = field.destination()?;
    // Abort on a misconfigured destination before fetching any item.
    destination.validate()?;

    let items = client.fetch_items().await?;
    let selection = select_candidates(&items, &config.fields, field, args.include_prs);
    let mut run = plan(
        &engine,
        &destination,
        &selection.candidates,
        today,
        config.scoring.update_threshold,
    )?;
    run.failures.extend(selection.failures);

    let mut written = 0;
    let mut write_errors = Vec::new();
    if !args.dry_run {
        for write in run.updates() {
            match client
                .update_field(&project.id, &write.target, &field.id, &write.value)
                .await
            {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(item = %write.breakdown.identifier, "update failed: {e}");
                    write_errors.push(WriteError {
                        identifier: write.breakdown.identifier.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(written, failed = write_errors.len(), "applied priority updates");
    }

    let summary = run.summary();
    if args.json {
        let report = UpdateReport {
            project: &project.title,
            field: &field.name,
            dry_run: args.dry_run,
            summary,
            not_scoreable: selection.not_scoreable,
            written,
            writes: &run.writes,
            failures: run.failures.iter().map(FailureReport::from).collect(),
            write_errors: &write_errors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} -> field '{}' ({}){}",
            project.title,
            field.name,
            destination.type_name(),
            if args.dry_run { " [dry run]" } else { "" }
        );
        for write in &run.writes {
            let marker = match write.action {
                WriteAction::Update => "~",
                WriteAction::Unchanged => "=",
            };
            let current = write
                .current
                .as_ref()
                .map_or_else(|| "(empty)".to_string(), ToString::to_string);
            println!(
                "  {marker} {:<28} {:>10} -> {:<10} score {:.2}",
                write.breakdown.identifier,
                current,
                write.value.to_string(),
                write.breakdown.score.value()
            );
        }
        for failure in &run.failures {
            println!("  ! {:<28} {}", failure.identifier, failure.source);
        }
        println!(
            "{} scored, {} to update, {} unchanged, {} failed, {} not scoreable",
            summary.scored, summary.to_update, summary.unchanged, summary.failed, selection.not_scoreable
        );
        if !args.dry_run {
            println!("{written} written");
        }
    }

    if !write_errors.is_empty() {
        return Err(format!("{} of {} updates failed", write_errors.len(), summary.to_update).into());
    }
    Ok(())
}
