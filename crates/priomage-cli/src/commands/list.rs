use chrono::NaiveDate;
use clap::Args;
use priomage_core::integrations::ProjectFieldValue;
use priomage_core::scoring::PriorityEngine;
use priomage_core::storage::FieldNames;
use priomage_core::{ItemError, PriorityBand, ProjectField, ProjectItem};
use serde::Serialize;

use super::{connect, is_selected, runtime, today_or, CmdResult, Session, TargetArgs};

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Also list pull requests
    #[arg(long)]
    pub include_prs: bool,
    /// Print every custom field value under each item
    #[arg(long)]
    pub show_fields: bool,
    /// Reference date for urgency (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Scoring {
    Scored { score: f64, band: PriorityBand, critical: bool },
    NotScoreable,
    Invalid { field: Option<String>, error: String },
}

#[derive(Serialize)]
struct ListEntry<'a> {
    #[serde(flatten)]
    item: &'a ProjectItem,
    identifier: String,
    scoring: Scoring,
}

pub fn run(args: ListArgs) -> CmdResult {
    let session = connect(&args.target)?;
    runtime()?.block_on(execute(args, session))
}

async fn execute(args: ListArgs, session: Session) -> CmdResult {
    let Session { config, client } = session;
    let engine = config.scoring.build_engine()?;
    let today = today_or(args.today);

    let project = client.fetch_project().await?;
    let field = project.find_priority_field(&config.fields.priority)?;
    let items = client.fetch_items().await?;

    let mut entries = Vec::new();
    for item in items.iter().filter(|i| is_selected(i, args.include_prs)) {
        let scoring = score_item(&engine, item, &config.fields, field, today);
        entries.push(ListEntry {
            item,
            identifier: item.identifier(),
            scoring,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No items in {}.", project.title);
        return Ok(());
    }

    println!("{} ({} items)", project.title, entries.len());
    for entry in &entries {
        let status = match &entry.scoring {
            Scoring::Scored {
                score,
                band,
                critical,
            } => format!(
                "{score:>6.2} {band}{}",
                if *critical { " (override)" } else { "" }
            ),
            Scoring::NotScoreable => "     - not scoreable".to_string(),
            Scoring::Invalid { error, .. } => format!("     ! {error}"),
        };
        println!(
            "  {:<5} {:<24} {}  {}",
            entry.item.kind.short_name(),
            entry.identifier,
            status,
            entry.item.title
        );
        if args.show_fields {
            if !entry.item.labels.is_empty() {
                println!("        labels: {}", entry.item.labels.join(", "));
            }
            for (name, value) in &entry.item.field_values {
                println!("        {name}: {}", describe(value));
            }
        }
    }
    Ok(())
}

fn score_item(
    engine: &PriorityEngine,
    item: &ProjectItem,
    names: &FieldNames,
    field: &ProjectField,
    today: NaiveDate,
) -> Scoring {
    let result = item
        .to_candidate(names, field)
        .and_then(|candidate| match candidate {
            Some(candidate) => engine
                .score(&candidate.item, today)
                .map(Some)
                .map_err(|e| ItemError::new(candidate.item.identifier.clone(), e)),
            None => Ok(None),
        });
    match result {
        Ok(Some(breakdown)) => Scoring::Scored {
            score: breakdown.score.value(),
            band: PriorityBand::for_score(breakdown.score),
            critical: breakdown.is_critical(),
        },
        Ok(None) => Scoring::NotScoreable,
        Err(e) => Scoring::Invalid {
            field: e.field().map(str::to_string),
            error: e.source.to_string(),
        },
    }
}

fn describe(value: &ProjectFieldValue) -> String {
    match value {
        ProjectFieldValue::Number { number } => number.to_string(),
        ProjectFieldValue::Text { text } => text.clone(),
        ProjectFieldValue::Date { date } => date.clone(),
        ProjectFieldValue::SingleSelect { name, .. } => name.clone(),
    }
}
