use std::collections::BTreeSet;

use chrono::NaiveDate;
use clap::Args;
use priomage_core::integrations::ContentKind;
use priomage_core::scoring::{Explanation, PriorityEngine};
use priomage_core::storage::FieldNames;
use priomage_core::{explain, ItemError, ProjectField, ProjectItem};
use serde::Serialize;

use super::{connect, runtime, today_or, CmdResult, FailureReport, Session, TargetArgs};

#[derive(Args)]
pub struct ExplainArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Issue number to explain (repeatable)
    #[arg(long = "issue", required = true)]
    pub issues: Vec<u64>,
    /// Reference date for urgency (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Default, Serialize)]
struct ExplainReport {
    explanations: Vec<Explanation>,
    not_scoreable: Vec<String>,
    failures: Vec<FailureReport>,
    not_found: Vec<u64>,
}

pub fn run(args: ExplainArgs) -> CmdResult {
    let session = connect(&args.target)?;
    runtime()?.block_on(execute(args, session))
}

async fn execute(args: ExplainArgs, session: Session) -> CmdResult {
    let Session { config, client } = session;
    let engine = config.scoring.build_engine()?;
    let today = today_or(args.today);

    let project = client.fetch_project().await?;
    let field = project.find_priority_field(&config.fields.priority)?;
    let items = client.fetch_items().await?;

    let wanted: BTreeSet<u64> = args.issues.iter().copied().collect();
    let report = explain_items(&engine, &items, &config.fields, field, &wanted, today);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for explanation in &report.explanations {
        print!("{explanation}");
    }
    for identifier in &report.not_scoreable {
        println!("{identifier}: not scoreable (needs impact, effort and due date)");
    }
    for failure in &report.failures {
        println!(
            "{}: invalid {}: {}",
            failure.identifier,
            failure.field.as_deref().unwrap_or("input"),
            failure.error
        );
    }
    if !report.not_found.is_empty() {
        let numbers: Vec<String> = report.not_found.iter().map(|n| format!("#{n}")).collect();
        println!("Not found in project: {}", numbers.join(", "));
    }
    Ok(())
}

/// Explain every wanted issue. A failing issue is recorded and the rest still run.
fn explain_items(
    engine: &PriorityEngine,
    items: &[ProjectItem],
    names: &FieldNames,
    field: &ProjectField,
    wanted: &BTreeSet<u64>,
    today: NaiveDate,
) -> ExplainReport {
    let mut found = BTreeSet::new();
    let mut report = ExplainReport::default();

    for item in items
        .iter()
        .filter(|i| i.kind == ContentKind::Issue)
        .filter(|i| i.number.is_some_and(|n| wanted.contains(&n)))
    {
        found.extend(item.number);
        match item.to_candidate(names, field) {
            Ok(Some(candidate)) => match engine.score(&candidate.item, today) {
                Ok(breakdown) => report.explanations.push(explain(&breakdown)),
                Err(e) => {
                    let err = ItemError::new(candidate.item.identifier.clone(), e);
                    report.failures.push(FailureReport::from(&err));
                }
            },
            Ok(None) => report.not_scoreable.push(item.identifier()),
            Err(e) => report.failures.push(FailureReport::from(&e)),
        }
    }
    report.not_found = wanted.difference(&found).copied().collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use priomage_core::integrations::ProjectFieldValue;
    use priomage_core::Config;

    fn issue(number: u64, impact: f64) -> ProjectItem {
        ProjectItem {
            project_item_id: format!("PVTI_{number}"),
            kind: ContentKind::Issue,
            number: Some(number),
            title: format!("Issue {number}"),
            repository: "acme/api".into(),
            labels: Vec::new(),
            field_values: [
                ("Impact", ProjectFieldValue::Number { number: impact }),
                (
                    "Effort",
                    ProjectFieldValue::SingleSelect {
                        option_id: None,
                        name: "Small".into(),
                    },
                ),
                (
                    "Due",
                    ProjectFieldValue::Date {
                        date: "2026-03-15".into(),
                    },
                ),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }

    fn number_field() -> ProjectField {
        ProjectField {
            id: "PVTF_prio".into(),
            name: "Priority".into(),
            data_type: "NUMBER".into(),
            options: Vec::new(),
        }
    }

    #[test]
    fn out_of_range_impact_does_not_hide_other_issues() {
        let engine = Config::default().scoring.build_engine().unwrap();
        let items = vec![issue(1, 40.0), issue(3, 500.0), issue(5, 80.0)];
        let wanted: BTreeSet<u64> = [1, 3, 5, 9].into_iter().collect();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let report = explain_items(
            &engine,
            &items,
            &FieldNames::default(),
            &number_field(),
            &wanted,
            today,
        );

        let explained: Vec<&str> = report
            .explanations
            .iter()
            .map(|e| e.identifier.as_str())
            .collect();
        assert_eq!(explained, vec!["acme/api#1", "acme/api#5"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].identifier, "acme/api#3");
        assert_eq!(report.failures[0].field.as_deref(), Some("impact"));
        assert_eq!(report.not_found, vec![9]);
    }
}
