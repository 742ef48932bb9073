use clap::Args;

use super::{connect, runtime, CmdResult, TargetArgs};

#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Print the project as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ProjectArgs) -> CmdResult {
    let session = connect(&args.target)?;
    let project = runtime()?.block_on(session.client.fetch_project())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&project)?);
        return Ok(());
    }

    println!("{} ({})", project.title, project.id);
    let priority = project
        .find_priority_field(&session.config.fields.priority)
        .ok()
        .map(|f| f.id.clone());

    for field in &project.fields {
        let mut line = format!("  {:<24} {:<14}", field.name, field.data_type);
        if priority.as_deref() == Some(field.id.as_str()) {
            match field.destination().and_then(|d| d.validate().map(|()| d)) {
                Ok(_) => line.push_str(" <- priority destination"),
                Err(e) => line.push_str(&format!(" <- priority destination, unusable: {e}")),
            }
        }
        println!("{line}");
        if !field.options.is_empty() {
            let names: Vec<&str> = field.options.iter().map(|o| o.name.as_str()).collect();
            println!("  {:<24} options: {}", "", names.join(", "));
        }
    }
    if priority.is_none() {
        println!(
            "No priority field found (looked for: {})",
            session.config.fields.priority.join(", ")
        );
    }
    Ok(())
}
