pub mod auth;
pub mod config;
pub mod explain;
pub mod list;
pub mod project;
pub mod update;

use chrono::{Local, NaiveDate};
use clap::Args;
use priomage_core::integrations::{resolve_token, ContentKind};
use priomage_core::planner::ScoringCandidate;
use priomage_core::storage::FieldNames;
use priomage_core::{Config, GitHubError, ItemError, ProjectField, ProjectItem, ProjectsClient};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Which project to talk to; flags override config and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// GitHub organization login
    #[arg(long)]
    pub org: Option<String>,
    /// Project number within the organization
    #[arg(long)]
    pub project: Option<u32>,
}

/// Loaded configuration plus an authenticated client.
pub struct Session {
    pub config: Config,
    pub client: ProjectsClient,
}

/// Resolve configuration, environment and flags into a ready client.
pub fn connect(target: &TargetArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    config.apply_env()?;
    if let Some(org) = &target.org {
        config.github.organization = org.clone();
    }
    if let Some(number) = target.project {
        config.github.project_number = number;
    }
    if config.github.organization.trim().is_empty() {
        return Err(
            "no organization configured (use --org, GITHUB_ORG or `priomage config set github.organization <org>`)"
                .into(),
        );
    }

    let (token, _) = resolve_token().ok_or(GitHubError::NotAuthenticated)?;
    let client = ProjectsClient::new(token, &config.github)?;
    Ok(Session { config, client })
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
}

pub fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// Issues always; pull requests only on request.
pub fn is_selected(item: &ProjectItem, include_prs: bool) -> bool {
    match item.kind {
        ContentKind::Issue => true,
        ContentKind::PullRequest => include_prs,
        ContentKind::DraftIssue | ContentKind::Other => false,
    }
}

/// Items split by eligibility.
#[derive(Default)]
pub struct Selection {
    pub candidates: Vec<ScoringCandidate>,
    pub failures: Vec<ItemError>,
    pub not_scoreable: usize,
}

pub fn select_candidates(
    items: &[ProjectItem],
    names: &FieldNames,
    destination: &ProjectField,
    include_prs: bool,
) -> Selection {
    let mut selection = Selection::default();
    for item in items.iter().filter(|i| is_selected(i, include_prs)) {
        match item.to_candidate(names, destination) {
            Ok(Some(candidate)) => selection.candidates.push(candidate),
            Ok(None) => selection.not_scoreable += 1,
            Err(err) => {
                tracing::warn!(item = %err.identifier, field = err.field(), "skipping item: {}", err.source);
                selection.failures.push(err);
            }
        }
    }
    selection
}

/// Serializable form of an [`ItemError`].
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub identifier: String,
    pub field: Option<String>,
    pub error: String,
}

impl From<&ItemError> for FailureReport {
    fn from(err: &ItemError) -> Self {
        Self {
            identifier: err.identifier.clone(),
            field: err.field().map(str::to_string),
            error: err.source.to_string(),
        }
    }
}
