//! GitHub Projects V2 client -- read items and field definitions, write priority values.
//!
//! All requests go through a single GraphQL endpoint. Transient failures
//! (network errors, HTTP 429 and 5xx) are retried with exponential backoff.

use std::time::Duration;

use indexmap::IndexMap;
use indoc::indoc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::GitHubError;
use crate::integrations::project::{
    ContentKind, ProjectField, ProjectFieldValue, ProjectInfo, ProjectItem,
};
use crate::scoring::{FieldValue, SelectOption};
use crate::storage::GitHubConfig;

const USER_AGENT: &str = "priomage";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROJECT_QUERY: &str = indoc! {r#"
    query GetProjectFields($org: String!, $projectNumber: Int!) {
      organization(login: $org) {
        projectV2(number: $projectNumber) {
          id
          title
          fields(first: 50) {
            nodes {
              __typename
              ... on ProjectV2FieldCommon {
                id
                name
                dataType
              }
              ... on ProjectV2SingleSelectField {
                options {
                  id
                  name
                }
              }
            }
          }
        }
      }
    }
"#};

const ITEMS_QUERY: &str = indoc! {r#"
    query GetProjectItems($org: String!, $projectNumber: Int!, $cursor: String) {
      organization(login: $org) {
        projectV2(number: $projectNumber) {
          items(first: 100, after: $cursor) {
            pageInfo {
              hasNextPage
              endCursor
            }
            nodes {
              id
              content {
                __typename
                ... on Issue {
                  number
                  title
                  repository { nameWithOwner }
                  labels(first: 50) { nodes { name } }
                }
                ... on PullRequest {
                  number
                  title
                  repository { nameWithOwner }
                  labels(first: 50) { nodes { name } }
                }
                ... on DraftIssue {
                  title
                }
              }
              fieldValues(first: 20) {
                nodes {
                  __typename
                  ... on ProjectV2ItemFieldValueCommon {
                    field {
                      ... on ProjectV2FieldCommon { name }
                    }
                  }
                  ... on ProjectV2ItemFieldNumberValue { number }
                  ... on ProjectV2ItemFieldTextValue { text }
                  ... on ProjectV2ItemFieldDateValue { date }
                  ... on ProjectV2ItemFieldSingleSelectValue { name optionId }
                }
              }
            }
          }
        }
      }
    }
"#};

const UPDATE_MUTATION: &str = indoc! {r#"
    mutation UpdateProjectV2ItemFieldValue($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: ProjectV2FieldValue!) {
      updateProjectV2ItemFieldValue(input: {
        projectId: $projectId
        itemId: $itemId
        fieldId: $fieldId
        value: $value
      }) {
        projectV2Item {
          id
        }
      }
    }
"#};

/// Exponential backoff: `base_delay * 2^attempt`, exponent capped at 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(6))
    }
}

impl From<&GitHubConfig> for RetryPolicy {
    fn from(config: &GitHubConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// GraphQL `value` input for a field update.
pub fn graphql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Number { number } => json!({ "number": number }),
        FieldValue::Text { text } => json!({ "text": text }),
        FieldValue::SingleSelect { option_id, .. } => json!({ "singleSelectOptionId": option_id }),
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct OrganizationData<P> {
    organization: Option<OrganizationNode<P>>,
}

#[derive(Deserialize)]
struct OrganizationNode<P> {
    #[serde(rename = "projectV2")]
    project: Option<P>,
}

#[derive(Deserialize)]
struct Nodes<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Deserialize)]
struct ProjectNode {
    id: String,
    title: String,
    fields: Nodes<FieldNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldNode {
    id: Option<String>,
    name: Option<String>,
    data_type: Option<String>,
    #[serde(default)]
    options: Vec<SelectOption>,
}

#[derive(Deserialize)]
struct ItemsProjectNode {
    items: ItemsPage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsPage {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<ItemNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemNode {
    id: String,
    content: Option<ContentNode>,
    field_values: Option<Nodes<FieldValueNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentNode {
    #[serde(rename = "__typename")]
    typename: String,
    number: Option<u64>,
    title: Option<String>,
    repository: Option<RepositoryNode>,
    labels: Option<Nodes<LabelNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name_with_owner: String,
}

#[derive(Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValueNode {
    #[serde(rename = "__typename")]
    typename: String,
    field: Option<FieldNameNode>,
    number: Option<f64>,
    text: Option<String>,
    date: Option<String>,
    name: Option<String>,
    option_id: Option<String>,
}

#[derive(Deserialize)]
struct FieldNameNode {
    name: Option<String>,
}

impl FieldValueNode {
    fn into_entry(self) -> Option<(String, ProjectFieldValue)> {
        let field = self.field?.name?;
        let value = match self.typename.as_str() {
            "ProjectV2ItemFieldNumberValue" => ProjectFieldValue::Number {
                number: self.number?,
            },
            "ProjectV2ItemFieldTextValue" => ProjectFieldValue::Text { text: self.text? },
            "ProjectV2ItemFieldDateValue" => ProjectFieldValue::Date { date: self.date? },
            "ProjectV2ItemFieldSingleSelectValue" => ProjectFieldValue::SingleSelect {
                option_id: self.option_id,
                name: self.name?,
            },
            _ => return None,
        };
        Some((field, value))
    }
}

impl ItemNode {
    fn into_item(self) -> ProjectItem {
        let (kind, number, title, repository, labels) = match self.content {
            Some(content) => (
                ContentKind::from_typename(&content.typename),
                content.number,
                content.title.unwrap_or_default(),
                content
                    .repository
                    .map(|r| r.name_with_owner)
                    .unwrap_or_default(),
                content
                    .labels
                    .map(|l| l.nodes.into_iter().flatten().map(|n| n.name).collect())
                    .unwrap_or_default(),
            ),
            None => (ContentKind::Other, None, String::new(), String::new(), Vec::new()),
        };

        let field_values: IndexMap<String, ProjectFieldValue> = self
            .field_values
            .map(|v| v.nodes)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(FieldValueNode::into_entry)
            .collect();

        ProjectItem {
            project_item_id: self.id,
            kind,
            number,
            title,
            repository,
            labels,
            field_values,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Client for one organization project.
pub struct ProjectsClient {
    http: Client,
    endpoint: String,
    token: String,
    organization: String,
    project_number: u32,
    retry: RetryPolicy,
}

impl ProjectsClient {
    /// Build a client for the project named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::NotAuthenticated`] for an empty token, or a
    /// network error if the HTTP client cannot be constructed.
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GitHubError::NotAuthenticated);
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.api_url.clone(),
            token,
            organization: config.organization.clone(),
            project_number: config.project_number,
            retry: RetryPolicy::from(config),
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn project_number(&self) -> u32 {
        self.project_number
    }

    fn not_found(&self) -> GitHubError {
        GitHubError::ProjectNotFound {
            organization: self.organization.clone(),
            number: self.project_number,
        }
    }

    async fn send_once(&self, body: &Value) -> Result<String, GitHubError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Run one GraphQL operation, retrying transient failures.
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, GitHubError> {
        let body = json!({ "query": query, "variables": variables });

        let mut attempt = 0;
        let text = loop {
            match self.send_once(&body).await {
                Ok(text) => break text,
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "GitHub request failed, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        };

        let response: GraphQlResponse<T> = serde_json::from_str(&text)?;
        if !response.errors.is_empty() {
            return Err(GitHubError::GraphQl {
                messages: response.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        response.data.ok_or_else(|| GitHubError::GraphQl {
            messages: vec!["response carried no data".into()],
        })
    }

    /// Project id, title and field definitions.
    pub async fn fetch_project(&self) -> Result<ProjectInfo, GitHubError> {
        let data: OrganizationData<ProjectNode> = self
            .execute(
                PROJECT_QUERY,
                json!({ "org": self.organization, "projectNumber": self.project_number }),
            )
            .await?;
        let project = data
            .organization
            .and_then(|o| o.project)
            .ok_or_else(|| self.not_found())?;

        let fields = project
            .fields
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|f| {
                Some(ProjectField {
                    id: f.id?,
                    name: f.name?,
                    data_type: f.data_type.unwrap_or_default(),
                    options: f.options,
                })
            })
            .collect();

        Ok(ProjectInfo {
            id: project.id,
            title: project.title,
            fields,
        })
    }

    /// Every item on the project, following pagination to the end.
    pub async fn fetch_items(&self) -> Result<Vec<ProjectItem>, GitHubError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: OrganizationData<ItemsProjectNode> = self
                .execute(
                    ITEMS_QUERY,
                    json!({
                        "org": self.organization,
                        "projectNumber": self.project_number,
                        "cursor": cursor,
                    }),
                )
                .await?;
            let page = data
                .organization
                .and_then(|o| o.project)
                .ok_or_else(|| self.not_found())?
                .items;

            let before = items.len();
            items.extend(page.nodes.into_iter().flatten().map(ItemNode::into_item));
            debug!(fetched = items.len() - before, total = items.len(), "fetched project items page");

            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        info!(
            organization = %self.organization,
            project = self.project_number,
            items = items.len(),
            "fetched project items"
        );
        Ok(items)
    }

    /// Write `value` into `field_id` of `item_id`.
    pub async fn update_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        value: &FieldValue,
    ) -> Result<(), GitHubError> {
        let _: Value = self
            .execute(
                UPDATE_MUTATION,
                json!({
                    "projectId": project_id,
                    "itemId": item_id,
                    "fieldId": field_id,
                    "value": graphql_value(value),
                }),
            )
            .await?;
        debug!(item = item_id, value = %value, "updated field value");
        Ok(())
    }
}
