use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{
    build::PULL_REQUEST_URL,
    changes::{Change, ChangeBatch, ChangeCategory},
    error::ErrorCode,
};

use super::models::{PullRequestEvent, PushEvent, Repository};

pub const EVENT_HEADER: &str = "X-Event-Key";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const FORM_PAYLOAD_FIELD: &str = "payload";

/// Known event kinds, keyed by the event header with `:` turned into `_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum EventKind {
    #[strum(serialize = "repo_push")]
    RepoPush,
    #[strum(serialize = "pullrequest_created")]
    PullRequestCreated,
    #[strum(serialize = "pullrequest_updated")]
    PullRequestUpdated,
    #[strum(serialize = "pullrequest_fulfilled")]
    PullRequestFulfilled,
    #[strum(serialize = "pullrequest_rejected")]
    PullRequestRejected,
}

impl EventKind {
    pub fn from_event_header(header: &str) -> Result<Self, ErrorCode> {
        let key = header.replace(':', "_");
        key.parse()
            .map_err(|_| ErrorCode::UnknownEventType(key.clone()))
    }
}

pub type CodebaseFn = dyn Fn(&Value) -> String + Send + Sync;

/// How the `codebase` of emitted changes is chosen.
#[derive(Clone)]
pub enum CodebaseStrategy {
    None,
    Fixed(String),
    Derived(Arc<CodebaseFn>),
}

impl CodebaseStrategy {
    pub fn derived<F>(func: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(func))
    }

    pub fn resolve(&self, payload: &Value) -> Option<String> {
        match self {
            Self::None => None,
            Self::Fixed(codebase) => Some(codebase.clone()),
            Self::Derived(func) => Some(func(payload)),
        }
    }
}

impl Default for CodebaseStrategy {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Debug for CodebaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Fixed(codebase) => f.debug_tuple("Fixed").field(codebase).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Raw webhook delivery, as seen by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub event_key: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl WebhookRequest {
    pub fn new<E, C, B>(event_key: E, content_type: C, body: B) -> Self
    where
        E: Into<String>,
        C: Into<String>,
        B: Into<String>,
    {
        Self {
            event_key: Some(event_key.into()),
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WebhookEventNormalizer {
    codebase: CodebaseStrategy,
}

impl WebhookEventNormalizer {
    pub fn new(codebase: CodebaseStrategy) -> Self {
        Self { codebase }
    }

    #[tracing::instrument(skip(self, request), fields(event = ?request.event_key))]
    pub fn process(&self, request: &WebhookRequest) -> Result<ChangeBatch, ErrorCode> {
        let event_key = request
            .event_key
            .as_deref()
            .ok_or(ErrorCode::MissingEventHeader)?;
        let payload = decode_payload(request.content_type.as_deref(), &request.body)?;
        let kind = EventKind::from_event_header(event_key)?;
        tracing::info!(kind = %kind, "Processing event");

        match kind {
            EventKind::RepoPush => self.handle_repo_push(&payload),
            EventKind::PullRequestCreated | EventKind::PullRequestUpdated => {
                let event: PullRequestEvent = parse_event(&payload)?;
                let branch = format!("refs/pull-requests/{}/merge", event.pullrequest.id);
                let category = if kind == EventKind::PullRequestCreated {
                    ChangeCategory::PullCreated
                } else {
                    ChangeCategory::PullUpdated
                };
                self.handle_pull_request(&payload, event, branch, category, None)
            }
            EventKind::PullRequestFulfilled => {
                let event: PullRequestEvent = parse_event(&payload)?;
                let target = event
                    .pullrequest
                    .to_ref
                    .as_ref()
                    .and_then(|r| r.branch.as_ref())
                    .ok_or_else(|| ErrorCode::missing_field("pullrequest.toRef.branch.name"))?;
                let branch = format!("refs/heads/{}", target.name);
                self.handle_pull_request(
                    &payload,
                    event,
                    branch,
                    ChangeCategory::PullFulfilled,
                    None,
                )
            }
            EventKind::PullRequestRejected => {
                let event: PullRequestEvent = parse_event(&payload)?;
                let from_ref = event
                    .pullrequest
                    .from_ref
                    .as_ref()
                    .ok_or_else(|| ErrorCode::missing_field("pullrequest.fromRef"))?;
                let branch = from_ref
                    .branch
                    .as_ref()
                    .map(|b| format!("refs/heads/{}", b.name))
                    .ok_or_else(|| ErrorCode::missing_field("pullrequest.fromRef.branch.name"))?;
                let revision = from_ref
                    .commit
                    .as_ref()
                    .map(|c| c.hash.clone())
                    .ok_or_else(|| ErrorCode::missing_field("pullrequest.fromRef.commit.hash"))?;
                self.handle_pull_request(
                    &payload,
                    event,
                    branch,
                    ChangeCategory::PullRejected,
                    Some(revision),
                )
            }
        }
    }

    fn handle_repo_push(&self, payload: &Value) -> Result<ChangeBatch, ErrorCode> {
        let event: PushEvent = parse_event(payload)?;
        let repo_url = repository_url(&event.repository)?;
        let author = event.actor.author();
        let codebase = self.codebase.resolve(payload);

        let changes: Vec<_> = event
            .push
            .changes
            .iter()
            .map(|entry| {
                let hash = &entry.new.target.hash;
                tracing::info!(revision = %hash, "New revision");

                Change {
                    author: author.clone(),
                    comments: format!("Bitbucket Server commit {}", hash),
                    revision: Some(hash.clone()),
                    branch: entry.new.name.clone(),
                    revlink: format!("{}commits/{}", repo_url, hash),
                    repository: repo_url.clone(),
                    category: ChangeCategory::Push,
                    project: event.repository.project.name.clone(),
                    codebase: codebase.clone(),
                    properties: BTreeMap::new(),
                }
            })
            .collect();

        tracing::info!(count = changes.len(), "Received changes from Bitbucket Server");

        Ok(ChangeBatch {
            changes,
            scm_id: event.repository.scm_id,
        })
    }

    fn handle_pull_request(
        &self,
        payload: &Value,
        event: PullRequestEvent,
        branch: String,
        category: ChangeCategory,
        revision: Option<String>,
    ) -> Result<ChangeBatch, ErrorCode> {
        let repo_url = repository_url(&event.repository)?;
        let pr = event.pullrequest;
        let mut properties = BTreeMap::new();
        properties.insert(PULL_REQUEST_URL.to_owned(), pr.link.clone());

        let change = Change {
            author: event.actor.author(),
            comments: format!("Bitbucket Server Pull Request #{}", pr.id),
            revision,
            branch,
            revlink: pr.link,
            repository: repo_url,
            category,
            project: event.repository.project.name,
            codebase: self.codebase.resolve(payload),
            properties,
        };

        tracing::info!(
            pull_request = pr.id,
            category = %change.category,
            "Received pull request change from Bitbucket Server"
        );

        Ok(ChangeBatch {
            changes: vec![change],
            scm_id: event.repository.scm_id,
        })
    }
}

/// Strip the trailing `browse` segment from a repository link.
pub fn normalize_repository_url(href: &str) -> &str {
    href.trim_end_matches("browse")
}

fn repository_url(repository: &Repository) -> Result<String, ErrorCode> {
    repository
        .links
        .self_links
        .first()
        .map(|link| normalize_repository_url(&link.href).to_owned())
        .ok_or_else(|| ErrorCode::missing_field("repository.links.self"))
}

fn decode_payload(content_type: Option<&str>, body: &str) -> Result<Value, ErrorCode> {
    let content_type = content_type.unwrap_or_default();

    if content_type.starts_with(JSON_CONTENT_TYPE) {
        Ok(serde_json::from_str(body)?)
    } else if content_type.starts_with(FORM_CONTENT_TYPE) {
        let payload = url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == FORM_PAYLOAD_FIELD)
            .map(|(_, value)| value)
            .ok_or_else(|| ErrorCode::missing_field(FORM_PAYLOAD_FIELD))?;
        Ok(serde_json::from_str(&payload)?)
    } else {
        Err(ErrorCode::UnsupportedContentType(content_type.to_owned()))
    }
}

fn parse_event<T: DeserializeOwned>(payload: &Value) -> Result<T, ErrorCode> {
    T::deserialize(payload).map_err(ErrorCode::MalformedEventBody)
}
