use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use strum::Display;

use crate::{
    build::{Build, GotRevision, PULL_REQUEST_URL, REPOSITORY},
    config::Config,
    interpolate::Template,
    service::ServiceHandler,
};

use super::error::ReporterError;

pub const STATUS_PATH: &str = "/rest/build-status/1.0/commits";
pub const PULL_REQUEST_API_PATH: &str = "/rest/api/1.0";

const DEFAULT_KEY: &str = "%(prop:buildername)s";
const DEFAULT_START_DESCRIPTION: &str = "Build started.";
const DEFAULT_END_DESCRIPTION: &str = "Build done.";
const DEFAULT_COMMENT_TEXT: &str = "Builder: %(prop:buildername)s Status: %(prop:statustext)s";
const COMMENT_PROPERTY_SOURCE: &str = "BitbucketServerPRCommentPush";

static PULL_REQUEST_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(http|https)://([^/]+)/(.+)$").unwrap());

/// Build status values understood by the build-status REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RemoteState {
    InProgress,
    Successful,
    Failed,
}

impl RemoteState {
    pub fn for_build(build: &Build) -> Self {
        match (build.complete, build.is_success()) {
            (false, _) => Self::InProgress,
            (true, true) => Self::Successful,
            (true, false) => Self::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReporterOptions {
    pub key: Template,
    pub status_name: Option<Template>,
    pub start_description: Template,
    pub end_description: Template,
    pub comment_text: Template,
    pub pull_request_comments: bool,
    pub verbose: bool,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.into(),
            status_name: None,
            start_description: DEFAULT_START_DESCRIPTION.into(),
            end_description: DEFAULT_END_DESCRIPTION.into(),
            comment_text: DEFAULT_COMMENT_TEXT.into(),
            pull_request_comments: true,
            verbose: false,
        }
    }
}

impl ReporterOptions {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();

        Self {
            key: config.status_key().map(Template::from).unwrap_or(defaults.key),
            status_name: config.status_name().map(Template::from),
            start_description: config
                .start_description()
                .map(Template::from)
                .unwrap_or(defaults.start_description),
            end_description: config
                .end_description()
                .map(Template::from)
                .unwrap_or(defaults.end_description),
            comment_text: config
                .comment_text()
                .map(Template::from)
                .unwrap_or(defaults.comment_text),
            pull_request_comments: config.pull_request_comments(),
            verbose: config.verbose(),
        }
    }
}

/// What happened during one [`StatusReporter::send`] call.
#[derive(Debug, Default)]
pub struct SendOutcome {
    pub statuses_sent: usize,
    pub comment_sent: bool,
    pub errors: Vec<ReporterError>,
}

impl SendOutcome {
    fn record_error(&mut self, error: ReporterError) {
        tracing::error!(error = %error, "{}", error);
        self.errors.push(error);
    }
}

#[derive(Debug, Clone)]
pub struct StatusReporter {
    options: ReporterOptions,
    services: ServiceHandler,
}

impl StatusReporter {
    pub fn new(options: ReporterOptions, services: ServiceHandler) -> Self {
        Self { options, services }
    }

    /// Push the build state for every sourcestamp, then comment on the pull
    /// request once the build is complete. Failures are logged and collected.
    #[tracing::instrument(skip_all, fields(url = %build.url, complete = build.complete))]
    pub async fn send(&self, build: &Build) -> SendOutcome {
        let mut outcome = SendOutcome::default();
        let state = RemoteState::for_build(build);
        let description = if build.complete {
            &self.options.end_description
        } else {
            &self.options.start_description
        };
        let got_revision = build.properties.got_revision();

        for stamp in &build.buildset.sourcestamps {
            let sha = match stamp.resolve_revision(got_revision.as_ref()) {
                Some(sha) => sha,
                None => {
                    outcome.record_error(ReporterError::MissingRevision(stamp.codebase.clone()));
                    continue;
                }
            };

            match self.push_status(build, state, description, sha).await {
                Ok(()) => outcome.statuses_sent += 1,
                Err(e) => outcome.record_error(e),
            }
        }

        if build.complete
            && self.options.pull_request_comments
            && build.properties.contains(PULL_REQUEST_URL)
            && got_revision.is_some()
        {
            match self.send_pull_request_comment(build).await {
                Ok(()) => outcome.comment_sent = true,
                Err(e) => outcome.record_error(e),
            }
        }

        outcome
    }

    async fn push_status(
        &self,
        build: &Build,
        state: RemoteState,
        description: &Template,
        sha: &str,
    ) -> Result<(), ReporterError> {
        let properties = &build.properties;
        let mut payload = json!({
            "state": state,
            "url": build.url,
            "key": self.options.key.render(properties),
        });

        let description = description.render(properties);
        if !description.is_empty() {
            payload["description"] = json!(description);
        }
        if let Some(name) = &self.options.status_name {
            payload["name"] = json!(name.render(properties));
        }

        let response = self
            .services
            .rest()
            .post_json(&format!("{STATUS_PATH}/{sha}"), &payload)
            .await?;

        if response.status == 204 {
            if self.options.verbose {
                tracing::info!(status = %state, sha = sha, "Status \"{}\" sent for {}.", state, sha);
            }
            Ok(())
        } else {
            Err(ReporterError::RemoteApi {
                code: response.status,
                action: "Bitbucket Server status",
                body: response.body,
            })
        }
    }

    /// Comment the build result on the pull request found in the
    /// `pullrequesturl` property.
    #[tracing::instrument(skip_all, fields(url = %build.url))]
    pub async fn send_pull_request_comment(&self, build: &Build) -> Result<(), ReporterError> {
        let pr_url = build
            .properties
            .get_str(PULL_REQUEST_URL)
            .ok_or(ReporterError::MissingProperty(PULL_REQUEST_URL))?;
        let got_revision = build
            .properties
            .got_revision()
            .ok_or(ReporterError::MissingProperty(crate::build::GOT_REVISION))?;
        let path = pull_request_path(pr_url)?;

        let merged_link = merged_link(build, &got_revision);
        let status_text = if build.is_success() {
            "SUCCESS"
        } else {
            "FAILED"
        };

        let mut properties = build.properties.clone();
        properties.set("mergedlink", merged_link.as_str(), COMMENT_PROPERTY_SOURCE);
        properties.set("statustext", status_text, COMMENT_PROPERTY_SOURCE);
        properties.set("url", build.url.as_str(), COMMENT_PROPERTY_SOURCE);
        let text = self.options.comment_text.render(&properties);

        let response = self
            .services
            .rest()
            .post_json(
                &format!("{PULL_REQUEST_API_PATH}/{path}/comments"),
                &json!({ "text": text }),
            )
            .await?;

        if response.status == 201 {
            tracing::info!(
                text = %text,
                revision = %merged_link,
                "Comment sent to pull request"
            );
            Ok(())
        } else {
            Err(ReporterError::RemoteApi {
                code: response.status,
                action: "a comment",
                body: response.body,
            })
        }
    }
}

/// Path of a pull request relative to its server, e.g.
/// `projects/PRO/repos/myrepo/pull-requests/20`.
pub fn pull_request_path(pr_url: &str) -> Result<&str, ReporterError> {
    PULL_REQUEST_URL_REGEX
        .captures(pr_url)
        .and_then(|caps| caps.get(3))
        .map(|m| m.as_str())
        .ok_or_else(|| ReporterError::MalformedPullRequestUrl(pr_url.to_owned()))
}

/// Links to the commits the build ran on, one per codebase.
pub fn merged_link(build: &Build, got_revision: &GotRevision) -> String {
    match got_revision {
        GotRevision::Single(revision) => {
            let repository = build
                .properties
                .get_str(REPOSITORY)
                .or_else(|| {
                    build
                        .buildset
                        .sourcestamps
                        .first()
                        .map(|s| s.repository.as_str())
                })
                .unwrap_or_default();
            format!("{}/commits/{}", repository.trim_end_matches('/'), revision)
        }
        GotRevision::PerCodebase(_) => build
            .buildset
            .sourcestamps
            .iter()
            .filter_map(|stamp| {
                let revision = got_revision
                    .for_codebase(&stamp.codebase)
                    .or_else(|| stamp.revision.as_deref().filter(|r| !r.is_empty()))?;
                Some(format!(
                    "{}/commits/{}",
                    stamp.repository.trim_end_matches('/'),
                    revision
                ))
            })
            .collect::<Vec<_>>()
            .join(" & "),
    }
}
