use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::{changes::ChangeCategory, error::ErrorCode};

use super::models::{PullRequestEvent, PushEvent};
use super::normalizer::{CodebaseStrategy, WebhookEventNormalizer, WebhookRequest};

const PUSH_SAMPLE: &str = include_str!("./push_sample.json");
const PULL_REQUEST_SAMPLE: &str = include_str!("./pullrequest_sample.json");

fn json_request(event: &str, body: &str) -> WebhookRequest {
    WebhookRequest::new(event, "application/json", body)
}

fn push_sample_with_changes(count: usize) -> Value {
    let mut payload: Value = serde_json::from_str(PUSH_SAMPLE).unwrap();
    let changes = (0..count)
        .map(|i| {
            json!({
                "new": {
                    "type": "branch",
                    "name": format!("branch-{}", i),
                    "target": {"type": "commit", "hash": format!("{:040x}", i + 1)}
                }
            })
        })
        .collect::<Vec<_>>();
    payload["push"]["changes"] = Value::Array(changes);
    payload
}

#[test]
fn test_parse_push_event() {
    let event: PushEvent = serde_json::from_str(PUSH_SAMPLE).expect("should deserialize");
    assert_eq!(event.push.changes.len(), 1);
    assert_eq!(event.actor.author(), "John Smith <John>");
}

#[test]
fn test_parse_pull_request_event() {
    let event: PullRequestEvent =
        serde_json::from_str(PULL_REQUEST_SAMPLE).expect("should deserialize");
    assert_eq!(event.pullrequest.id, 20);
}

#[test]
fn test_parse_numeric_pull_request_id() {
    let mut payload: Value = serde_json::from_str(PULL_REQUEST_SAMPLE).unwrap();
    payload["pullrequest"]["id"] = json!(7);
    let event: PullRequestEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.pullrequest.id, 7);
}

#[test]
fn test_push_with_change() {
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", PUSH_SAMPLE))
        .unwrap();

    assert_eq!(batch.scm_id, "git");
    assert_eq!(batch.changes.len(), 1);

    let change = &batch.changes[0];
    assert_eq!(
        change.repository,
        "http://localhost:7990/users/john/repos/good-repo/"
    );
    assert_eq!(change.author, "John Smith <John>");
    assert_eq!(
        change.revision.as_deref(),
        Some("d156103f161e80ea351023e5e8d9bcb86f37924e")
    );
    assert_eq!(
        change.comments,
        "Bitbucket Server commit d156103f161e80ea351023e5e8d9bcb86f37924e"
    );
    assert_eq!(change.branch, "master");
    assert_eq!(
        change.revlink,
        "http://localhost:7990/users/john/repos/good-repo/commits/d156103f161e80ea351023e5e8d9bcb86f37924e"
    );
    assert_eq!(change.category, ChangeCategory::Push);
    assert_eq!(change.project, "John Smith");
    assert_eq!(change.codebase, None);
    assert!(change.properties.is_empty());
}

#[test]
fn test_push_emits_one_change_per_entry() {
    let payload = push_sample_with_changes(3);
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", &payload.to_string()))
        .unwrap();

    assert_eq!(batch.changes.len(), 3);
    for (i, change) in batch.changes.iter().enumerate() {
        assert_eq!(change.category, ChangeCategory::Push);
        assert_eq!(change.revision, Some(format!("{:040x}", i + 1)));
        assert_eq!(change.branch, format!("branch-{}", i));
    }
}

#[test]
fn test_push_without_changes() {
    let payload = push_sample_with_changes(0);
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", &payload.to_string()))
        .unwrap();

    assert!(batch.changes.is_empty());
    assert_eq!(batch.scm_id, "git");
}

#[test]
fn test_push_missing_actor() {
    let mut payload: Value = serde_json::from_str(PUSH_SAMPLE).unwrap();
    payload.as_object_mut().unwrap().remove("actor");

    let err = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", &payload.to_string()))
        .unwrap_err();
    assert_matches!(err, ErrorCode::MalformedEventBody(_));
}

#[test]
fn test_push_missing_changes_key() {
    let mut payload: Value = serde_json::from_str(PUSH_SAMPLE).unwrap();
    payload["push"].as_object_mut().unwrap().remove("changes");

    let err = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", &payload.to_string()))
        .unwrap_err();
    assert_matches!(err, ErrorCode::MalformedEventBody(_));
}

#[test]
fn test_push_without_repository_link() {
    let mut payload: Value = serde_json::from_str(PUSH_SAMPLE).unwrap();
    payload["repository"]["links"]["self"] = json!([]);

    let err = WebhookEventNormalizer::default()
        .process(&json_request("repo:push", &payload.to_string()))
        .unwrap_err();
    assert_matches!(
        err,
        ErrorCode::MalformedEventBodyField(field, _) if field == "repository.links.self"
    );
}

#[test]
fn test_push_from_form_payload() {
    let body: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", PUSH_SAMPLE)
        .finish();
    let request = WebhookRequest::new("repo:push", "application/x-www-form-urlencoded", body);

    let batch = WebhookEventNormalizer::default().process(&request).unwrap();
    assert_eq!(batch.changes.len(), 1);
}

#[test]
fn test_fixed_codebase() {
    let normalizer = WebhookEventNormalizer::new(CodebaseStrategy::Fixed("main".into()));
    let batch = normalizer
        .process(&json_request("repo:push", PUSH_SAMPLE))
        .unwrap();
    assert_eq!(batch.changes[0].codebase.as_deref(), Some("main"));
}

#[test]
fn test_derived_codebase() {
    let normalizer = WebhookEventNormalizer::new(CodebaseStrategy::derived(|payload| {
        payload["repository"]["slug"]
            .as_str()
            .unwrap_or_default()
            .to_owned()
    }));

    let batch = normalizer
        .process(&json_request("pullrequest:created", PULL_REQUEST_SAMPLE))
        .unwrap();
    assert_eq!(batch.changes[0].codebase.as_deref(), Some("myrepo"));
}

#[test]
fn test_pull_request_created() {
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("pullrequest:created", PULL_REQUEST_SAMPLE))
        .unwrap();

    assert_eq!(batch.scm_id, "git");
    assert_eq!(batch.changes.len(), 1);

    let change = &batch.changes[0];
    let link = "http://localhost:7990/projects/PRO/repos/myrepo/pull-requests/20";
    assert_eq!(change.category, ChangeCategory::PullCreated);
    assert_eq!(change.revision, None);
    assert_eq!(change.branch, "refs/pull-requests/20/merge");
    assert_eq!(change.revlink, link);
    assert_eq!(
        change.repository,
        "http://localhost:7990/projects/PRO/repos/myrepo/"
    );
    assert_eq!(change.comments, "Bitbucket Server Pull Request #20");
    assert_eq!(change.project, "Project");
    assert_eq!(
        change.properties.get("pullrequesturl").map(String::as_str),
        Some(link)
    );
}

#[test]
fn test_pull_request_updated() {
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("pullrequest:updated", PULL_REQUEST_SAMPLE))
        .unwrap();

    let change = &batch.changes[0];
    assert_eq!(change.category, ChangeCategory::PullUpdated);
    assert_eq!(change.revision, None);
    assert_eq!(change.branch, "refs/pull-requests/20/merge");
}

#[test]
fn test_pull_request_fulfilled() {
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("pullrequest:fulfilled", PULL_REQUEST_SAMPLE))
        .unwrap();

    let change = &batch.changes[0];
    assert_eq!(change.category, ChangeCategory::PullFulfilled);
    assert_eq!(change.revision, None);
    assert_eq!(change.branch, "refs/heads/master");
}

#[test]
fn test_pull_request_rejected() {
    let batch = WebhookEventNormalizer::default()
        .process(&json_request("pullrequest:rejected", PULL_REQUEST_SAMPLE))
        .unwrap();

    let change = &batch.changes[0];
    assert_eq!(change.category, ChangeCategory::PullRejected);
    assert_eq!(
        change.revision.as_deref(),
        Some("a87e21f7433d8c16ac7be7413483fbb76c72a8ba")
    );
    assert_eq!(change.branch, "refs/heads/feature");
}

#[test]
fn test_pull_request_rejected_without_commit() {
    let mut payload: Value = serde_json::from_str(PULL_REQUEST_SAMPLE).unwrap();
    payload["pullrequest"]["fromRef"]
        .as_object_mut()
        .unwrap()
        .remove("commit");

    let err = WebhookEventNormalizer::default()
        .process(&json_request("pullrequest:rejected", &payload.to_string()))
        .unwrap_err();
    assert_matches!(
        err,
        ErrorCode::MalformedEventBodyField(field, _) if field == "pullrequest.fromRef.commit.hash"
    );
}

#[test]
fn test_unknown_event() {
    let err = WebhookEventNormalizer::default()
        .process(&json_request("pr:opened", PULL_REQUEST_SAMPLE))
        .unwrap_err();
    assert_matches!(err, ErrorCode::UnknownEventType(key) if key == "pr_opened");
}

#[test]
fn test_unknown_event_with_unsupported_content_type() {
    let err = WebhookEventNormalizer::default()
        .process(&WebhookRequest::new("pr:opened", "text/plain", PULL_REQUEST_SAMPLE))
        .unwrap_err();
    assert_matches!(err, ErrorCode::UnsupportedContentType(ct) if ct == "text/plain");
}
