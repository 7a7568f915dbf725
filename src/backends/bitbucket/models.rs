use serde::{de, Deserialize, Deserializer};

// Only the fields needed to build changes are declared.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub username: String,
    pub display_name: String,
}

impl Actor {
    pub fn author(&self) -> String {
        format!("{} <{}>", self.display_name, self.username)
    }
}

#[derive(Debug, Deserialize)]
pub struct Project {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default)]
    pub self_links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub scm_id: String,
    pub project: Project,
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct Target {
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct RefState {
    pub name: String,
    pub target: Target,
}

#[derive(Debug, Deserialize)]
pub struct PushChange {
    pub new: RefState,
}

#[derive(Debug, Deserialize)]
pub struct Push {
    pub changes: Vec<PushChange>,
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    pub actor: Actor,
    pub repository: Repository,
    pub push: Push,
}

#[derive(Debug, Deserialize)]
pub struct Branch {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    pub branch: Option<Branch>,
    pub commit: Option<Commit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub link: String,
    pub to_ref: Option<PullRequestRef>,
    pub from_ref: Option<PullRequestRef>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub actor: Actor,
    pub repository: Repository,
    pub pullrequest: PullRequest,
}

/// Pull request ids show up both as numbers and as numeric strings.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Number(n) => Ok(n),
        Id::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid pull request id: {}", s))),
    }
}
