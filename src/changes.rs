use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChangeCategory {
    Push,
    PullCreated,
    PullUpdated,
    PullFulfilled,
    PullRejected,
}

/// A single commit or pull request event, ready for the CI host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub author: String,
    pub comments: String,
    pub revision: Option<String>,
    pub branch: String,
    pub revlink: String,
    pub repository: String,
    pub category: ChangeCategory,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Changes produced by one webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub changes: Vec<Change>,
    pub scm_id: String,
}
