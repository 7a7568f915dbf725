use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const GOT_REVISION: &str = "got_revision";
pub const PULL_REQUEST_URL: &str = "pullrequesturl";
pub const REPOSITORY: &str = "repository";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Could not read build file '{0}': {1}")]
    CouldNotReadFile(PathBuf, #[source] std::io::Error),
    #[error("Malformed build document: {0}")]
    MalformedBuild(#[from] serde_json::Error),
}

/// Buildbot result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BuildResult {
    Success,
    Warnings,
    Failure,
    Skipped,
    Exception,
    Retry,
    Cancelled,
    Unknown(u8),
}

impl From<u8> for BuildResult {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::Warnings,
            2 => Self::Failure,
            3 => Self::Skipped,
            4 => Self::Exception,
            5 => Self::Retry,
            6 => Self::Cancelled,
            other => Self::Unknown(other),
        }
    }
}

impl From<BuildResult> for u8 {
    fn from(value: BuildResult) -> Self {
        match value {
            BuildResult::Success => 0,
            BuildResult::Warnings => 1,
            BuildResult::Failure => 2,
            BuildResult::Skipped => 3,
            BuildResult::Exception => 4,
            BuildResult::Retry => 5,
            BuildResult::Cancelled => 6,
            BuildResult::Unknown(other) => other,
        }
    }
}

/// Build properties, stored as `name -> (value, source)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, (Value, String)>);

impl Properties {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).map(|(value, _)| value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn set<N, V, S>(&mut self, name: N, value: V, source: S)
    where
        N: Into<String>,
        V: Into<Value>,
        S: Into<String>,
    {
        self.0.insert(name.into(), (value.into(), source.into()));
    }

    /// Read `got_revision`, which is either a single revision or one
    /// revision per codebase.
    pub fn got_revision(&self) -> Option<GotRevision> {
        match self.get(GOT_REVISION)? {
            Value::String(s) if !s.is_empty() => Some(GotRevision::Single(s.clone())),
            Value::Object(map) => {
                let revisions: BTreeMap<_, _> = map
                    .iter()
                    .filter_map(|(codebase, rev)| {
                        rev.as_str()
                            .filter(|r| !r.is_empty())
                            .map(|r| (codebase.clone(), r.to_owned()))
                    })
                    .collect();
                (!revisions.is_empty()).then(|| GotRevision::PerCodebase(revisions))
            }
            _ => None,
        }
    }
}

impl<N, V, S> FromIterator<(N, V, S)> for Properties
where
    N: Into<String>,
    V: Into<Value>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V, S)>>(iter: T) -> Self {
        let mut properties = Self::new();
        for (name, value, source) in iter {
            properties.set(name, value, source);
        }
        properties
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GotRevision {
    Single(String),
    PerCodebase(BTreeMap<String, String>),
}

impl GotRevision {
    pub fn for_codebase(&self, codebase: &str) -> Option<&str> {
        match self {
            Self::Single(rev) => Some(rev),
            Self::PerCodebase(map) => map.get(codebase).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStamp {
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub codebase: String,
    #[serde(default)]
    pub repository: String,
}

impl SourceStamp {
    /// Stamp revision when set, otherwise the `got_revision` for this codebase.
    pub fn resolve_revision<'a>(&'a self, got_revision: Option<&'a GotRevision>) -> Option<&'a str> {
        self.revision
            .as_deref()
            .filter(|r| !r.is_empty())
            .or_else(|| got_revision.and_then(|g| g.for_codebase(&self.codebase)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buildset {
    #[serde(default)]
    pub sourcestamps: Vec<SourceStamp>,
}

/// Snapshot of a build as handed over by the CI host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub complete: bool,
    #[serde(default)]
    pub results: Option<BuildResult>,
    pub url: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub buildset: Buildset,
}

impl Build {
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BuildError::CouldNotReadFile(path.to_owned(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn is_success(&self) -> bool {
        self.results == Some(BuildResult::Success)
    }
}
