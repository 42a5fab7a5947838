//! Build metadata returned by `.../<n>/api/json`.

use serde::{Deserialize, Serialize};

/// Outcome of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    /// The build has not finished; the server reports `result: null` while `building: true`.
    Building,
    /// Anything else the server reports (`NOT_BUILT`, a missing result on a finished build, ...).
    #[serde(other)]
    Unknown,
}

impl BuildResult {
    fn resolve(result: Option<BuildResult>, building: bool) -> Self {
        match result {
            Some(result) => result,
            None if building => Self::Building,
            None => Self::Unknown,
        }
    }
}

/// A file produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    pub display_path: Option<String>,
    /// Lookup key for property-file retrieval.
    pub file_name: String,
    /// Path below `.../<n>/artifact/`.
    pub relative_path: String,
}

/// One executed instance of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBuild")]
#[non_exhaustive]
pub struct Build {
    pub number: u64,
    pub url: Option<String>,
    pub building: bool,
    pub result: BuildResult,
    /// Milliseconds.
    pub duration: u64,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub artifacts: Vec<BuildArtifact>,
}

impl Build {
    #[must_use]
    pub fn artifact(&self, file_name: &str) -> Option<&BuildArtifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }
}

#[derive(Deserialize)]
struct RawBuild {
    number: u64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    building: bool,
    #[serde(default)]
    result: Option<BuildResult>,
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    artifacts: Vec<BuildArtifact>,
}

impl From<RawBuild> for Build {
    fn from(raw: RawBuild) -> Self {
        Self {
            number: raw.number,
            url: raw.url,
            building: raw.building,
            result: BuildResult::resolve(raw.result, raw.building),
            duration: raw.duration,
            timestamp: raw.timestamp,
            artifacts: raw.artifacts,
        }
    }
}

/// `{ "builds": [...] }` wrapper of a job's build list.
#[derive(Deserialize)]
pub(crate) struct BuildList {
    #[serde(default)]
    pub(crate) builds: Vec<Build>,
}

/// A git revision a build was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericGitRevision {
    /// Full ref name, e.g. `refs/remotes/origin/master`.
    pub name: String,
    /// `name` without its remote-tracking or `refs/heads/` prefix.
    pub branch: String,
    pub sha1: String,
    pub remote_url: Option<String>,
}
