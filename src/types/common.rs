use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A hierarchical job name such as `folder/job/name`.
///
/// Stored as segments; empty segments are dropped on construction, so `a//b` and `a/b`
/// name the same job. Equality is per segment, never on a joined string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobName(Vec<String>);

impl JobName {
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self::from_segments(value.as_ref().split('/'))
    }

    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            segments
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
        )
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<&str> for JobName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&JobName> for JobName {
    fn from(value: &JobName) -> Self {
        value.clone()
    }
}

impl Serialize for JobName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// A job name in wire form: every segment percent-encoded, joined by literal `/`.
///
/// Only [`crate::job_path`] produces these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedJobName(String);

impl EncodedJobName {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedJobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A queue item id (treated as a string for maximum compatibility).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueItemId(String);

impl QueueItemId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueueItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QueueItemId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for QueueItemId {
    fn from(value: u64) -> Self {
        Self::new(value.to_string())
    }
}

/// CSRF protection token issued by `crumbIssuer`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Crumb {
    /// Header name the token must be sent under.
    #[serde(rename = "crumbRequestField", default = "default_crumb_field")]
    pub field: String,
    #[serde(rename = "crumb")]
    pub value: String,
}

fn default_crumb_field() -> String {
    "Jenkins-Crumb".to_owned()
}

/// Result of triggering a build.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct TriggeredBuild {
    /// Queue item id parsed from the `Location` header (when available).
    pub queue_item_id: Option<QueueItemId>,
    /// Raw `Location` header value (when available).
    pub location: Option<Box<str>>,
}

impl TriggeredBuild {
    pub(crate) fn from_location(location: Option<&str>) -> Self {
        let queue_item_id = location.and_then(parse_queue_item_id_from_location);
        Self {
            queue_item_id,
            location: location.map(|s| s.to_string().into_boxed_str()),
        }
    }
}

fn parse_queue_item_id_from_location(location: &str) -> Option<QueueItemId> {
    let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
    let item_pos = segments.iter().position(|s| *s == "item")?;
    let id = segments.get(item_pos + 1)?;
    Some(QueueItemId::new(*id))
}
