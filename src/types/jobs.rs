//! Job tree, job configuration and queue projections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node of the server's job tree; folders carry `jobs`, leaf jobs do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<JobNode>>,
}

impl JobNode {
    #[must_use]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: None,
        }
    }

    #[must_use]
    pub fn folder(name: impl Into<String>, jobs: Vec<JobNode>) -> Self {
        Self {
            name: name.into(),
            jobs: Some(jobs),
        }
    }
}

/// `{ "jobs": [...] }` wrapper of the root job list.
#[derive(Deserialize)]
pub(crate) struct JobTree {
    #[serde(default)]
    pub(crate) jobs: Vec<JobNode>,
}

/// A parameter declared by a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    /// Definition type, e.g. `ChoiceParameterDefinition` or `StringParameterDefinition`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_parameter_value: Option<DefaultParameterValue>,
    /// Allowed values; `None` means free-form.
    #[serde(default)]
    pub choices: Option<Vec<String>>,
}

impl ParameterDefinition {
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_parameter_value
            .as_ref()
            .and_then(|v| v.value.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultParameterValue {
    #[serde(default)]
    pub value: Option<Value>,
}

/// Declared configuration of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawJobConfig")]
#[non_exhaustive]
pub struct JobConfig {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub buildable: bool,
    pub parameter_definitions: Vec<ParameterDefinition>,
}

impl JobConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, parameter_definitions: Vec<ParameterDefinition>) -> Self {
        Self {
            name: name.into(),
            url: None,
            description: None,
            buildable: true,
            parameter_definitions,
        }
    }
}

#[derive(Deserialize)]
struct RawJobConfig {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "yes")]
    buildable: bool,
    #[serde(default)]
    property: Vec<RawJobProperty>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJobProperty {
    #[serde(default)]
    parameter_definitions: Option<Vec<ParameterDefinition>>,
}

fn yes() -> bool {
    true
}

impl From<RawJobConfig> for JobConfig {
    fn from(raw: RawJobConfig) -> Self {
        Self {
            name: raw.name,
            url: raw.url,
            description: raw.description,
            buildable: raw.buildable,
            parameter_definitions: raw
                .property
                .into_iter()
                .filter_map(|p| p.parameter_definitions)
                .flatten()
                .collect(),
        }
    }
}

/// A queue item, possibly already turned into a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQueueItem")]
#[non_exhaustive]
pub struct QueueItem {
    pub id: u64,
    pub why: Option<String>,
    pub cancelled: bool,
    /// Build number once the item left the queue.
    pub number: Option<u64>,
}

#[derive(Deserialize)]
struct RawQueueItem {
    id: u64,
    #[serde(default)]
    why: Option<String>,
    #[serde(default)]
    cancelled: bool,
    #[serde(default)]
    executable: Option<RawExecutable>,
}

#[derive(Deserialize)]
struct RawExecutable {
    number: u64,
}

impl From<RawQueueItem> for QueueItem {
    fn from(raw: RawQueueItem) -> Self {
        Self {
            id: raw.id,
            why: raw.why,
            cancelled: raw.cancelled,
            number: raw.executable.map(|e| e.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_config_flattens_parameter_definitions_from_properties() {
        let config: JobConfig = serde_json::from_value(json!({
            "_class": "hudson.model.FreeStyleProject",
            "name": "deploy",
            "buildable": true,
            "property": [
                {"_class": "jenkins.model.BuildDiscarderProperty"},
                {
                    "_class": "hudson.model.ParametersDefinitionProperty",
                    "parameterDefinitions": [
                        {
                            "_class": "hudson.model.ChoiceParameterDefinition",
                            "name": "flavor",
                            "type": "ChoiceParameterDefinition",
                            "defaultParameterValue": {"value": "why"},
                            "choices": ["why", "not"]
                        },
                        {
                            "name": "note",
                            "type": "StringParameterDefinition"
                        }
                    ]
                }
            ]
        }))
        .unwrap();

        assert_eq!(config.name, "deploy");
        assert_eq!(config.parameter_definitions.len(), 2);
        assert_eq!(
            config.parameter_definitions[0].choices.as_deref(),
            Some(&["why".to_owned(), "not".to_owned()][..])
        );
        assert_eq!(
            config.parameter_definitions[0].default_value(),
            Some(&json!("why"))
        );
        assert_eq!(config.parameter_definitions[1].choices, None);
    }

    #[test]
    fn queue_item_exposes_build_number_once_executed() {
        let waiting: QueueItem =
            serde_json::from_value(json!({"id": 5, "why": "Waiting for next executor"})).unwrap();
        assert_eq!(waiting.number, None);

        let started: QueueItem =
            serde_json::from_value(json!({"id": 5, "executable": {"number": 12, "url": "x"}}))
                .unwrap();
        assert_eq!(started.number, Some(12));
    }
}
