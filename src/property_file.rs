//! Build property files (`*.properties`, `*.json`, `*.yml`/`*.yaml`) normalized into one
//! ordered key/value map.

use crate::Error;
use serde_json::{Map, Value};
use std::{fmt, path::Path};

/// Ordered mapping produced from a property file. Values keep the source typing: properties
/// files only yield strings, JSON and YAML keep numbers, booleans, maps and sequences.
pub type PropertyMap = Map<String, Value>;

/// Syntax of a property file, resolved once from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyFormat {
    /// Line-oriented `key=value` pairs.
    Properties,
    Json,
    Yaml,
}

impl PropertyFormat {
    const BY_EXTENSION: &'static [(&'static str, PropertyFormat)] = &[
        ("json", PropertyFormat::Json),
        ("yml", PropertyFormat::Yaml),
        ("yaml", PropertyFormat::Yaml),
    ];

    /// Format for `file_name`; unknown or missing extensions fall back to [`Self::Properties`].
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return Self::Properties;
        };
        Self::BY_EXTENSION
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(Self::Properties, |(_, format)| *format)
    }

    /// Parse `bytes` in this format.
    pub fn decode(self, bytes: &[u8]) -> Result<PropertyMap, DecodeError> {
        match self {
            Self::Properties => Ok(decode_properties(std::str::from_utf8(bytes)?)),
            Self::Json => into_map(serde_json::from_slice::<Value>(bytes)?),
            Self::Yaml => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(PropertyMap::new());
                }
                into_map(serde_yaml::from_slice::<Value>(bytes)?)
            }
        }
    }
}

impl fmt::Display for PropertyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Properties => "properties",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Properties files are read as UTF-8; invalid bytes are not replaced.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("top-level value must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// Decode the content of `file_name`, picking the format from its extension.
pub fn decode(file_name: &str, bytes: &[u8]) -> Result<PropertyMap, Error> {
    let format = PropertyFormat::from_file_name(file_name);
    format.decode(bytes).map_err(|err| Error::PropertyFile {
        file_name: file_name.into(),
        format,
        source: Box::new(err),
    })
}

fn into_map(value: Value) -> Result<PropertyMap, DecodeError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(DecodeError::NotAMapping("null")),
        Value::Bool(_) => Err(DecodeError::NotAMapping("a boolean")),
        Value::Number(_) => Err(DecodeError::NotAMapping("a number")),
        Value::String(_) => Err(DecodeError::NotAMapping("a string")),
        Value::Array(_) => Err(DecodeError::NotAMapping("a sequence")),
    }
}

fn decode_properties(text: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_owned(), Value::String(value.trim().to_owned()));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_resolves_from_extension() {
        assert_eq!(PropertyFormat::from_file_name("build.json"), PropertyFormat::Json);
        assert_eq!(PropertyFormat::from_file_name("out/b.YML"), PropertyFormat::Yaml);
        assert_eq!(PropertyFormat::from_file_name("b.yaml"), PropertyFormat::Yaml);
        assert_eq!(
            PropertyFormat::from_file_name("build.properties"),
            PropertyFormat::Properties
        );
        assert_eq!(PropertyFormat::from_file_name("props"), PropertyFormat::Properties);
    }

    #[test]
    fn properties_values_are_trimmed_strings() {
        let map = decode(
            "build.properties",
            b"# comment\n a = hello \nb=world\nno-separator\nc=3\nurl=http://x?y=z\n",
        )
        .unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"a": "hello", "b": "world", "c": "3", "url": "http://x?y=z"})
        );
    }

    #[test]
    fn json_and_properties_differ_only_in_number_typing() {
        let props = decode("build.properties", b"a=hello\nb=world\nc=3").unwrap();
        let json_map = decode("build.json", br#"{"a":"hello","b":"world","c":3}"#).unwrap();

        assert_eq!(props["a"], json_map["a"]);
        assert_eq!(props["b"], json_map["b"]);
        assert_eq!(props["c"], json!("3"));
        assert_eq!(json_map["c"], json!(3));
    }

    #[test]
    fn yaml_matches_json_typing() {
        let yaml = decode(
            "build.yml",
            b"a: hello\nb: world\nc: 3\nnested:\n  flag: true\n  list:\n    - 1\n    - two\n",
        )
        .unwrap();
        let json_map = decode(
            "build.json",
            br#"{"a":"hello","b":"world","c":3,"nested":{"flag":true,"list":[1,"two"]}}"#,
        )
        .unwrap();
        assert_eq!(yaml, json_map);
    }

    #[test]
    fn keys_keep_document_order() {
        let map = decode("b.json", br#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn malformed_content_is_a_property_file_error() {
        let err = decode("build.json", b"{not json").unwrap_err();
        assert!(matches!(
            err,
            Error::PropertyFile {
                format: PropertyFormat::Json,
                ..
            }
        ));

        let err = decode("build.yaml", b"a: [unclosed").unwrap_err();
        assert!(matches!(err, Error::PropertyFile { .. }));
    }

    #[test]
    fn invalid_utf8_in_properties_is_an_error() {
        let err = decode("build.properties", b"a=ok\nb=\xff\xfe\n").unwrap_err();
        assert!(matches!(
            err,
            Error::PropertyFile {
                format: PropertyFormat::Properties,
                ..
            }
        ));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn top_level_sequence_is_rejected() {
        let err = decode("build.json", b"[1,2]").unwrap_err();
        assert!(err.to_string().contains("sequence"));
    }
}
