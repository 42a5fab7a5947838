//! Details pulled out of failed responses for [`crate::HttpError`].

use crate::{Auth, BodySnippetConfig};
use http::HeaderMap;

use super::redact::{redact_text, truncate_utf8};

pub(crate) fn request_id(headers: &HeaderMap) -> Option<Box<str>> {
    ["x-request-id", "x-correlation-id", "x-jenkins-session"]
        .into_iter()
        .filter_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(Into::into)
}

/// Error message from a JSON body (`message`/`error`) or, for the HTML error pages the server
/// renders, the page `<title>`.
pub(crate) fn extract_message(body: &[u8]) -> Option<Box<str>> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        return ["message", "error", "Message", "Error"]
            .into_iter()
            .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|msg| !msg.is_empty())
            .map(Into::into);
    }

    let text = String::from_utf8_lossy(body);
    let start = text.find("<title>")? + "<title>".len();
    let end = start + text[start..].find("</title>")?;
    let title = text[start..end].trim();
    (!title.is_empty()).then(|| title.into())
}

pub(crate) fn body_snippet(
    body: &[u8],
    config: BodySnippetConfig,
    auth: Option<&Auth>,
) -> Option<Box<str>> {
    if !config.enabled {
        return None;
    }

    let body = String::from_utf8_lossy(body);
    let snippet = truncate_utf8(&body, config.max_bytes).to_string();
    Some(redact_text(snippet, auth).into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_json_body() {
        let msg = extract_message(br#"{"message":"  no such job  "}"#);
        assert_eq!(msg.as_deref(), Some("no such job"));
    }

    #[test]
    fn message_from_html_title() {
        let msg = extract_message(b"<html><head><title>Error 404 Not Found</title></head></html>");
        assert_eq!(msg.as_deref(), Some("Error 404 Not Found"));
        assert_eq!(extract_message(b"plain text"), None);
    }

    #[test]
    fn snippet_is_truncated_and_disabled_on_request() {
        let config = BodySnippetConfig {
            enabled: true,
            max_bytes: 4,
        };
        assert_eq!(body_snippet(b"abcdef", config, None).as_deref(), Some("abcd"));

        let off = BodySnippetConfig {
            enabled: false,
            max_bytes: 4,
        };
        assert_eq!(body_snippet(b"abcdef", off, None), None);
    }
}
