//! Folder-aware job name encoding.
//!
//! A folder plugin exposes nested jobs as `/job/<folder>/job/<name>/...`. Names handed out by
//! [`crate::CiService::list_job_names`] already carry the interleaved `job` segments
//! (`folder/job/name`), so the wire form is just the name with each segment percent-encoded.

use crate::{EncodedJobName, JobName};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped inside a single path segment. `/` is included so a segment can never
/// introduce an extra path level; `%` is included so encoding is reversible.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// Literal segment a folder plugin puts in front of every nested item.
pub const FOLDER_SEPARATOR: &str = "job";

/// Percent-encode a single path segment.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Percent-encode every segment of `name` independently and join them with `/`.
#[must_use]
pub fn encode(name: &JobName) -> EncodedJobName {
    let encoded: Vec<String> = name.segments().iter().map(|s| encode_segment(s)).collect();
    EncodedJobName::new(encoded.join("/"))
}

/// Inverse of [`encode`]; the joining slashes are split before any segment is decoded.
#[must_use]
pub fn decode(wire: &str) -> JobName {
    JobName::from_segments(
        wire.split('/')
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned()),
    )
}

/// Interleave [`FOLDER_SEPARATOR`] between folder levels: `folder/job1` becomes
/// `folder/job/job1`.
#[must_use]
pub fn to_ci_path(name: &JobName) -> JobName {
    let mut segments = Vec::with_capacity(name.segments().len() * 2);
    for (i, segment) in name.segments().iter().enumerate() {
        if i > 0 {
            segments.push(FOLDER_SEPARATOR.to_owned());
        }
        segments.push(segment.clone());
    }
    JobName::from_segments(segments)
}

/// Append a child item to an already folder-qualified parent.
#[must_use]
pub(crate) fn child(parent: &JobName, name: &str) -> JobName {
    if parent.is_empty() {
        return JobName::new(name);
    }
    let mut segments = parent.segments().to_vec();
    segments.push(FOLDER_SEPARATOR.to_owned());
    segments.push(name.to_owned());
    JobName::from_segments(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_escapes_segments_but_not_joining_slashes() {
        let name = JobName::new("my folder/job/build & deploy");
        let wire = encode(&name);
        assert_eq!(wire.as_str(), "my%20folder/job/build%20&%20deploy");
    }

    #[test]
    fn decode_recovers_names_with_reserved_characters() {
        for raw in [
            "plain",
            "with space/job/x",
            "100%/job/done?",
            "a#b/job/c[1]",
            "ünï/job/cödé",
        ] {
            let name = JobName::new(raw);
            assert_eq!(decode(encode(&name).as_str()), name, "{raw}");
        }
    }

    #[test]
    fn slash_inside_a_segment_cannot_add_a_level() {
        let name = JobName::from_segments(["a/b"]);
        assert_eq!(encode(&name).as_str(), "a%2Fb");
    }

    #[test]
    fn to_ci_path_interleaves_job_segments() {
        let path = to_ci_path(&JobName::new("folder/job1"));
        assert_eq!(path.segments(), ["folder", "job", "job1"]);

        let flat = to_ci_path(&JobName::new("job3"));
        assert_eq!(flat.segments(), ["job3"]);
    }

    #[test]
    fn child_of_empty_parent_is_the_child_itself() {
        assert_eq!(child(&JobName::default(), "job3"), JobName::new("job3"));
        assert_eq!(
            child(&JobName::new("folder"), "job1"),
            JobName::new("folder/job/job1")
        );
    }
}
