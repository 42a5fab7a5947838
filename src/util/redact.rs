use crate::Auth;

pub(crate) fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replace every credential of `auth` found in `text`.
pub(crate) fn redact_text(text: String, auth: Option<&Auth>) -> String {
    let Some(secret) = auth.map(Auth::secret).filter(|s| !s.is_empty()) else {
        return text;
    };
    text.replace(secret, "<redacted>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8("héllo", 2), "h");
        assert_eq!(truncate_utf8("abc", 10), "abc");
    }

    #[test]
    fn redacts_token() {
        let auth = Auth::basic("deployer", "s3cret");
        let out = redact_text("token=s3cret".to_owned(), Some(&auth));
        assert_eq!(out, "token=<redacted>");
    }
}
