//! Log Redaction Layer
//!
//! Scrubs Google API keys, `key=` query parameters, and bearer tokens from
//! strings before they reach the log stream.

use once_cell::sync::Lazy;
use regex::Regex;

static GOOGLE_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{20,}").unwrap());
static KEY_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([?&]key=)[^&\s]+").unwrap());
static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = GOOGLE_KEY_RE.replace_all(input, "[REDACTED_KEY]");
    let redacted = KEY_PARAM_RE.replace_all(&redacted, "${1}[REDACTED_KEY]");
    BEARER_RE
        .replace_all(&redacted, "Bearer [REDACTED_TOKEN]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_google_keys_and_tokens() {
        let raw = "POST https://host/v1beta/models/x:generateContent?key=AIzaSyD-1234567890abcdefghijk&alt=json with Bearer eyJhbGciOiJIUzI1NiJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("AIzaSyD"));
        assert!(!clean.contains("eyJhbGci"));
        assert!(clean.contains("key=[REDACTED_KEY]&alt=json"));
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let raw = "pdftotext exited with status 1: Syntax Error";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
