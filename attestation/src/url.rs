//! Attestation URL pattern.
//!
//! Accepted form: `https://<host>/<handle>/status/<id>` where host is one of
//! the known post hosts, handle is 1–15 word characters and id is numeric.
//! Query strings, fragments and trailing path segments (`/photo/1`) are ignored.

use std::fmt;

const HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
];

const MAX_HANDLE_LEN: usize = 15;

/// A recognised attestation post URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationUrl {
    handle: String,
    status_id: String,
}

impl AttestationUrl {
    /// Parse a single URL token.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))?;
        let rest = rest.split(['?', '#']).next()?;
        let mut segments = rest.split('/');
        let host = segments.next()?.to_ascii_lowercase();
        if !HOSTS.contains(&host.as_str()) {
            return None;
        }
        let handle = segments.next()?;
        let valid_handle = !handle.is_empty()
            && handle.len() <= MAX_HANDLE_LEN
            && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_handle || segments.next()? != "status" {
            return None;
        }
        let status_id = segments.next()?;
        if status_id.is_empty() || !status_id.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            handle: handle.to_string(),
            status_id: status_id.to_string(),
        })
    }

    /// First attestation URL appearing anywhere in a chat message.
    pub fn find_in(text: &str) -> Option<Self> {
        text.split_whitespace()
            .map(|token| token.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | ',' | '"')))
            .find_map(Self::parse)
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Post id, used as the participant's attestation id.
    pub fn status_id(&self) -> &str {
        &self.status_id
    }

    /// Canonical URL used for fetching and storage.
    pub fn canonical(&self) -> String {
        format!("https://twitter.com/{}/status/{}", self.handle, self.status_id)
    }
}

impl fmt::Display for AttestationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
