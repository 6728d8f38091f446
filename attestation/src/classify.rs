//! Attestation classification and the validity decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One property an attestation text may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationFlag {
    /// Carries the campaign tag.
    Tag,
    /// Mentions the bot account.
    Mention,
    /// Contains the peer address of the node that sent the attestation.
    SameNode,
}

impl AttestationFlag {
    pub const ALL: [AttestationFlag; 3] = [Self::Tag, Self::Mention, Self::SameNode];
}

impl fmt::Display for AttestationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => write!(f, "campaign tag"),
            Self::Mention => write!(f, "bot mention"),
            Self::SameNode => write!(f, "your node address"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationFlags {
    pub has_tag: bool,
    pub has_mention: bool,
    pub same_node: bool,
}

impl AttestationFlags {
    pub fn get(&self, flag: AttestationFlag) -> bool {
        match flag {
            AttestationFlag::Tag => self.has_tag,
            AttestationFlag::Mention => self.has_mention,
            AttestationFlag::SameNode => self.same_node,
        }
    }
}

/// Outcome of [`decide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Valid,
    Invalid { missing: Vec<AttestationFlag> },
}

impl Decision {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Case-insensitive search for `needle` ending on a word boundary, so
/// `#Relay` does not match `#RelayNetwork`.
fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    haystack.match_indices(&needle).any(|(idx, _)| {
        haystack[idx + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Derive the flags of an attestation text.
pub fn classify(
    text: &str,
    expected_tag: &str,
    expected_mention: &str,
    claimed_address: &str,
) -> AttestationFlags {
    AttestationFlags {
        has_tag: contains_token(text, expected_tag),
        has_mention: contains_token(text, expected_mention),
        same_node: !claimed_address.is_empty() && text.contains(claimed_address),
    }
}

/// Valid iff every flag in `required` is set. Flags outside the set and any
/// other content of the text are ignored.
pub fn decide(flags: &AttestationFlags, required: &[AttestationFlag]) -> Decision {
    let mut missing: Vec<AttestationFlag> =
        required.iter().copied().filter(|f| !flags.get(*f)).collect();
    missing.sort();
    missing.dedup();
    if missing.is_empty() {
        Decision::Valid
    } else {
        Decision::Invalid { missing }
    }
}
