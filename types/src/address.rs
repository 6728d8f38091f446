//! Relay-network and chain address types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Identity of a node on the relay network (a base58 peer id).
///
/// This is the stable identity of a participant. Ledger entries, probes and
/// outbound notifications are all keyed by it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress(String);

impl PeerAddress {
    pub const MIN_LEN: usize = 32;
    pub const MAX_LEN: usize = 64;

    /// Parse and validate a peer address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        let len_ok = (Self::MIN_LEN..=Self::MAX_LEN).contains(&raw.len());
        if !len_ok || !raw.chars().all(|c| BASE58_ALPHABET.contains(c)) {
            return Err(TypesError::InvalidPeerAddress(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines and chat responses.
    pub fn short(&self) -> String {
        let tail = &self.0[self.0.len() - 6..];
        format!("…{tail}")
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PeerAddress> for String {
    fn from(a: PeerAddress) -> Self {
        a.0
    }
}

/// A `0x`-prefixed, 20-byte chain account address.
///
/// Stored lowercased so that comparisons and storage keys are stable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NativeAddress(String);

impl NativeAddress {
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        let hex_part = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidNativeAddress(raw.to_string()))?;
        let bytes =
            hex::decode(hex_part).map_err(|_| TypesError::InvalidNativeAddress(raw.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypesError::InvalidNativeAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NativeAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NativeAddress> for String {
    fn from(a: NativeAddress) -> Self {
        a.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER: &str = "16Uiu2HAmQDFS8a4Bj5PGaTqQLME5SZTRNikz9nUPT3G4T6YL9o7V";

    #[test]
    fn parses_valid_peer_address() {
        let addr = PeerAddress::parse(PEER).unwrap();
        assert_eq!(addr.as_str(), PEER);
        assert_eq!(addr.short(), "…YL9o7V");
    }

    #[test]
    fn trims_whitespace_around_peer_address() {
        let addr = PeerAddress::parse(&format!("  {PEER}\n")).unwrap();
        assert_eq!(addr.as_str(), PEER);
    }

    #[test]
    fn rejects_non_base58_characters() {
        // '0', 'O', 'I' and 'l' are not in the base58 alphabet
        let bad = PEER.replace('Q', "0");
        assert!(PeerAddress::parse(&bad).is_err());
    }

    #[test]
    fn rejects_short_peer_address() {
        assert!(PeerAddress::parse("16Uiu2HA").is_err());
        assert!(PeerAddress::parse("").is_err());
    }

    #[test]
    fn peer_address_deserialization_validates() {
        let ok: Result<PeerAddress, _> = serde_json::from_str(&format!("\"{PEER}\""));
        assert!(ok.is_ok());
        let bad: Result<PeerAddress, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn native_address_is_lowercased() {
        let addr = NativeAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn native_address_requires_prefix_and_length() {
        assert!(NativeAddress::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(NativeAddress::parse("0xabcdef").is_err());
        assert!(NativeAddress::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }
}
