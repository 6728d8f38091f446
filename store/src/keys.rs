//! Namespaced record keys.
//!
//! Every campaign environment owns its own set of records, addressed as
//! `<environment>/<kind>`.

use relaybot_types::Environment;
use std::fmt;

/// The records persisted per environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Participant address → score.
    Score,
    /// Connected peers, chain metadata and refresh timestamp.
    State,
    /// Participant address → full participant record.
    Participants,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::State => "state",
            Self::Participants => "participants",
        }
    }
}

/// Fully qualified storage key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordKey {
    environment: Environment,
    kind: RecordKind,
}

impl RecordKey {
    pub fn new(environment: &Environment, kind: RecordKind) -> Self {
        Self {
            environment: environment.clone(),
            kind,
        }
    }

    pub fn score(environment: &Environment) -> Self {
        Self::new(environment, RecordKind::Score)
    }

    pub fn state(environment: &Environment) -> Self {
        Self::new(environment, RecordKind::State)
    }

    pub fn participants(environment: &Environment) -> Self {
        Self::new(environment, RecordKind::Participants)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The flat string form used by backends.
    pub fn path(&self) -> String {
        format!("{}/{}", self.environment, self.kind.as_str())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.environment, self.kind.as_str())
    }
}
