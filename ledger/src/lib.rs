//! Participant ledger.
//!
//! The ledger is the bot's registry of participants and their reward scores.
//! Scores only ever grow through named reward events; participants are never
//! removed once recorded. The in-memory [`ParticipantLedger`] is authoritative
//! while the bot runs. [`LedgerStore`] writes wholesale snapshots of it to the
//! key-value store, one set of records per campaign environment.

pub mod error;
pub mod ledger;
pub mod participant;
pub mod persist;
pub mod restore;
pub mod snapshot;

pub use error::LedgerError;
pub use ledger::ParticipantLedger;
pub use participant::{Participant, ParticipantState, ParticipantUpdate};
pub use persist::LedgerStore;
pub use restore::{RestoreOutcome, ScoreRestore};
pub use snapshot::{ChainMetadata, LedgerSnapshot, StateRecord};
