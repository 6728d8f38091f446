//! Relay probes and the pending-probe registry.
//!
//! A probe asks the relay network to carry a message from the bot, through a
//! participant, back to the bot. The registry holds at most one pending probe
//! per participant. Probes leave the registry when they complete, expire or
//! are aborted; each probe carries an id so that a late timer or abort for an
//! earlier probe never touches a newer one.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use relaybot_types::{PeerAddress, Timestamp};
use tokio::task::AbortHandle;

use crate::VerificationError;

/// Prefix of the self-addressed relay-test body.
pub const RELAY_TEST_PREFIX: &str = "relay-test:";

/// Body of the relay-test message probing `participant`.
pub fn relay_test_body(participant: &PeerAddress) -> String {
    format!("{RELAY_TEST_PREFIX}{participant}")
}

/// The probed participant named in a relay-test body.
pub fn parse_relay_test(body: &str) -> Option<PeerAddress> {
    let raw = body.trim().strip_prefix(RELAY_TEST_PREFIX)?;
    PeerAddress::parse(raw).ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeId(pub u64);

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayProbe {
    pub id: ProbeId,
    pub participant: PeerAddress,
    pub started_at: Timestamp,
    pub deadline: Timestamp,
    pub outcome: ProbeOutcome,
}

struct ProbeEntry {
    probe: RelayProbe,
    timer: Option<AbortHandle>,
}

impl ProbeEntry {
    fn finish(mut self, outcome: ProbeOutcome) -> RelayProbe {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.probe.outcome = outcome;
        self.probe
    }

    /// Called from the timer task itself, so its handle is released rather
    /// than aborted.
    fn expire(mut self) -> RelayProbe {
        self.timer = None;
        self.probe.outcome = ProbeOutcome::Failed;
        self.probe
    }
}

/// Pending probes keyed by participant.
#[derive(Default)]
pub struct ProbeRegistry {
    pending: HashMap<PeerAddress, ProbeEntry>,
    next_id: u64,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending probe. Refused while another one is pending for the
    /// same participant.
    pub fn begin(
        &mut self,
        participant: &PeerAddress,
        now: Timestamp,
        timeout: Duration,
    ) -> Result<RelayProbe, VerificationError> {
        if self.pending.contains_key(participant) {
            return Err(VerificationError::ProbeAlreadyPending(participant.clone()));
        }
        self.next_id += 1;
        let probe = RelayProbe {
            id: ProbeId(self.next_id),
            participant: participant.clone(),
            started_at: now,
            deadline: now.saturating_add(timeout),
            outcome: ProbeOutcome::Pending,
        };
        self.pending.insert(
            participant.clone(),
            ProbeEntry {
                probe: probe.clone(),
                timer: None,
            },
        );
        Ok(probe)
    }

    /// Attach the timeout timer of probe `id`. Returns false (and aborts the
    /// timer) if that probe is no longer pending.
    pub fn attach_timer(&mut self, participant: &PeerAddress, id: ProbeId, timer: AbortHandle) -> bool {
        match self.pending.get_mut(participant) {
            Some(entry) if entry.probe.id == id => {
                entry.timer = Some(timer);
                true
            }
            _ => {
                timer.abort();
                false
            }
        }
    }

    pub fn is_pending(&self, participant: &PeerAddress) -> bool {
        self.pending.contains_key(participant)
    }

    pub fn get(&self, participant: &PeerAddress) -> Option<&RelayProbe> {
        self.pending.get(participant).map(|e| &e.probe)
    }

    /// The round trip arrived: remove whatever probe is pending for
    /// `participant` and cancel its timer. `None` if nothing was pending.
    pub fn complete(&mut self, participant: &PeerAddress) -> Option<RelayProbe> {
        self.pending
            .remove(participant)
            .map(|e| e.finish(ProbeOutcome::Succeeded))
    }

    /// The deadline of probe `id` elapsed. Must only be called from the
    /// probe's own timer task: the timer is left running.
    pub fn expire(&mut self, participant: &PeerAddress, id: ProbeId) -> Option<RelayProbe> {
        self.take_if(participant, id).map(ProbeEntry::expire)
    }

    /// Probe `id` could not be started.
    pub fn abort(&mut self, participant: &PeerAddress, id: ProbeId) -> Option<RelayProbe> {
        self.take_if(participant, id)
            .map(|e| e.finish(ProbeOutcome::Cancelled))
    }

    /// Cancel every pending probe.
    pub fn cancel_all(&mut self) -> Vec<RelayProbe> {
        self.pending
            .drain()
            .map(|(_, e)| e.finish(ProbeOutcome::Cancelled))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn take_if(&mut self, participant: &PeerAddress, id: ProbeId) -> Option<ProbeEntry> {
        if self.pending.get(participant)?.probe.id != id {
            return None;
        }
        self.pending.remove(participant)
    }
}
