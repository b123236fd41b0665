// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Test Event Registry
//!
//! Maps the exact text of a log format string to the event a test harness
//! should see in its place. Keys are compared byte for byte, trailing `\n`
//! included, so two templates that differ only in punctuation are distinct.
//!
//! The registry is built once and never mutated; lookups need no locking.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate format string in registry: {0:?}")]
    DuplicateFormat(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Structured event emitted in place of a matching log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent {
    /// Assertion key used by the harness
    pub event_name: &'static str,
    /// Zero-based argument positions, in output order
    pub selected_positions: &'static [usize],
}

impl TestEvent {
    pub const fn new(event_name: &'static str, selected_positions: &'static [usize]) -> Self {
        Self {
            event_name,
            selected_positions,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventRegistry {
    entries: FxHashMap<&'static str, TestEvent>,
}

impl EventRegistry {
    /// Build a registry from `(format, event)` pairs.
    ///
    /// Rejects the table if a format string appears twice.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'static str, TestEvent)>,
    {
        let mut map = FxHashMap::default();
        for (format, event) in entries {
            if map.insert(format, event).is_some() {
                return Err(RegistryError::DuplicateFormat(format.to_string()));
            }
        }
        Ok(Self { entries: map })
    }

    /// Registry holding the host application's interceptable messages.
    pub fn builtin() -> &'static EventRegistry {
        static BUILTIN: OnceLock<EventRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            EventRegistry::new(BUILTIN_MESSAGES.iter().cloned())
                .expect("built-in test message table has duplicate format strings")
        })
    }

    pub fn lookup(&self, format: &str) -> Option<&TestEvent> {
        self.entries.get(format)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Interceptable log templates of the host application.
///
/// Adding a message here is all that is needed to surface it to tests.
pub const BUILTIN_MESSAGES: &[(&str, TestEvent)] = &[
    // Network messages
    (
        "PushInventory --  inv: %s peer=%d\n",
        TestEvent::new("push_inventory", &[0]),
    ),
    (
        "SendMessages -- GETDATA -- requesting inv = %s peer=%d\n",
        TestEvent::new("get_data", &[0]),
    ),
    (
        "CGovernanceManager::UpdatedBlockTip -- nCachedBlockHeight: %d\n",
        TestEvent::new("update_block_tip", &[0]),
    ),
    // Governance object manager
    (
        "CNode::AskFor -- WARNING: inventory message dropped: mapAskFor.size = %d, setAskFor.size = %d, MAPASKFOR_MAX_SZ = %d, SETASKFOR_MAX_SZ = %d, nSkipped = %d, peer=%d\n",
        TestEvent::new("inv_dropped", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Received object: %s\n",
        TestEvent::new("govobj_received", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Too many orphan objects, missing masternode=%s\n",
        TestEvent::new("too_many_orphans", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Missing masternode for: %s, strError = %s\n",
        TestEvent::new("missing_mn", &[0]),
    ),
    (
        "CGovernanceManager::MasternodeRateCheck -- Rate too high: object hash = %s, masternode vin = %s, object timestamp = %d, rate = %f, max rate = %f\n",
        TestEvent::new("rate_too_high", &[0]),
    ),
    (
        "CGovernanceManager::MasternodeRateCheck -- object %s rejected due to too old timestamp, masternode vin = %s, timestamp = %d, current time = %d\n",
        TestEvent::new("govobj_invalid_time", &[0]),
    ),
    (
        "CGovernanceManager::MasternodeRateCheck -- object %s rejected due to too new (future) timestamp, masternode vin = %s, timestamp = %d, current time = %d\n",
        TestEvent::new("govobj_invalid_time", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Received unrequested object: %s\n",
        TestEvent::new("govobj_unrequested_received", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Received already seen object: %s\n",
        TestEvent::new("govobj_seen_received", &[0]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Governance object is invalid - %s\n",
        TestEvent::new("govobj_invalid_received", &[]),
    ),
    (
        "MNGOVERNANCEOBJECT -- Not enough fee confirmations for: %s, strError = %s\n",
        TestEvent::new("govobj_missing_confs", &[0]),
    ),
    (
        "AddGovernanceObject -- %s new, received form %s\n",
        TestEvent::new("govobj_accepted", &[0]),
    ),
    (
        "CGovernanceManager::CheckPostponedObjects -- additional relay: hash = %s\n",
        TestEvent::new("postponed_relay", &[0]),
    ),
    (
        "CGovernanceManager::CheckPostponedObjects -- additional relay of unknown object: %s\n",
        TestEvent::new("postponed_unknown_relay", &[0]),
    ),
    (
        "CGovernanceManager::UpdateCachesAndClean -- Checking object for deletion: %s, deletion time = %d, time since deletion = %d, delete flag = %d, expired flag = %d\n",
        TestEvent::new("checking_for_deletion", &[0, 4]),
    ),
];
