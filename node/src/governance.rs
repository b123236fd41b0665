// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Governance object intake, instrumented with test-log call sites.
//!
//! Every diagnostic line goes through `log_print!`, so with a test channel
//! configured the harness sees `govobj_received`, `govobj_accepted`,
//! `rate_too_high`, ... in the order the manager makes its decisions.

use crate::config::NodeConfig;
use crate::errors::{NodeError, Result};
use std::collections::{HashMap, HashSet};
use testlog::log_print;

/// Objects older than this are rejected.
pub const MAX_TIME_PAST_SECS: i64 = 60 * 60;
/// Objects this far in the future are rejected.
pub const MAX_TIME_FUTURE_SECS: i64 = 60 * 60;
/// Window for the per-masternode submission rate.
pub const RATE_WINDOW_SECS: i64 = 60 * 60;
/// Accepted objects expire after this long.
pub const OBJECT_LIFETIME_SECS: i64 = 2 * 60 * 60;

const GENESIS_TIME: i64 = 1_700_000_000;

#[derive(Clone, Debug, PartialEq)]
pub struct GovernanceObject {
    pub hash: String,
    pub masternode: String,
    pub timestamp: i64,
}

impl GovernanceObject {
    /// Object with a deterministic hash derived from `seed`.
    pub fn new(seed: u64, masternode: impl Into<String>, timestamp: i64) -> Self {
        Self {
            hash: blake3::hash(&seed.to_le_bytes()).to_hex().to_string(),
            masternode: masternode.into(),
            timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    AlreadySeen,
    InvalidTime,
    RateTooHigh,
}

pub struct GovernanceManager {
    max_rate: f64,
    block_height: u64,
    seen: HashSet<String>,
    accepted: HashMap<String, GovernanceObject>,
    submissions: HashMap<String, Vec<i64>>,
}

impl GovernanceManager {
    /// `max_rate` is objects per hour per masternode.
    pub fn new(max_rate: f64) -> Self {
        Self {
            max_rate,
            block_height: 0,
            seen: HashSet::new(),
            accepted: HashMap::new(),
            submissions: HashMap::new(),
        }
    }

    pub fn updated_block_tip(&mut self, height: u64) {
        self.block_height = height;
        log_print!("gobject", "CGovernanceManager::UpdatedBlockTip -- nCachedBlockHeight: %d\n", height);
    }

    pub fn process_object(&mut self, obj: &GovernanceObject, peer: u32, now: i64) -> Outcome {
        log_print!("gobject", "MNGOVERNANCEOBJECT -- Received object: %s\n", obj.hash);

        if self.seen.contains(&obj.hash) {
            log_print!("gobject", "MNGOVERNANCEOBJECT -- Received already seen object: %s\n", obj.hash);
            return Outcome::AlreadySeen;
        }
        self.seen.insert(obj.hash.clone());

        if obj.timestamp < now - MAX_TIME_PAST_SECS {
            log_print!(
                "gobject",
                "CGovernanceManager::MasternodeRateCheck -- object %s rejected due to too old timestamp, masternode vin = %s, timestamp = %d, current time = %d\n",
                obj.hash,
                obj.masternode,
                obj.timestamp,
                now
            );
            return Outcome::InvalidTime;
        }
        if obj.timestamp > now + MAX_TIME_FUTURE_SECS {
            log_print!(
                "gobject",
                "CGovernanceManager::MasternodeRateCheck -- object %s rejected due to too new (future) timestamp, masternode vin = %s, timestamp = %d, current time = %d\n",
                obj.hash,
                obj.masternode,
                obj.timestamp,
                now
            );
            return Outcome::InvalidTime;
        }

        let window = self.submissions.entry(obj.masternode.clone()).or_default();
        window.retain(|&t| t > now - RATE_WINDOW_SECS);
        let rate = (window.len() + 1) as f64 * 3600.0 / RATE_WINDOW_SECS as f64;
        if rate > self.max_rate {
            log_print!(
                "gobject",
                "CGovernanceManager::MasternodeRateCheck -- Rate too high: object hash = %s, masternode vin = %s, object timestamp = %d, rate = %f, max rate = %f\n",
                obj.hash,
                obj.masternode,
                obj.timestamp,
                rate,
                self.max_rate
            );
            return Outcome::RateTooHigh;
        }
        window.push(obj.timestamp);

        let from = format!("peer={}", peer);
        log_print!("gobject", "AddGovernanceObject -- %s new, received form %s\n", obj.hash, from);
        self.accepted.insert(obj.hash.clone(), obj.clone());
        Outcome::Accepted
    }

    /// Drop expired objects, reporting each one checked for deletion.
    ///
    /// Returns the number of objects removed.
    pub fn update_caches_and_clean(&mut self, now: i64) -> usize {
        let mut hashes: Vec<String> = self.accepted.keys().cloned().collect();
        hashes.sort();

        let mut removed = 0;
        for hash in hashes {
            let Some(obj) = self.accepted.get(&hash) else {
                continue;
            };
            let deletion_time = obj.timestamp + OBJECT_LIFETIME_SECS;
            let since_deletion = now - deletion_time;
            let expired = since_deletion >= 0;
            log_print!(
                "gobject",
                "CGovernanceManager::UpdateCachesAndClean -- Checking object for deletion: %s, deletion time = %d, time since deletion = %d, delete flag = %d, expired flag = %d\n",
                hash,
                deletion_time,
                since_deletion,
                0,
                expired as u8
            );
            if expired {
                self.accepted.remove(&hash);
                removed += 1;
            }
        }
        removed
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub removed: usize,
}

/// Play `cfg.rounds` rounds of governance traffic through the manager.
///
/// Each round advances the block tip, submits a fresh object, resubmits it,
/// and every third round submits a stale one. The final clean-up runs past
/// every object's lifetime.
pub fn play(cfg: &NodeConfig) -> Result<RunSummary> {
    if cfg.rounds == 0 {
        return Err(NodeError::InvalidInput("rounds must be at least 1".into()));
    }

    let mut manager = GovernanceManager::new(cfg.rounds as f64);
    let mut summary = RunSummary::default();
    let mut now = GENESIS_TIME;

    for round in 0..cfg.rounds as u64 {
        manager.updated_block_tip(1000 + round);

        let fresh = GovernanceObject::new(round, "mn0", now);
        let stale = GovernanceObject::new(10_000 + round, "mn1", now - 2 * MAX_TIME_PAST_SECS);

        let mut outcomes = vec![manager.process_object(&fresh, 1, now), manager.process_object(&fresh, 2, now)];
        if round % 3 == 2 {
            outcomes.push(manager.process_object(&stale, 1, now));
        }
        for outcome in outcomes {
            match outcome {
                Outcome::Accepted => summary.accepted += 1,
                _ => summary.rejected += 1,
            }
        }

        if !cfg.interval.is_zero() {
            std::thread::sleep(cfg.interval);
        }
        now += 60;
    }

    summary.removed = manager.update_caches_and_clean(now + OBJECT_LIFETIME_SECS);
    tracing::info!(?summary, "Governance run finished");
    Ok(summary)
}
