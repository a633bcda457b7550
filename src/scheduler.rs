//! Deferred-check scheduler.
//!
//! Single-shot checks keyed by `(context, kind)`.  The scheduler never
//! touches a gate context: when a check is due it notifies a
//! [`SchedulerDelegate`], and the actor that owns the context decides what
//! to do with it.  That keeps every firing on the actor's own loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Check sources                           │
//! │                                                              │
//! │   ┌────────────────────┐          ┌────────────────────┐     │
//! │   │ Settle             │          │ ReplyWatchdog      │     │
//! │   │ (open/close time)  │          │ (get-status reply) │     │
//! │   └─────────┬──────────┘          └─────────┬──────────┘     │
//! │             │  arm / cancel                 │                │
//! │             ▼                               ▼                │
//! │   ┌──────────────────────────────────────────────────────┐   │
//! │   │  Scheduler table  (fixed capacity, key-unique)       │   │
//! │   └──────────────────────────┬───────────────────────────┘   │
//! │                              │ tick(now) → due, in order     │
//! │                              ▼                               │
//! │                     SchedulerDelegate                        │
//! │                     GateService.tick()                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::SchedulerDelegate;
use crate::config::ContextId;
use log::{debug, warn};

// ═══════════════════════════════════════════════════════════════
//  Check identity
// ═══════════════════════════════════════════════════════════════

/// What a check is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// The configured open/close time elapsed; re-poll the device.
    Settle,
    /// A get-status request went unanswered.
    ReplyWatchdog,
}

/// Identity of an armed check.  Arming an existing key replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckKey {
    pub context: ContextId,
    pub kind: CheckKind,
}

impl CheckKey {
    pub fn new(context: ContextId, kind: CheckKind) -> Self {
        Self { context, kind }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Checks one gate can have armed at once: a settle check and a reply
/// watchdog.
pub const CHECKS_PER_GATE: usize = 2;

#[derive(Debug, Clone)]
struct CheckEntry {
    key: CheckKey,
    /// Monotonic deadline (milliseconds).
    due_ms: u64,
}

/// The scheduler engine, holding at most `N` armed checks.
///
/// Time is passed in by the caller (monotonic milliseconds), so tests
/// drive it without a clock.
pub struct Scheduler<const N: usize> {
    checks: heapless::Vec<CheckEntry, N>,
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Scheduler<N> {
    pub const fn new() -> Self {
        Self {
            checks: heapless::Vec::new(),
        }
    }

    /// Arm `key` to fire `delay_ms` after `now_ms`, replacing any check
    /// already armed under the same key.  Returns `false` if the table is full.
    pub fn arm(&mut self, key: CheckKey, delay_ms: u64, now_ms: u64) -> bool {
        let due_ms = now_ms.saturating_add(delay_ms);
        if let Some(entry) = self.checks.iter_mut().find(|e| e.key == key) {
            debug!("Scheduler: re-armed {:?}/{} in {}ms", key.kind, key.context, delay_ms);
            entry.due_ms = due_ms;
            return true;
        }
        debug!("Scheduler: armed {:?}/{} in {}ms", key.kind, key.context, delay_ms);
        if self.checks.push(CheckEntry { key, due_ms }).is_err() {
            warn!("Scheduler: table full ({} checks), check dropped", N);
            return false;
        }
        true
    }

    /// Cancel one check.  Returns `true` if it was armed.
    pub fn cancel(&mut self, key: &CheckKey) -> bool {
        match self.checks.iter().position(|e| &e.key == key) {
            Some(i) => {
                self.checks.swap_remove(i);
                debug!("Scheduler: cancelled {:?}/{}", key.kind, key.context);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, key: &CheckKey) -> bool {
        self.checks.iter().any(|e| &e.key == key)
    }

    /// Deadline of one check, if armed.
    pub fn due_at(&self, key: &CheckKey) -> Option<u64> {
        self.checks.iter().find(|e| &e.key == key).map(|e| e.due_ms)
    }

    /// Earliest deadline, or `None` when nothing is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.checks.iter().map(|e| e.due_ms).min()
    }

    /// Fire every check due at `now_ms`, earliest deadline first.
    ///
    /// Each fired check is removed before `delegate.on_check_fired()` is
    /// called, so the delegate may immediately re-arm the same key.
    /// Returns the number of checks fired.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) -> usize {
        let mut fired = 0;
        while let Some(i) = self.earliest_due(now_ms) {
            let entry = self.checks.swap_remove(i);
            debug!(
                "Scheduler: {:?}/{} fired ({}ms late)",
                entry.key.kind,
                entry.key.context,
                now_ms - entry.due_ms
            );
            delegate.on_check_fired(&entry.key);
            fired += 1;
        }
        fired
    }

    /// Number of armed checks.
    pub fn armed_count(&self) -> usize {
        self.checks.len()
    }

    fn earliest_due(&self, now_ms: u64) -> Option<usize> {
        self.checks
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| e.due_ms)
            .map(|(i, _)| i)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
