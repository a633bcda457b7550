//! Request id allocation and outstanding-request tracking.
//!
//! Every request gets a fresh id.  Only the newest request of each method
//! is tracked: issuing a second get-status supersedes the first, so a late
//! reply to the first one still resolves but is reported as stale.

use log::debug;

use super::codec::Method;

/// Monotonic, wrapping id source that never yields 0.
#[derive(Debug, Clone)]
pub struct RequestIds {
    next: u32,
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = match self.next.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        id
    }
}

/// Outcome of matching a reply id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The reply answers the newest request of `method`.
    Current(Method),
    /// Not (or no longer) tracked.
    Unknown,
}

/// Newest outstanding request id per method kind.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    slots: [Option<u32>; Method::COUNT],
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly sent request.  Returns the id it superseded, if any.
    pub fn track(&mut self, method: Method, id: u32) -> Option<u32> {
        let previous = self.slots[method.index()].replace(id);
        if let Some(old) = previous {
            debug!("RPC: {} #{} superseded by #{}", method.as_str(), old, id);
        }
        previous
    }

    /// Match a reply id and stop tracking it.
    pub fn resolve(&mut self, id: u64) -> Resolution {
        for method in Method::ALL {
            let slot = &mut self.slots[method.index()];
            if slot.is_some_and(|pending| u64::from(pending) == id) {
                *slot = None;
                return Resolution::Current(method);
            }
        }
        Resolution::Unknown
    }
}
