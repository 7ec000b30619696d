//! Generation tokens for in-flight requests.
//!
//! Each logical slot (list fetch, detail fetch, status update, ...) owns a
//! [`RequestTracker`]. Starting a request issues a token with a strictly
//! increasing sequence number; a result is applied only when its token is
//! still the latest one issued by that slot and the slot has not been closed.

/// Ticket attached to one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Sequence number of the request
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Issues tokens for one logical request slot
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    in_flight: bool,
    closed: bool,
}

impl RequestTracker {
    /// Tracker with nothing issued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any earlier one
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        self.in_flight = !self.closed;
        RequestToken(self.issued)
    }

    /// Whether `token` is the latest request and the slot is still open
    #[must_use]
    pub const fn is_current(&self, token: RequestToken) -> bool {
        !self.closed && token.0 == self.issued
    }

    /// Mark `token` as resolved. Returns whether its result should be applied.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        let current = self.is_current(token);
        if current {
            self.in_flight = false;
        }
        current
    }

    /// Whether the latest request has not resolved yet
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Drop interest in whatever is outstanding without closing the slot
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.in_flight = false;
    }

    /// Permanently stop applying results (the owning view went away)
    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = false;
    }

    /// Whether [`RequestTracker::close`] has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_token_wins() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(first < second);
        assert!(tracker.in_flight());
        assert!(!tracker.complete(first));
        assert!(tracker.in_flight());
        assert!(tracker.complete(second));
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_invalidate_drops_outstanding() {
        let mut tracker = RequestTracker::new();
        let token = tracker.issue();
        tracker.invalidate();
        assert!(!tracker.complete(token));
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_closed_slot_applies_nothing() {
        let mut tracker = RequestTracker::new();
        let token = tracker.issue();
        tracker.close();
        assert!(!tracker.complete(token));
        let later = tracker.issue();
        assert!(!tracker.complete(later));
        assert!(tracker.is_closed());
    }
}
