//! Token-versioned "latest wins" request tracking, shared by every
//! component with an async boundary: `SortManager` (backend sort),
//! `FilterEngine` (backend filter), `InfiniteScrollController` (load more).
//!
//! The core never awaits on behalf of the host: it issues a monotonic
//! token on request start and only accepts a
//! response carrying the *current* token — any stale response (one whose
//! token was superseded by a later request before it arrived) is
//! discarded.

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RequestToken(u64);

#[derive(Default)]
pub struct LatestWins {
    next: u64,
    in_flight: Option<u64>,
}

impl LatestWins {
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Issues a new token and marks it the current in-flight request,
    /// superseding whatever was in flight before.
    pub fn start(&mut self) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.in_flight = Some(token.0);
        token
    }

    /// Whether `token` is still the current in-flight request, i.e. the
    /// response carrying it should be applied rather than discarded.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight == Some(token.0)
    }

    /// Clears in-flight state, normally called once the current token's
    /// response has been applied (or rejected).
    pub fn complete(&mut self, token: RequestToken) {
        if self.is_current(token) {
            self.in_flight = None;
        }
    }
}
