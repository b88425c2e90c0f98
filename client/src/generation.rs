/// Issued for every request; only the newest one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request counter. In-flight calls cannot be cancelled, so a
/// response is dropped instead when a newer request was issued after it.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: u64,
}

impl RequestGeneration {
    pub fn issue(&mut self) -> Ticket {
        self.latest = self.latest.saturating_add(1);
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Make every outstanding ticket stale without issuing a new request.
    pub fn invalidate(&mut self) {
        self.latest = self.latest.saturating_add(1);
    }
}
