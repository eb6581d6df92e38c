//! Per-fetch state and the sequence tokens that keep late responses from
//! overwriting newer ones.

/// Outcome of the most recent accepted request of one fetch effect.
#[derive(Debug, Default)]
pub enum Fetch<T, E> {
    /// Nothing requested, or the last result was reset.
    #[default]
    Idle,
    /// The latest request succeeded.
    Ready(T),
    /// The latest request failed.
    Failed(E),
}

impl<T, E> Fetch<T, E> {
    /// Successful payload, if any.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetch::Ready(value) => Some(value),
            Fetch::Idle | Fetch::Failed(_) => None,
        }
    }

    /// Failure, if any.
    #[must_use]
    pub fn failed(&self) -> Option<&E> {
        match self {
            Fetch::Failed(err) => Some(err),
            Fetch::Idle | Fetch::Ready(_) => None,
        }
    }

    /// True while nothing has been requested or the state was reset.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Fetch::Idle)
    }
}

impl<T, E> From<Result<T, E>> for Fetch<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Fetch::Ready(value),
            Err(err) => Fetch::Failed(err),
        }
    }
}

/// Sequence number carried by a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Issues tickets for one fetch effect and decides which response may be applied.
///
/// Only the most recently issued ticket is accepted, and only once. Anything
/// older is stale no matter when it arrives.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
    settled: u64,
}

impl RequestSequence {
    /// Create a sequence with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request about to be dispatched. Supersedes earlier tickets.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Accept a response. Returns `false` when the ticket is stale or already settled.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if ticket.0 == self.issued && self.settled < self.issued {
            self.settled = self.issued;
            true
        } else {
            false
        }
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.settled = self.issued;
    }

    /// True while the latest ticket has not been settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.settled < self.issued
    }
}
