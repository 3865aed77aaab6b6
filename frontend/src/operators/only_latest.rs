use std::cell::Cell;

/// Hands out one ticket per request; only the newest ticket is honored, so a
/// slow response to a superseded request can't overwrite newer state.
#[derive(Default, Debug)]
pub struct OnlyLatest {
    generation: Cell<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl OnlyLatest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        Ticket(next)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.generation.get() == ticket.0
    }
}
