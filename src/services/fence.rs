/// Last-request-wins sequencing for list refreshes.
///
/// Each in-flight fetch takes a ticket from `begin`; `commit` accepts the
/// ticket only if no newer one has been committed since, so a slow, stale
/// response cannot overwrite fresher state.
#[derive(Debug, Default)]
pub struct FetchFence {
    issued: u64,
    applied: u64,
}

impl FetchFence {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Returns whether the response for `ticket` may be applied.
    pub fn commit(&mut self, ticket: u64) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }
}
