// src/poll.rs

/// Fixed number of attempts standing in for a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    attempts: u16,
}

impl PollBudget {
    pub const fn new(attempts: u16) -> Self {
        PollBudget { attempts }
    }

    pub const fn attempts(&self) -> u16 {
        self.attempts
    }

    /// Calls `probe` until it yields `Some`, at most `attempts` times.
    ///
    /// Returns `Ok(None)` once the budget is spent. Errors from `probe` stop
    /// polling immediately.
    pub fn poll<T, E, F>(&self, mut probe: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Result<Option<T>, E>,
    {
        for _ in 0..self.attempts {
            if let Some(value) = probe()? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
