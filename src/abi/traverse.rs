//! Wall-clock budget shared by every schema walk and codec loop.

use std::time::{Duration, Instant};

use super::AbiError;

#[derive(Debug, Clone, Copy)]
pub struct TraverseContext {
    deadline: Instant,
    limit: Duration,
}

impl TraverseContext {
    pub fn new(limit: Duration) -> Self {
        TraverseContext { deadline: Instant::now() + limit, limit }
    }

    /// Polled once per work item. A zero budget fails on the first poll.
    pub fn check(&self) -> Result<(), AbiError> {
        if Instant::now() >= self.deadline {
            return Err(AbiError::DeadlineExceeded {
                limit_us: u64::try_from(self.limit.as_micros()).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}
