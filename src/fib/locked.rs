use std::sync::{Arc, RwLock, RwLockReadGuard, TryLockError};

use crossbeam_utils::Backoff;
use log::trace;

use super::Fib;
use crate::errors::{FatalError, FatalResult};
use crate::stats::FibStats;
use crate::types::{Bitmap, Name};

//------------ LockedFib ------------------------------------------------------

/// A FIB backend shared between threads.
///
/// Lookups run concurrently, an insert excludes everything else. Cloning a
/// `LockedFib` yields another handle to the same table.
///
/// An insert blocks until it holds the lock, a lookup retries with a
/// backoff while an insert holds or waits for it.
///
/// If a thread panics while inserting, the lock is poisoned and every later
/// call returns a [FatalError].
#[derive(Debug)]
pub struct LockedFib<F: Fib>(Arc<RwLock<F>>);

impl<F: Fib> LockedFib<F> {
    pub fn new(fib: F) -> Self {
        Self(Arc::new(RwLock::new(fib)))
    }

    /// Add `egress` to the ports of `name`, see [Fib::insert].
    pub fn insert(&self, name: &Name, egress: &Bitmap) -> FatalResult<bool> {
        let mut fib = self.0.write().map_err(|_| FatalError)?;
        Ok(fib.insert(name, egress))
    }

    /// The ports of the longest matching prefix of `name`, see [Fib::lpm].
    /// The result is copied out of the table, so that the lock can be
    /// released.
    pub fn lpm(&self, name: &Name) -> FatalResult<Option<Bitmap>> {
        let (fib, retry_count) = self.read_with_retry(0)?;
        if retry_count > 0 {
            trace!("read lock for {} after {} retries", name, retry_count);
        }
        Ok(fib.lpm(name).map(|egress| egress.into_owned()))
    }

    pub fn stats(&self) -> FatalResult<FibStats> {
        let (fib, _) = self.read_with_retry(0)?;
        Ok(fib.stats())
    }

    fn read_with_retry(
        &self,
        mut retry_count: usize,
    ) -> FatalResult<(RwLockReadGuard<'_, F>, usize)> {
        let backoff = Backoff::new();

        loop {
            match self.0.try_read() {
                Ok(guard) => return Ok((guard, retry_count)),
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Poisoned(_)) => return Err(FatalError),
            }

            backoff.snooze();
            retry_count += 1;
        }
    }
}

impl<F: Fib> Clone for LockedFib<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}
