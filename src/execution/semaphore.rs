use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding concurrent remote calls.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// Held while an invocation talks to the remote endpoint; releases its permit on drop.
pub struct Permit<'a> {
    sem: &'a Semaphore,
    /// Time spent blocked before the permit was granted.
    pub waited: Duration,
}

impl Semaphore {
    /// `permits` must be non-zero; the engine validates this before building one.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// Block until a permit is free.
    pub fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut blocked = false;
        let mut free = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *free == 0 {
            blocked = true;
            free = self.cv.wait(free).unwrap_or_else(PoisonError::into_inner);
        }
        *free -= 1;
        Permit {
            sem: self,
            waited: if blocked { start.elapsed() } else { Duration::ZERO },
        }
    }

    fn release(&self) {
        let mut free = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *free += 1;
        self.cv.notify_one();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

#[cfg(test)]
mod tests {
    use super::Semaphore;
    use std::time::Duration;

    #[test]
    fn permit_is_returned_on_drop() {
        let sem = Semaphore::new(1);
        {
            let permit = sem.acquire();
            assert_eq!(permit.waited, Duration::ZERO);
        }
        let again = sem.acquire();
        assert_eq!(again.waited, Duration::ZERO);
    }

    #[test]
    fn second_acquire_waits_for_release() {
        let sem = Semaphore::new(1);
        std::thread::scope(|s| {
            let held = sem.acquire();
            let waiter = s.spawn(|| sem.acquire().waited);
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            let waited = waiter.join().unwrap();
            assert!(waited > Duration::ZERO);
        });
    }
}
