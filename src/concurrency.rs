//! In-flight guards
//!
//! A response cycle and an indexing run are each single-flight: a trigger that
//! arrives while one is active is dropped, never queued. The flag is cleared
//! by the guard's `Drop`, so it is released on success, error and panic alike.

use std::sync::atomic::{AtomicBool, Ordering};

/// A boolean busy flag with RAII release.
#[derive(Debug, Default)]
pub struct InFlightFlag {
    busy: AtomicBool,
}

impl InFlightFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag if it is clear. Returns `None` when already busy.
    pub fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears its flag when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a InFlightFlag,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let flag = InFlightFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn guard_releases_on_panic() {
        let flag = Arc::new(InFlightFlag::new());
        let inner = flag.clone();
        let result = thread::spawn(move || {
            let _guard = inner.try_acquire().unwrap();
            panic!("cycle blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!flag.is_busy());
    }

    #[test]
    fn only_one_concurrent_holder() {
        let flag = Arc::new(InFlightFlag::new());
        let entered = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = flag.clone();
                let entered = entered.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let guard = flag.try_acquire();
                    if guard.is_some() {
                        entered.fetch_add(1, Ordering::SeqCst);
                    }
                    // Hold any acquired guard until every thread has tried.
                    barrier.wait();
                    drop(guard);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(entered.load(Ordering::SeqCst), 1);
    }
}
