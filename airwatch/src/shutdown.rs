//! Shutdown signalling between the Ctrl-C handler and the assessment loop.

use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// A shared flag that, once raised, stays raised and wakes every sleeper.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: Mutex<bool>,
    cv: Condvar,
}

impl Inner {
    // A panic while holding the lock can't leave a bool half-written.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask everything holding this handle to stop.
    pub fn request(&self) {
        let mut g = self.inner.lock();
        *g = true;
        self.inner.cv.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        *self.inner.lock()
    }

    /// Sleep for `duration`, or until shutdown is requested.
    /// Returns true if shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        let g = self.inner.lock();
        let (g, _) = self
            .inner
            .cv
            .wait_timeout_while(g, duration, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        *g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Instant};

    #[test]
    fn sleep_times_out() {
        let s = Shutdown::new();
        assert!(!s.sleep(Duration::from_millis(10)));
        assert!(!s.is_requested());
    }

    #[test]
    fn request_wakes_sleeper() {
        let s = Shutdown::new();
        let waker = {
            let s = s.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                s.request();
            })
        };
        let start = Instant::now();
        assert!(s.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(30));
        waker.join().unwrap();
    }

    #[test]
    fn stays_requested() {
        let s = Shutdown::new();
        s.request();
        assert!(s.is_requested());
        assert!(s.sleep(Duration::from_secs(30)));
    }
}
