//! Global loading indicator shared by all in-flight requests.
//!
//! The indicator is a counter: each request holds a [`LoadingGuard`] and the
//! app is "loading" while any guard is alive. Dropping a guard can never push
//! the count below zero.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Loading {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Default for Loading {
    fn default() -> Self {
        Self::new()
    }
}

impl Loading {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { in_flight: Arc::new(tx) }
    }

    /// Mark one unit of work as started. Loading ends when the guard drops.
    #[must_use = "loading stops as soon as the guard is dropped"]
    pub fn start(&self) -> LoadingGuard {
        self.in_flight.send_modify(|count| *count += 1);
        LoadingGuard { loading: self.clone() }
    }

    fn stop(&self) {
        self.in_flight.send_if_modified(|count| {
            if *count == 0 {
                return false;
            }
            *count -= 1;
            true
        });
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Watch the in-flight count; zero means idle.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }
}

/// Keeps the indicator on while alive.
#[derive(Debug)]
pub struct LoadingGuard {
    loading: Loading,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.loading.stop();
    }
}

#[cfg(test)]
#[path = "loading_test.rs"]
mod tests;
