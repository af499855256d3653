//! Progress reporting, grounded on the `Arc`-shared-state pattern the
//! teacher's `rate_limiter`/`retry` modules use for concurrent state —
//! here applied to a callback instead of a counter.

use std::sync::Arc;

/// Which stage of the pipeline a [`ProgressEvent`] was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Screening,
    Extraction,
    Market,
    Match,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Screening => "screening",
            Stage::Extraction => "extraction",
            Stage::Market => "market",
            Stage::Match => "match",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
    pub note: Option<String>,
}

/// A callback invoked as the pipeline advances. Implemented for any
/// `Fn(ProgressEvent) + Send + Sync` closure so callers can pass a plain
/// closure instead of implementing a trait by hand.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}

/// A no-op listener, used as the default when the caller doesn't care
/// about progress events.
pub struct NullProgressListener;

impl ProgressListener for NullProgressListener {
    fn on_progress(&self, _event: ProgressEvent) {}
}

pub type SharedProgressListener = Arc<dyn ProgressListener>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closure_listener_is_invoked() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let listener: SharedProgressListener = Arc::new(move |_event: ProgressEvent| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        listener.on_progress(ProgressEvent {
            stage: Stage::Extraction,
            done: 1,
            total: 10,
            note: None,
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn null_listener_does_nothing() {
        let listener = NullProgressListener;
        listener.on_progress(ProgressEvent {
            stage: Stage::Market,
            done: 0,
            total: 0,
            note: None,
        });
    }
}
