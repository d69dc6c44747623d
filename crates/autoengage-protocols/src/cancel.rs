//! Cooperative cancellation.
//!
//! The engine polls a [`CancellationSource`] at the top of each candidate
//! iteration. Work already in progress is not interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub trait CancellationSource: Send + Sync {
    fn should_stop(&self) -> bool;
}

/// Source that never requests a stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationSource for NeverCancel {
    fn should_stop(&self) -> bool {
        false
    }
}

impl CancellationSource for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl CancellationSource for CancellationToken {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

impl<T: CancellationSource + ?Sized> CancellationSource for Arc<T> {
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}
