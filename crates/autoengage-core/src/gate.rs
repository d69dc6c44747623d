//! Single-run admission.
//!
//! One session drives one page, so at most one interaction run may be active
//! at a time. Callers acquire a [`RunPermit`] before starting and hold it for
//! the whole run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RunGate {
    busy: Arc<AtomicBool>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate, or `None` if a run is already active.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        debug!("Run gate acquired");
        Some(RunPermit {
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct RunPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        debug!("Run gate released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected() {
        let gate = RunGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_busy());
        assert!(gate.clone().try_acquire().is_none());
    }

    #[test]
    fn test_released_on_drop() {
        let gate = RunGate::new();
        {
            let _permit = gate.try_acquire().unwrap();
        }
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_released_when_task_ends() {
        let gate = RunGate::new();
        let permit = gate.try_acquire().unwrap();
        tokio::spawn(async move {
            let _permit = permit;
        })
        .await
        .unwrap();
        assert!(!gate.is_busy());
    }
}
