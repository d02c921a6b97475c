use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{MrpError, Result};

/// Cooperative cancellation flag shared between a caller and a planning run.
///
/// The planner checks the token between pipeline passes and between demands;
/// a cancelled run returns `MrpError::Cancelled` without partial output.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the run to stop at the next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Error out if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MrpError::Cancelled)
        } else {
            Ok(())
        }
    }
}
