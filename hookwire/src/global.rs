//! Process-wide default manager.
//!
//! Collaborators that cannot have a manager plumbed through to them read it
//! from here. The composition root calls [`init`] once at startup.

use crate::manager::Manager;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static MANAGER: OnceCell<Arc<Manager>> = OnceCell::new();

/// Install the process-wide manager and return it.
///
/// The first call wins. Later calls log a warning, drop their argument and
/// return the manager installed first.
pub fn init(manager: Manager) -> Arc<Manager> {
    match MANAGER.try_insert(Arc::new(manager)) {
        Ok(installed) => Arc::clone(installed),
        Err((existing, _rejected)) => {
            tracing::warn!("global manager already initialized, keeping the first one");
            Arc::clone(existing)
        }
    }
}

/// The process-wide manager, if [`init`] has run.
pub fn manager() -> Option<Arc<Manager>> {
    MANAGER.get().cloned()
}
