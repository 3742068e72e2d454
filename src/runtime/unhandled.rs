//! Unhandled-rejection side channel.
//!
//! A rejected future whose last handle is dropped without any reaction ever
//! having been registered is reported here exactly once. The hook is
//! process-wide; install it with [`set_unhandled_rejection_hook`] and keep
//! the returned [`HookGuard`] alive for as long as it should stay installed.

use crate::error::Error;
use crate::tracing_compat::warn;
use crate::types::FutureId;
use parking_lot::RwLock;
use std::sync::Arc;

/// A rejection that nobody observed.
#[derive(Debug, Clone)]
pub struct UnhandledRejection {
    /// The future that was dropped while rejected.
    pub future: FutureId,
    /// Its rejection reason.
    pub reason: Error,
}

type Hook = Arc<dyn Fn(&UnhandledRejection) + Send + Sync>;

static HOOK: RwLock<Option<Hook>> = parking_lot::const_rwlock(None);

/// Restores the previously installed hook when dropped.
#[must_use = "the hook is removed as soon as the guard is dropped"]
pub struct HookGuard {
    previous: Option<Hook>,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        *HOOK.write() = self.previous.take();
    }
}

impl std::fmt::Debug for HookGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookGuard")
            .field("restores_previous", &self.previous.is_some())
            .finish()
    }
}

/// Installs `hook` as the process-wide unhandled-rejection callback.
pub fn set_unhandled_rejection_hook<F>(hook: F) -> HookGuard
where
    F: Fn(&UnhandledRejection) + Send + Sync + 'static,
{
    let previous = HOOK.write().replace(Arc::new(hook));
    HookGuard { previous }
}

/// Removes any installed hook; unhandled rejections fall back to logging.
pub fn clear_unhandled_rejection_hook() {
    let previous = HOOK.write().take();
    drop(previous);
}

/// Returns true if a hook is installed.
#[must_use]
pub fn has_unhandled_rejection_hook() -> bool {
    HOOK.read().is_some()
}

pub(crate) fn report(rejection: &UnhandledRejection) {
    // Clone out of the lock so the hook may reinstall itself.
    let hook = HOOK.read().clone();
    match hook {
        Some(hook) => hook(rejection),
        None => {
            warn!(
                future = %rejection.future,
                reason = %rejection.reason,
                "unhandled rejection"
            );
        }
    }
}
