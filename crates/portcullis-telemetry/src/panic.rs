//! Panic reports captured where the panic happens.
//!
//! A backtrace taken after `catch_unwind` returns only shows the frames of
//! whoever caught the panic. The hook installed here captures the backtrace
//! while the panicking frame is still on the stack and parks it in a
//! thread-local slot, which the catching code drains with [`take_report`].
//!
//! Only panics raised inside a [`Guard`] are captured this way, and those are
//! not printed by the default hook: the catcher logs them once through
//! `tracing`. Panics anywhere else go to the previously installed hook.
//!
//! ```
//! use portcullis_telemetry::panic::{self, Guard};
//!
//! panic::install_hook();
//! let caught = std::panic::catch_unwind(|| {
//!     let _guard = Guard::enter();
//!     panic!("template missing");
//! });
//! assert!(caught.is_err());
//!
//! let report = panic::take_report().unwrap();
//! assert!(report.location.unwrap().contains(".rs"));
//! assert!(panic::take_report().is_none());
//! ```

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::sync::Once;

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_REPORT: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

/// What the hook saw at the panic site.
#[derive(Debug, Clone)]
pub struct PanicReport {
    /// `file:line:column` of the `panic!`, when known.
    pub location: Option<String>,
    /// Backtrace rendered at the panic site.
    pub backtrace: String,
}

/// Marks the current thread as running code whose panics will be caught.
///
/// Guards nest. Dropping the guard, including during unwinding, leaves the
/// marked region.
#[derive(Debug)]
#[must_use = "the region ends when the guard is dropped"]
pub struct Guard(());

impl Guard {
    /// Enters a guarded region on this thread.
    pub fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self(())
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn guarded() -> bool {
    GUARD_DEPTH.with(Cell::get) > 0
}

/// Installs the capturing hook in front of the current one. Idempotent.
pub fn install_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !guarded() {
                previous(info);
                return;
            }
            let report = PanicReport {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_REPORT.with(|slot| *slot.borrow_mut() = Some(report));
        }));
    });
}

/// Takes the report of the last guarded panic on this thread.
pub fn take_report() -> Option<PanicReport> {
    LAST_REPORT.with(|slot| slot.borrow_mut().take())
}
