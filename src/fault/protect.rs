use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;

/// Source position of a recovered panic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanicLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for PanicLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl From<&panic::Location<'_>> for PanicLocation {
    fn from(value: &panic::Location<'_>) -> Self {
        Self {
            file: value.file().to_string(),
            line: value.line(),
            column: value.column(),
        }
    }
}

/// A panic caught by [`protect`], converted into an error value.
///
/// Displays as the panic message alone; the location and backtrace are
/// available separately.
#[derive(Debug)]
pub struct RecoveredPanic {
    message: String,
    location: Option<PanicLocation>,
    backtrace: Option<Backtrace>,
}

impl RecoveredPanic {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn location(&self) -> Option<&PanicLocation> {
        self.location.as_ref()
    }

    /// Backtrace taken at the panic site, when backtraces are enabled
    /// (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    #[must_use]
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace
            .as_ref()
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
    }
}

impl fmt::Display for RecoveredPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RecoveredPanic {}

struct Captured {
    location: Option<PanicLocation>,
    backtrace: Backtrace,
}

thread_local! {
    /// Number of protected regions active on this thread
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    /// Details recorded by the hook for the most recent protected panic
    static CAPTURED: RefCell<Option<Captured>> = const { RefCell::new(None) };
}

static HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let protected = DEPTH.try_with(Cell::get).unwrap_or(0) > 0;
        if !protected {
            previous(info);
            return;
        }
        let captured = Captured {
            location: info.location().map(PanicLocation::from),
            backtrace: Backtrace::capture(),
        };
        let _ = CAPTURED.try_with(|slot| slot.replace(Some(captured)));
    }));
});

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let _ = DEPTH.try_with(|d| d.set(d.get().saturating_sub(1)));
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn take_captured() -> Option<Captured> {
    CAPTURED.with(|slot| slot.borrow_mut().take())
}

/// Run `f`, converting a panic into a [`RecoveredPanic`].
///
/// The first call installs a process-wide panic hook. Panics raised inside a
/// protected region are recorded silently with their location and backtrace;
/// panics anywhere else still go to the previously installed hook.
///
/// ```rust
/// use brrtmux::fault::protect;
///
/// assert_eq!(protect(|| 1 + 1).unwrap(), 2);
///
/// let err = protect(|| -> u32 { panic!("xyz") }).unwrap_err();
/// assert_eq!(err.message(), "xyz");
/// assert!(err.location().is_some());
/// ```
pub fn protect<T>(f: impl FnOnce() -> T) -> Result<T, RecoveredPanic> {
    Lazy::force(&HOOK);
    let _guard = DepthGuard::enter();
    // A panic caught by inner code must not leak its details into a later
    // `resume_unwind`, which never runs the hook.
    take_captured();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => {
            take_captured();
            Ok(value)
        }
        Err(payload) => {
            let captured = take_captured();
            let (location, backtrace) = match captured {
                Some(c) => (c.location, Some(c.backtrace)),
                None => (None, None),
            };
            Err(RecoveredPanic {
                message: payload_message(payload.as_ref()),
                location,
                backtrace,
            })
        }
    }
}
