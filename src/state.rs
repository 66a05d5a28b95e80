//! Process-wide tracing state and initialization.
//!
//! All mutable engine state lives in one [`TraceState`]: the configuration
//! snapshot, both filters, the call-depth counter, the DSO cache, and the
//! async backlog. A single static instance backs the exported hooks; the
//! tracer is NOT thread-safe, and the [`state`] accessor is the documented
//! unsafe boundary - callers rely on the instrumented target driving the
//! hooks from one thread at a time.
//!
//! The constructor runs before `main`: it materializes the configuration
//! and, when a signal trigger is configured, installs the toggle handler
//! and starts with tracing disabled. The handler itself performs a single
//! atomic flip and nothing else.

use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{signal, SigHandler};

use crate::backlog::Backlog;
use crate::config::Config;
use crate::filter::{FunctionFilter, LibraryFilter};
use crate::printer::{print_trace, Direction, Verdict};
use crate::resolve::DsoCache;
use crate::sink;

/// Is tracing enabled, or are we waiting for the trigger signal?
static TRACING: AtomicBool = AtomicBool::new(true);

static mut STATE: Option<TraceState> = None;

/// Engine state for one traced process.
#[derive(Debug)]
pub struct TraceState {
    pub config: Config,
    pub(crate) libraries: LibraryFilter,
    pub(crate) functions: FunctionFilter,
    pub(crate) depth: u32,
    pub(crate) dso_cache: DsoCache,
    /// Scratch file of ENTER addresses, created on first use in async mode.
    pub backlog: Option<Backlog>,
    backlog_started: bool,
}

impl TraceState {
    pub fn new(config: Config) -> TraceState {
        let libraries = LibraryFilter::from_config(&config);
        let functions = FunctionFilter::from_config(&config);
        TraceState {
            config,
            libraries,
            functions,
            depth: 0,
            dso_cache: DsoCache::new(),
            backlog: None,
            backlog_started: false,
        }
    }

    pub fn from_env() -> TraceState {
        TraceState::new(Config::from_env())
    }

    /// Number of currently-active admitted frames.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Handle one function entry.
    ///
    /// Always inlined into the hook so the printer's backtrace sees the
    /// hook as its direct caller.
    #[inline(always)]
    pub fn on_enter(&mut self, pc: usize) {
        if print_trace(self, pc, Direction::Enter) == Verdict::Admitted {
            self.depth = self.depth.wrapping_add(1);
        }
    }

    /// Handle one function exit.
    #[inline(always)]
    pub fn on_exit(&mut self, pc: usize) {
        // The LEAVE line carries the callee's own depth, so drop a level
        // first; a filter-suppressed frame gets the decrement undone.
        self.depth = self.depth.wrapping_sub(1);
        if print_trace(self, pc, Direction::Leave) == Verdict::Suppressed {
            self.depth = self.depth.wrapping_add(1);
        }
    }

    /// One-time async setup, on the first printed event.
    pub(crate) fn ensure_backlog(&mut self) {
        if self.backlog_started {
            return;
        }
        self.backlog_started = true;
        if !self.config.async_mode {
            return;
        }
        match Backlog::create() {
            Ok(backlog) => {
                self.backlog = Some(backlog);
                unsafe { libc::atexit(resolve_backlog_at_exit) };
            }
            Err(err) => {
                sink::logit(format_args!("cannot create async backlog: {err}"));
            }
        }
    }

    /// Resolve and emit the async backlog, if one was ever created.
    pub fn resolve_backlog(&mut self) {
        if let Some(backlog) = self.backlog.take() {
            backlog.resolve_all(&mut self.dso_cache, &self.libraries, &self.functions);
        }
    }
}

/// Whether events are currently traced at all.
pub fn tracing_enabled() -> bool {
    TRACING.load(Ordering::Relaxed)
}

/// The process-wide engine state.
///
/// # Safety
///
/// There is no synchronization. The caller must be the only party touching
/// the state, which holds for the instrumentation hooks under the tracer's
/// documented single-threaded contract.
pub(crate) unsafe fn state() -> &'static mut TraceState {
    let slot = &mut *ptr::addr_of_mut!(STATE);
    slot.get_or_insert_with(TraceState::from_env)
}

/// Flip the tracing flag. Installed as the trigger-signal handler; a lone
/// atomic store keeps it async-signal-safe.
extern "C" fn toggle_tracing(_signum: libc::c_int) {
    TRACING.fetch_xor(true, Ordering::Relaxed);
}

extern "C" fn resolve_backlog_at_exit() {
    unsafe { state().resolve_backlog() }
}

/// Start tracing, or install the signal handler that will start it later.
#[ctor::ctor]
fn init() {
    let state = unsafe { state() };
    if let Some(trigger) = state.config.signal_trigger {
        TRACING.store(false, Ordering::Relaxed);
        unsafe {
            let _ = signal(trigger, SigHandler::Handler(toggle_tracing));
        }
    }
}
