//! Trazar - function-call tracer for instrumented native programs
//!
//! Trazar is preloaded into a target that was compiled with
//! `-finstrument-functions`. The compiler-inserted hooks
//! (`__cyg_profile_func_enter` / `__cyg_profile_func_exit`) call into this
//! library at every function entry and exit, and trazar prints one line per
//! event on stderr (or through the `tracing` facade when the `tracing`
//! feature is enabled). Debugging information is not required; the relevant
//! binaries just must not be stripped.
//!
//! Behavior is controlled entirely through environment variables, read once
//! at process start:
//!
//! - `TRAZAR_SIGNAL`: if `y` or a signal number, start with tracing off and
//!   toggle it on each delivery of SIGPROF (or the given signal).
//! - `TRAZAR_INLIBS` / `TRAZAR_EXLIBS`: colon-separated DSO basenames to
//!   include resp. exclude. `TRAZAR_INLIBS` wins when both are set.
//!   Example: `libalpha.so:libbeta.so`.
//! - `TRAZAR_INFUNS` / `TRAZAR_EXFUNS`: an extended glob pattern selecting
//!   function names. Beyond `*` and `?`, the pattern language supports
//!   alternation (`:`) and grouping (`()`), e.g. `foo_*:bar_(alpha:beta)`.
//! - `TRAZAR_MAXDEPTH`: do not report calls beyond this depth. Excluded
//!   functions do not increase the depth.
//! - `TRAZAR_ASYNC`: defer symbol resolution; log raw addresses while the
//!   program runs and emit a `SYMTAB:` translation table at exit.
//! - `TRAZAR_LOG_ENTRIES_ONLY`: omit LEAVE lines.
//! - `TRAZAR_LOG_TIME`: prefix each line with seconds.microseconds.
//! - `TRAZAR_LOG_TID`: prefix each line with the thread id. Useful for
//!   multithreaded targets, although trazar itself is NOT thread-safe.
//! - `TRAZAR_LOG_FNAME`: include the DSO basename in each line (default on).
//! - `TRAZAR_LOG_INDENT`: spaces of extra indent per call level (default 0).
//!
//! The library must itself be built without instrumentation, and relies on
//! the launcher to arrange `LD_PRELOAD`.

pub mod backlog;
pub mod config;
pub mod eglob;
pub mod elf;
pub mod filter;
pub mod hooks;
pub mod printer;
pub mod resolve;
pub mod sink;
pub mod state;
pub mod wordlist;
