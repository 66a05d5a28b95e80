//! Trace output sink.
//!
//! Every emitted line - trace events, the async `SYMTAB:` table, and
//! configuration diagnostics - goes through [`logit`]. The default sink is
//! standard error with newline terminators; building with the `tracing`
//! feature routes the same payload through `tracing::debug!` under the
//! `trace` target instead.

use std::fmt;

/// Write one complete line to the configured sink.
#[cfg(not(feature = "tracing"))]
pub fn logit(args: fmt::Arguments<'_>) {
    eprintln!("{args}");
}

/// Write one complete line to the configured sink.
#[cfg(feature = "tracing")]
pub fn logit(args: fmt::Arguments<'_>) {
    tracing::debug!(target: "trace", "{args}");
}
