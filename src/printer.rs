//! Formatting and emission of single trace events.
//!
//! [`print_trace`] decides whether one ENTER/LEAVE event is emitted and in
//! which form, and reports back whether the frame counts toward the call
//! depth. The decision order matters: depth-limit truncation keeps depth
//! accounting alive without output, async mode short-circuits symbol
//! resolution, and only the synchronous path can suppress a frame through
//! the function filter.

use std::fmt::Write as _;

use crate::config::Config;
use crate::resolve::{resolve, Resolution};
use crate::sink;
use crate::state::TraceState;

/// Which side of the call boundary an event is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Enter,
    Leave,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Enter => "ENTER",
            Direction::Leave => "LEAVE",
        }
    }
}

/// Whether the frame counts toward the call depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Reported, or deliberately unprinted (depth limit, entries-only).
    Admitted,
    /// Dropped by a filter or an unusable backtrace; not counted.
    Suppressed,
}

/// What goes after the `DIR[depth]` column.
#[derive(Debug, Clone, Copy)]
pub enum EventBody<'a> {
    /// A resolved function name.
    Function { dso: &'a str, name: &'a str },
    /// Only the DSO could be determined.
    Address { dso: &'a str, addr: usize },
    /// Async mode: the raw address, resolved later.
    Raw { addr: usize },
}

/// Process one event for `state` and report the depth verdict.
///
/// Never inlined: the backtrace in [`instrumented_frame`] counts on this
/// being the frame directly below the instrumentation hook.
#[inline(never)]
pub(crate) fn print_trace(state: &mut TraceState, pc: usize, direction: Direction) -> Verdict {
    // Truncate the subtree beyond the ceiling but keep counting as if it
    // were reported.
    if let Some(limit) = state.config.max_depth {
        if state.depth >= limit {
            return Verdict::Admitted;
        }
    }

    // The address handed to the instrumentation hook has been unreliable on
    // some platforms, so everywhere but ARM the frame is re-read from a
    // short backtrace instead.
    let pc = if cfg!(target_arch = "arm") {
        pc
    } else {
        match instrumented_frame() {
            Some(frame) => frame,
            None => return Verdict::Suppressed,
        }
    };

    state.ensure_backlog();

    let is_entry = direction == Direction::Enter;
    if state.config.entries_only && !is_entry {
        return Verdict::Admitted;
    }
    // With entries-only there is nothing to tell apart, so the direction
    // column disappears entirely.
    let label = if state.config.entries_only {
        ""
    } else {
        direction.label()
    };

    if state.backlog.is_some() {
        let line = format_event(&state.config, state.depth, label, EventBody::Raw { addr: pc });
        sink::logit(format_args!("{line}"));
        if is_entry {
            if let Some(backlog) = state.backlog.as_mut() {
                backlog.record(pc);
            }
        }
        return Verdict::Admitted;
    }

    match resolve(
        &mut state.dso_cache,
        &state.libraries,
        &state.functions,
        pc,
    ) {
        Resolution::Suppressed => Verdict::Suppressed,
        Resolution::Reported { dso, name } => {
            let body = match name.as_deref() {
                Some(name) => EventBody::Function { dso: &dso, name },
                None => EventBody::Address {
                    dso: &dso,
                    addr: pc,
                },
            };
            let line = format_event(&state.config, state.depth, label, body);
            sink::logit(format_args!("{line}"));
            Verdict::Admitted
        }
    }
}

/// Format one complete event line, without emitting it.
pub fn format_event(config: &Config, depth: u32, direction: &str, body: EventBody<'_>) -> String {
    let width = 1 + config.indent * depth as usize;
    let mut line = prefix(config);
    let _ = write!(line, "{direction}[{depth}]{:width$}", "");
    let _ = match body {
        EventBody::Function { dso, name } if config.log_fname => write!(line, "{dso}:{name}()"),
        EventBody::Function { name, .. } => write!(line, "{name}()"),
        EventBody::Address { dso, addr } if config.log_fname => {
            write!(line, "{dso}:[0x{addr:x}]")
        }
        EventBody::Address { addr, .. } => write!(line, "[0x{addr:x}]"),
        EventBody::Raw { addr } => write!(line, "[0x{addr:x}]"),
    };
    line
}

/// `SEC.USEC `, `TID `, `SEC.USEC[TID] `, or nothing.
fn prefix(config: &Config) -> String {
    match (config.log_time, config.log_tid) {
        (false, false) => String::new(),
        (true, false) => {
            let (sec, usec) = timeofday();
            format!("{sec}.{usec:06} ")
        }
        (false, true) => format!("{} ", nix::unistd::gettid()),
        (true, true) => {
            let (sec, usec) = timeofday();
            format!("{sec}.{usec:06}[{}] ", nix::unistd::gettid())
        }
    }
}

fn timeofday() -> (i64, i64) {
    let mut tv = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    unsafe { libc::gettimeofday(&mut tv, std::ptr::null_mut()) };
    (tv.tv_sec as i64, tv.tv_usec as i64)
}

/// Instruction pointer of the instrumented function.
///
/// Frame layout at the collection point: [0] `print_trace`, [1] the
/// instrumentation hook, [2] the function the program entered or left.
/// Fewer than three frames means the event cannot be attributed.
#[inline(always)]
fn instrumented_frame() -> Option<usize> {
    let mut frames = [0usize; 3];
    let mut count = 0;
    backtrace::trace(|frame| {
        frames[count] = frame.ip() as usize;
        count += 1;
        count < frames.len()
    });
    (count == frames.len()).then(|| frames[2])
}
