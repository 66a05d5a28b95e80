//! Tracer configuration from `TRAZAR_*` environment variables.
//!
//! The whole snapshot is materialized once, before `main` runs, and is
//! immutable afterwards: changing the environment mid-run has no effect.
//! Absent or empty variables fall back to their defaults. Malformed values
//! never abort the target; they produce one diagnostic line through the log
//! sink and behave as if unset.

use nix::sys::signal::Signal;

use crate::sink;

const ENV_SIGNAL: &str = "TRAZAR_SIGNAL";
const ENV_INLIBS: &str = "TRAZAR_INLIBS";
const ENV_EXLIBS: &str = "TRAZAR_EXLIBS";
const ENV_INFUNS: &str = "TRAZAR_INFUNS";
const ENV_EXFUNS: &str = "TRAZAR_EXFUNS";
const ENV_MAXDEPTH: &str = "TRAZAR_MAXDEPTH";
const ENV_ASYNC: &str = "TRAZAR_ASYNC";
const ENV_ENTRIES_ONLY: &str = "TRAZAR_LOG_ENTRIES_ONLY";
const ENV_LOG_TIME: &str = "TRAZAR_LOG_TIME";
const ENV_LOG_TID: &str = "TRAZAR_LOG_TID";
const ENV_LOG_FNAME: &str = "TRAZAR_LOG_FNAME";
const ENV_LOG_INDENT: &str = "TRAZAR_LOG_INDENT";

/// Immutable configuration snapshot for one traced process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Start disabled and toggle on each delivery of this signal.
    pub signal_trigger: Option<Signal>,
    /// Colon-separated DSO basename whitelist (raw, unparsed).
    pub include_libs: Option<String>,
    /// Colon-separated DSO basename blacklist; only used if the whitelist
    /// is unset.
    pub exclude_libs: Option<String>,
    /// Extended-glob whitelist for function names.
    pub include_funs: Option<String>,
    /// Extended-glob blacklist for function names.
    pub exclude_funs: Option<String>,
    /// Admitted-depth ceiling; calls beyond it are silently omitted.
    pub max_depth: Option<u32>,
    /// Defer symbol resolution to process exit.
    pub async_mode: bool,
    /// Omit LEAVE lines.
    pub entries_only: bool,
    /// Prefix lines with seconds.microseconds.
    pub log_time: bool,
    /// Prefix lines with the thread id.
    pub log_tid: bool,
    /// Include the DSO basename in each line.
    pub log_fname: bool,
    /// Extra spaces of indent per call level.
    pub indent: usize,
}

impl Config {
    /// Read the snapshot from the process environment.
    pub fn from_env() -> Config {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the snapshot through an arbitrary variable lookup.
    ///
    /// Tests feed a closure over a fixture map here instead of mutating the
    /// real environment.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let nonempty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        Config {
            signal_trigger: nonempty(ENV_SIGNAL).and_then(|v| parse_signal(&v)),
            include_libs: nonempty(ENV_INLIBS),
            exclude_libs: nonempty(ENV_EXLIBS),
            include_funs: nonempty(ENV_INFUNS),
            exclude_funs: nonempty(ENV_EXFUNS),
            max_depth: nonempty(ENV_MAXDEPTH)
                .and_then(|v| parse_leading_int(&v))
                .filter(|&depth| depth > 0)
                .map(|depth| depth as u32),
            async_mode: lookup(ENV_ASYNC).as_deref() == Some("1"),
            entries_only: lookup(ENV_ENTRIES_ONLY).as_deref() == Some("1"),
            log_time: lookup(ENV_LOG_TIME).as_deref() == Some("1"),
            log_tid: lookup(ENV_LOG_TID).as_deref() == Some("1"),
            log_fname: lookup(ENV_LOG_FNAME)
                .map(|v| v.as_bytes().first() == Some(&b'1'))
                .unwrap_or(true),
            indent: lookup(ENV_LOG_INDENT)
                .and_then(|v| parse_leading_int(&v))
                .map(|v| v.max(0) as usize)
                .unwrap_or(0),
        }
    }
}

/// `y`/`Y` selects SIGPROF; anything else must parse to a valid positive
/// signal number.
fn parse_signal(value: &str) -> Option<Signal> {
    if value.starts_with('y') || value.starts_with('Y') {
        return Some(Signal::SIGPROF);
    }
    let parsed = parse_leading_int(value)
        .filter(|&n| n > 0 && n <= i32::MAX as i64)
        .and_then(|n| Signal::try_from(n as i32).ok());
    if parsed.is_none() {
        sink::logit(format_args!("cannot understand {ENV_SIGNAL}={value}"));
    }
    parsed
}

/// atoi-style parse: optional sign, then as many digits as there are.
/// Trailing junk is ignored; no digits at all is a failure.
fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
