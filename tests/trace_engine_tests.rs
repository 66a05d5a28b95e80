//! Engine-level tests driving [`trazar::state::TraceState`] the way the
//! instrumentation hooks do.
//!
//! Async mode is used wherever symbol resolution would otherwise depend on
//! the test binary's own symbol layout: the async path prints raw addresses
//! and never consults the resolver, which makes depth accounting fully
//! deterministic.

use std::collections::HashMap;

use trazar::config::Config;
use trazar::state::TraceState;

fn state_with(vars: &[(&str, &str)]) -> TraceState {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    TraceState::new(Config::from_lookup(move |name| map.get(name).cloned()))
}

// Any real code address works as a hook argument; the printer re-reads the
// frame from a backtrace anyway.
fn probe_address() -> usize {
    probe_address as usize
}

#[test]
fn test_depth_follows_enters_and_leaves() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1")]);

    // main -> foo -> bar
    state.on_enter(probe_address());
    assert_eq!(state.depth(), 1);
    state.on_enter(probe_address());
    assert_eq!(state.depth(), 2);
    state.on_enter(probe_address());
    assert_eq!(state.depth(), 3);

    state.on_exit(probe_address());
    assert_eq!(state.depth(), 2);
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 1);
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
}

#[test]
fn test_depth_limit_truncates_but_keeps_counting() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1"), ("TRAZAR_MAXDEPTH", "2")]);

    // The third frame is beyond the ceiling: unprinted, still counted.
    state.on_enter(probe_address());
    state.on_enter(probe_address());
    state.on_enter(probe_address());
    assert_eq!(state.depth(), 3);

    state.on_exit(probe_address());
    assert_eq!(state.depth(), 2);
    state.on_exit(probe_address());
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
}

#[test]
fn test_entries_only_still_balances_depth() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1"), ("TRAZAR_LOG_ENTRIES_ONLY", "1")]);

    state.on_enter(probe_address());
    assert_eq!(state.depth(), 1);
    // The LEAVE is unprinted but still admitted for depth purposes.
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
}

#[test]
fn test_library_whitelist_suppresses_frames_entirely() {
    // Nothing in this process is named no-such-library.so, so every frame
    // is filtered out and the depth counter never moves.
    let mut state = state_with(&[("TRAZAR_INLIBS", "no-such-library.so")]);

    state.on_enter(probe_address());
    assert_eq!(state.depth(), 0);
    state.on_enter(probe_address());
    assert_eq!(state.depth(), 0);
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
}

#[test]
fn test_unknown_blacklist_admits_frames() {
    let mut state = state_with(&[("TRAZAR_EXLIBS", "no-such-library.so")]);

    state.on_enter(probe_address());
    assert_eq!(state.depth(), 1);
    state.on_exit(probe_address());
    assert_eq!(state.depth(), 0);
}

#[test]
fn test_enter_count_dominates_leave_count() {
    // At every point of a balanced call sequence the number of admitted
    // enters is at least the number of admitted leaves.
    let mut state = state_with(&[("TRAZAR_ASYNC", "1")]);
    let sequence = [true, true, false, true, true, false, false, false];
    let mut max_seen = 0u32;

    for &enter in &sequence {
        if enter {
            state.on_enter(probe_address());
        } else {
            state.on_exit(probe_address());
        }
        max_seen = max_seen.max(state.depth());
    }
    assert_eq!(state.depth(), 0);
    assert_eq!(max_seen, 3);
}

#[test]
fn test_async_backlog_records_enter_addresses_only() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1")]);

    state.on_enter(probe_address());
    state.on_enter(probe_address());
    state.on_exit(probe_address());

    let backlog = state.backlog.as_mut().expect("async mode creates a backlog");
    // One record per ENTER; LEAVEs are printed but not recorded.
    assert_eq!(backlog.addresses().len(), 2);
}

#[test]
fn test_async_backlog_respects_depth_limit() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1"), ("TRAZAR_MAXDEPTH", "1")]);

    state.on_enter(probe_address());
    state.on_enter(probe_address());
    state.on_enter(probe_address());

    let backlog = state.backlog.as_mut().expect("async mode creates a backlog");
    // Only the first frame was below the ceiling and got printed/recorded.
    assert_eq!(backlog.addresses().len(), 1);
    assert_eq!(state.depth(), 3);
}

#[test]
fn test_resolved_backlog_is_gone() {
    let mut state = state_with(&[("TRAZAR_ASYNC", "1")]);
    state.on_enter(probe_address());
    state.resolve_backlog();
    assert!(state.backlog.is_none());
}

#[test]
fn test_signal_trigger_config_disables_initial_tracing_state() {
    // The constructor consults this flag; here we just pin the config
    // semantics: a trigger means "start silent, toggle on delivery".
    let map: HashMap<String, String> =
        [("TRAZAR_SIGNAL".to_string(), "y".to_string())].into();
    let config = Config::from_lookup(|name| map.get(name).cloned());
    assert!(config.signal_trigger.is_some());

    let unset = Config::from_lookup(|_| None);
    assert!(unset.signal_trigger.is_none());
}
