//! The instrumentation entry points.
//!
//! Code compiled with `-finstrument-functions` calls these two symbols at
//! every function entry and exit, passing the instrumented function's own
//! address and the call site. They are the only exported surface of the
//! library; everything else hangs off the process-wide [`crate::state`].

use std::ffi::c_void;

use crate::state::{state, tracing_enabled};

#[no_mangle]
pub unsafe extern "C" fn __cyg_profile_func_enter(func: *mut c_void, _call_site: *mut c_void) {
    if !tracing_enabled() {
        return;
    }
    state().on_enter(func as usize);
}

#[no_mangle]
pub unsafe extern "C" fn __cyg_profile_func_exit(func: *mut c_void, _call_site: *mut c_void) {
    if !tracing_enabled() {
        return;
    }
    state().on_exit(func as usize);
}
