//! Ledger of result strings handed to C callers.
//!
//! Every returned pointer is recorded until it is released. Releasing a
//! pointer that is not in the ledger (never issued, or already released) is
//! rejected instead of freeing memory twice.

use std::collections::HashSet;
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::{Mutex, OnceLock, PoisonError};

fn ledger() -> &'static Mutex<HashSet<usize>> {
    static LIVE: OnceLock<Mutex<HashSet<usize>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Outcome of a release request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    Released,
    Null,
    Rejected,
}

impl Release {
    /// Status code returned through the C ABI.
    pub fn code(self) -> i32 {
        match self {
            Release::Released => 0,
            Release::Null => 1,
            Release::Rejected => -1,
        }
    }
}

/// Transfers `json` to the caller as an owned C string.
pub(crate) fn issue(json: String) -> *const c_char {
    // serde_json escapes NUL, so the fallback only guards hand-built strings.
    let owned = CString::new(json).unwrap_or_default();
    let ptr = owned.into_raw();
    ledger()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(ptr as usize);
    ptr
}

/// Frees a string previously returned by [`issue`], at most once.
pub(crate) fn release(ptr: *const c_char) -> Release {
    if ptr.is_null() {
        return Release::Null;
    }
    let removed = ledger()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&(ptr as usize));
    if !removed {
        tracing::warn!(handle = ptr as usize, "rejected release of unknown or released handle");
        return Release::Rejected;
    }
    // SAFETY: the pointer came from `CString::into_raw` in `issue` and was
    // still in the ledger, so it has not been freed yet.
    unsafe { drop(CString::from_raw(ptr as *mut c_char)) };
    Release::Released
}
