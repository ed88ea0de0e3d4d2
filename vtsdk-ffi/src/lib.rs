//! C ABI for the vtsdk engine.
//!
//! Every entry point returns an owned, NUL-terminated JSON envelope. The
//! caller must hand each returned pointer back exactly once through
//! [`vt_release_string`] (or its legacy alias [`vt_free_string`]). Inputs are
//! borrowed for the duration of the call only.

pub mod handles;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use vtsdk::report::parse_metadata;
use vtsdk::{
    CompareEnvelope, CompareRequest, Engine, EngineConfig, Envelope, LocateEnvelope,
    LocateRequest, Metadata, SearchEnvelope, SearchRequest, VtError, VtResult,
};

/// Reads a required path argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the call.
unsafe fn path_arg<'a>(ptr: *const c_char, name: &str) -> VtResult<&'a str> {
    if ptr.is_null() {
        return Err(VtError::InvalidPath {
            path: String::new(),
            reason: format!("{name} is null"),
        });
    }
    CStr::from_ptr(ptr).to_str().map_err(|err| VtError::InvalidPath {
        path: String::from_utf8_lossy(CStr::from_ptr(ptr).to_bytes()).into_owned(),
        reason: format!("{name} is not valid UTF-8: {err}"),
    })
}

/// Reads an optional JSON argument; null maps to `None`.
///
/// # Safety
/// Same contract as [`path_arg`].
unsafe fn json_arg<'a>(ptr: *const c_char, name: &str) -> VtResult<Option<&'a str>> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|err| VtError::InvalidParameter(format!("{name} is not valid UTF-8: {err}")))
}

/// Metadata to echo when the request itself could not be built.
unsafe fn salvage_metadata(ptr: *const c_char) -> Metadata {
    json_arg(ptr, "metadata_json")
        .and_then(parse_metadata)
        .unwrap_or_default()
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

/// Runs `call`, turning a panic into an `InternalFailure` envelope.
fn guarded<E, F, P>(call: F, on_panic: P) -> *const c_char
where
    E: Envelope,
    F: FnOnce() -> E,
    P: FnOnce(&VtError) -> E,
{
    let envelope = match catch_unwind(AssertUnwindSafe(call)) {
        Ok(envelope) => envelope,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            tracing::error!(%detail, "engine call panicked");
            on_panic(&VtError::InternalFailure(detail))
        }
    };
    handles::issue(envelope.to_json())
}

/// Compares `input` against `baseline` and returns the compare envelope.
///
/// # Safety
/// Every pointer must be null or a valid NUL-terminated string for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn vt_compare_images(
    baseline: *const c_char,
    input: *const c_char,
    min_similarity: i32,
    noise_tolerance: i32,
    excluded_regions_json: *const c_char,
    metadata_json: *const c_char,
) -> *const c_char {
    guarded(
        || {
            let request = (|| {
                CompareRequest::parse(
                    path_arg(baseline, "baseline")?,
                    path_arg(input, "input")?,
                    min_similarity,
                    noise_tolerance,
                    json_arg(excluded_regions_json, "excluded_regions_json")?,
                    json_arg(metadata_json, "metadata_json")?,
                )
            })();
            match request {
                Ok(request) => engine().compare_envelope(&request),
                Err(err) => CompareEnvelope::failure(&err, salvage_metadata(metadata_json)),
            }
        },
        |err| CompareEnvelope::failure(err, Metadata::new()),
    )
}

/// Searches `parent` for `child` and returns the search envelope.
///
/// # Safety
/// Same contract as [`vt_compare_images`].
#[no_mangle]
pub unsafe extern "C" fn vt_flex_search(
    parent: *const c_char,
    child: *const c_char,
    metadata_json: *const c_char,
) -> *const c_char {
    guarded(
        || {
            let request = (|| {
                Ok::<_, VtError>(SearchRequest {
                    parent_path: path_arg(parent, "parent")?.into(),
                    child_path: path_arg(child, "child")?.into(),
                    metadata: parse_metadata(json_arg(metadata_json, "metadata_json")?)?,
                })
            })();
            match request {
                Ok(request) => engine().search_envelope(&request),
                Err(err) => SearchEnvelope::failure(&err, salvage_metadata(metadata_json)),
            }
        },
        |err| SearchEnvelope::failure(err, Metadata::new()),
    )
}

/// Locates `main` and `relative` inside `container` and returns the locate envelope.
///
/// # Safety
/// Same contract as [`vt_compare_images`].
#[no_mangle]
pub unsafe extern "C" fn vt_flex_locate(
    container: *const c_char,
    main: *const c_char,
    relative: *const c_char,
    metadata_json: *const c_char,
) -> *const c_char {
    guarded(
        || {
            let request = (|| {
                Ok::<_, VtError>(LocateRequest {
                    container_path: path_arg(container, "container")?.into(),
                    main_path: path_arg(main, "main")?.into(),
                    relative_path: path_arg(relative, "relative")?.into(),
                    metadata: parse_metadata(json_arg(metadata_json, "metadata_json")?)?,
                })
            })();
            match request {
                Ok(request) => engine().locate_envelope(&request),
                Err(err) => LocateEnvelope::failure(&err, salvage_metadata(metadata_json)),
            }
        },
        |err| LocateEnvelope::failure(err, Metadata::new()),
    )
}

/// Releases a string returned by this library.
///
/// Returns 0 when released, 1 for a null pointer, and -1 when the pointer was
/// never issued or has already been released (nothing is freed).
#[no_mangle]
pub extern "C" fn vt_release_string(handle: *const c_char) -> i32 {
    handles::release(handle).code()
}

/// Legacy alias of [`vt_release_string`] without a status code.
#[no_mangle]
pub extern "C" fn vt_free_string(handle: *const c_char) {
    let _ = handles::release(handle);
}
