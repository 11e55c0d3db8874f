//! FFI bindings for facegate
//!
//! This module provides C-compatible functions for embedding the engine in
//! mobile SDKs and other languages. All functions use C strings
//! (null-terminated) and return allocated memory that must be freed by the
//! caller using `facegate_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::LivenessConfig;
use crate::pipeline::LivenessEngine;
use crate::schema::FrameEvent;
use crate::FACEGATE_VERSION;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Opaque handle to a LivenessEngine
pub struct FacegateEngineHandle {
    engine: LivenessEngine,
}

/// Create a new engine.
///
/// # Safety
/// - `config_json` may be NULL for default thresholds, otherwise it must be
///   a valid null-terminated C string holding a config JSON object.
/// - Returns a pointer that must be freed with `facegate_engine_free`.
/// - Returns NULL on error; call `facegate_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_new(
    config_json: *const c_char,
) -> *mut FacegateEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        LivenessConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match LivenessConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(FacegateEngineHandle {
        engine: LivenessEngine::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_free(engine: *mut FacegateEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Process one frame event and return the sequencer notifications as a JSON
/// array.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - `frame_json` must be a valid null-terminated C string holding a
///   `face.landmark_frame.v1` JSON object.
/// - Returns a newly allocated string that must be freed with
///   `facegate_free_string`.
/// - Returns NULL on error; call `facegate_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_process_frame(
    engine: *mut FacegateEngineHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let json = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let frame: FrameEvent = match serde_json::from_str(&json) {
        Ok(frame) => frame,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle.engine.process_frame(&frame) {
        Ok(notifications) => match serde_json::to_string(&notifications) {
            Ok(out) => string_to_cstr(&out),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the current expected step as a string.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - Returns a newly allocated string that must be freed with
///   `facegate_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_current_step(
    engine: *mut FacegateEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;
    string_to_cstr(handle.engine.current_step().as_str())
}

/// Get the UI prompt for the current expected step.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - Returns a newly allocated string that must be freed with
///   `facegate_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_prompt(
    engine: *mut FacegateEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;
    string_to_cstr(handle.engine.prompt())
}

/// Whether the challenge has completed.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - Returns 1 if complete, 0 if not, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_is_complete(
    engine: *mut FacegateEngineHandle,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &*engine;
    i32::from(handle.engine.is_complete())
}

/// Reset the engine for a fresh attempt.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_reset(engine: *mut FacegateEngineHandle) {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return;
    }
    let handle = &mut *engine;
    handle.engine.reset();
}

/// Save engine session state to JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - Returns a newly allocated string that must be freed with
///   `facegate_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_save_session(
    engine: *mut FacegateEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    match handle.engine.save_session() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load engine session state from JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `facegate_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn facegate_engine_load_session(
    engine: *mut FacegateEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.engine.load_session(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by facegate functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a facegate function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn facegate_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next facegate call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn facegate_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the facegate version string.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with
///   `facegate_free_string`.
#[no_mangle]
pub unsafe extern "C" fn facegate_version() -> *mut c_char {
    string_to_cstr(FACEGATE_VERSION)
}
