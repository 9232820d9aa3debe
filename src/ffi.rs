//! FFI bindings for PawSense
//!
//! This module provides C-compatible functions for calling the collar core from
//! the mobile shell. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `pawsense_free_string`.
//!
//! Timestamps cross the boundary as RFC 3339 strings. A NULL `now` means the
//! device's local clock. Style codes: 0 = compact, 1 = verbose.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, FixedOffset, Local};

use crate::controller::{CollarController, Tab};
use crate::countdown::format_countdown;
use crate::pipeline::{resolve_predictions, PredictionPipeline};
use crate::types::{CountdownStyle, PredictionBoard, PredictionRequest};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse an optional RFC 3339 `now`; NULL means the local clock
unsafe fn parse_now(now: *const c_char) -> Result<DateTime<FixedOffset>, String> {
    if now.is_null() {
        return Ok(Local::now().fixed_offset());
    }
    let text = cstr_to_string(now).ok_or_else(|| "Invalid now string pointer".to_string())?;
    DateTime::parse_from_rfc3339(&text).map_err(|e| format!("Invalid now timestamp: {}", e))
}

fn parse_style(code: i32) -> Result<CountdownStyle, String> {
    CountdownStyle::from_code(code).ok_or_else(|| format!("Unknown style code {}", code))
}

fn seed_from(seed: i64) -> Option<u64> {
    if seed < 0 {
        None
    } else {
        Some(seed as u64)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Resolve a prediction service response into a sorted JSON array.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `now` must be NULL or a valid null-terminated RFC 3339 string.
/// - Returns a newly allocated string that must be freed with `pawsense_free_string`.
/// - Returns NULL on error; call `pawsense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pawsense_resolve_payload(
    json: *const c_char,
    now: *const c_char,
    style: i32,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let (now, style) = match (parse_now(now), parse_style(style)) {
        (Ok(now), Ok(style)) => (now, style),
        (Err(e), _) | (_, Err(e)) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match resolve_predictions(&json_str, &now, style) {
        Ok(entries) => to_json(&entries),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Build a prediction board from a response body, falling back to a
/// placeholder chain when the body is unusable.
///
/// # Safety
/// - `json` must be a valid null-terminated C string (the raw response body).
/// - `request_json` must be a valid null-terminated C string holding the request
///   that produced the body (`{"current_activity": ...}`).
/// - `now` must be NULL or a valid null-terminated RFC 3339 string.
/// - `seed` < 0 seeds the placeholder generator from OS entropy.
/// - Returns a newly allocated string that must be freed with `pawsense_free_string`.
/// - Returns NULL only for invalid arguments; call `pawsense_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn pawsense_board_from_response(
    json: *const c_char,
    request_json: *const c_char,
    now: *const c_char,
    style: i32,
    seed: i64,
) -> *mut c_char {
    clear_last_error();

    // A NULL body is a failed fetch, not a caller error
    let body = cstr_to_string(json).unwrap_or_default();

    let request: PredictionRequest = match cstr_to_string(request_json)
        .ok_or_else(|| "Invalid request string pointer".to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| format!("Invalid request: {}", e)))
    {
        Ok(r) => r,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let (now, style) = match (parse_now(now), parse_style(style)) {
        (Ok(now), Ok(style)) => (now, style),
        (Err(e), _) | (_, Err(e)) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let mut pipeline = PredictionPipeline::offline(seed_from(seed), style);
    let board = pipeline.board_from_body(&body, &request, &now);
    to_json(&board)
}

/// Format a minutes-until value as countdown text.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `pawsense_free_string`.
/// - Returns NULL for an unknown style code.
#[no_mangle]
pub unsafe extern "C" fn pawsense_format_countdown(minutes_until: i64, style: i32) -> *mut c_char {
    clear_last_error();

    match parse_style(style) {
        Ok(style) => string_to_cstr(&format_countdown(minutes_until, style)),
        Err(e) => {
            set_last_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Controller API
// ============================================================================

/// Opaque handle to a CollarController
pub struct CollarControllerHandle {
    controller: CollarController,
}

/// Create a controller. `seed` < 0 seeds from OS entropy.
///
/// # Safety
/// - Returns a pointer to a newly allocated controller.
/// - Must be freed with `pawsense_controller_free`.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_new(seed: i64) -> *mut CollarControllerHandle {
    clear_last_error();

    let handle = Box::new(CollarControllerHandle {
        controller: CollarController::new(seed_from(seed)),
    });
    Box::into_raw(handle)
}

/// Free a controller.
///
/// # Safety
/// - `controller` must be a valid pointer returned by `pawsense_controller_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_free(controller: *mut CollarControllerHandle) {
    if !controller.is_null() {
        drop(Box::from_raw(controller));
    }
}

/// Advance the telemetry simulation by one tick.
///
/// # Safety
/// - `controller` must be a valid pointer returned by `pawsense_controller_new`.
/// - Returns 0 on success, -1 on a null pointer.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_tick(controller: *mut CollarControllerHandle) -> i32 {
    clear_last_error();

    if controller.is_null() {
        set_last_error("Null controller pointer");
        return -1;
    }
    (*controller).controller.tick();
    0
}

/// Select the visible tab by name (dashboard, health, location, behavior, translator).
///
/// # Safety
/// - `controller` must be a valid pointer returned by `pawsense_controller_new`.
/// - `tab` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_select_tab(
    controller: *mut CollarControllerHandle,
    tab: *const c_char,
) -> i32 {
    clear_last_error();

    if controller.is_null() {
        set_last_error("Null controller pointer");
        return -1;
    }

    let tab: Tab = match cstr_to_string(tab).map(|s| s.parse()) {
        Some(Ok(tab)) => tab,
        Some(Err(e)) => {
            set_last_error(&e.to_string());
            return -2;
        }
        None => {
            set_last_error("Invalid tab string pointer");
            return -2;
        }
    };

    (*controller).controller.select_tab(tab);
    0
}

/// Apply a board JSON produced by `pawsense_board_from_response`.
///
/// # Safety
/// - `controller` must be a valid pointer returned by `pawsense_controller_new`.
/// - `board_json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_apply_board(
    controller: *mut CollarControllerHandle,
    board_json: *const c_char,
) -> i32 {
    clear_last_error();

    if controller.is_null() {
        set_last_error("Null controller pointer");
        return -1;
    }

    let json_str = match cstr_to_string(board_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid board string pointer");
            return -2;
        }
    };

    match serde_json::from_str::<PredictionBoard>(&json_str) {
        Ok(board) => {
            (*controller).controller.apply_board(board);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -3
        }
    }
}

/// Current snapshot as JSON.
///
/// # Safety
/// - `controller` must be a valid pointer returned by `pawsense_controller_new`.
/// - Returns a newly allocated string that must be freed with `pawsense_free_string`.
/// - Returns NULL on error; call `pawsense_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pawsense_controller_snapshot(
    controller: *mut CollarControllerHandle,
) -> *mut c_char {
    clear_last_error();

    if controller.is_null() {
        set_last_error("Null controller pointer");
        return ptr::null_mut();
    }

    to_json(&(*controller).controller.snapshot())
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a static string that is valid until the next FFI call.
/// - Returns NULL if there was no error.
/// - Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn pawsense_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string returned by PawSense functions.
///
/// # Safety
/// - `s` must be a pointer returned by a PawSense function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pawsense_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the PawSense version string.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `pawsense_free_string`.
#[no_mangle]
pub unsafe extern "C" fn pawsense_version() -> *mut c_char {
    string_to_cstr(crate::PAWSENSE_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        pawsense_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_resolve_payload() {
        let json = CString::new(
            r#"{"predictionList": [{"activity": "Walking", "average_start_time": "14:30:00"}]}"#,
        )
        .unwrap();
        let now = CString::new("2025-08-09T15:00:00+00:00").unwrap();

        unsafe {
            let result = take_string(pawsense_resolve_payload(json.as_ptr(), now.as_ptr(), 0));
            let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
            assert_eq!(parsed[0]["minutes_until"], 1410);
            assert_eq!(parsed[0]["display_text"], "in 23h 30m");
        }
    }

    #[test]
    fn test_ffi_resolve_payload_error() {
        let json = CString::new(r#"{"nope": []}"#).unwrap();

        unsafe {
            let result = pawsense_resolve_payload(json.as_ptr(), ptr::null(), 0);
            assert!(result.is_null());

            let error = pawsense_last_error();
            assert!(!error.is_null());
            let msg = CStr::from_ptr(error).to_str().unwrap();
            assert!(msg.contains("missing prediction list"));
        }
    }

    #[test]
    fn test_ffi_board_falls_back_on_null_body() {
        let request = CString::new(r#"{"current_activity": "Feeding", "max_depth": 3}"#).unwrap();
        let now = CString::new("2025-08-09T15:00:00+02:00").unwrap();

        unsafe {
            let result = take_string(pawsense_board_from_response(
                ptr::null(),
                request.as_ptr(),
                now.as_ptr(),
                1,
                42,
            ));
            let board: PredictionBoard = serde_json::from_str(&result).unwrap();
            assert!(board.source.is_fallback());
            assert_eq!(board.entries.len(), 3);
            assert_eq!(board.style, CountdownStyle::Verbose);
        }
    }

    #[test]
    fn test_ffi_board_survives_huge_chain_offset() {
        let json = CString::new(
            r#"{"predictions": [{"next_activity": "Walk", "time_to_next_minutes": 1e12, "probability": 0.5}]}"#,
        )
        .unwrap();
        let request = CString::new(r#"{"current_activity": "Feeding", "max_depth": 2}"#).unwrap();
        let now = CString::new("2025-08-09T15:00:00+00:00").unwrap();

        unsafe {
            let result = take_string(pawsense_board_from_response(
                json.as_ptr(),
                request.as_ptr(),
                now.as_ptr(),
                0,
                7,
            ));
            let board: PredictionBoard = serde_json::from_str(&result).unwrap();
            assert!(board.source.is_fallback());
            assert_eq!(board.entries.len(), 2);
        }
    }

    #[test]
    fn test_ffi_format_countdown() {
        unsafe {
            assert_eq!(take_string(pawsense_format_countdown(125, 1)), "in 2 hours 5 minutes");
            assert!(pawsense_format_countdown(125, 5).is_null());
        }
    }

    #[test]
    fn test_ffi_controller_lifecycle() {
        unsafe {
            let controller = pawsense_controller_new(7);
            assert!(!controller.is_null());

            assert_eq!(pawsense_controller_tick(controller), 0);

            let tab = CString::new("health").unwrap();
            assert_eq!(pawsense_controller_select_tab(controller, tab.as_ptr()), 0);
            let bad_tab = CString::new("settings").unwrap();
            assert_ne!(pawsense_controller_select_tab(controller, bad_tab.as_ptr()), 0);

            let snapshot = take_string(pawsense_controller_snapshot(controller));
            let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
            assert_eq!(parsed["tab"], "health");
            assert!(parsed["predictions"].is_null());

            pawsense_controller_free(controller);
        }
    }

    #[test]
    fn test_ffi_null_controller() {
        unsafe {
            assert_eq!(pawsense_controller_tick(ptr::null_mut()), -1);
            assert!(pawsense_controller_snapshot(ptr::null_mut()).is_null());
        }
    }
}
