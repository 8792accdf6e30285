//! Status board FFI: C-compatible API for the mobile shells.
//!
//! Protocol:
//! - State crosses the boundary as JSON bytes.
//! - Strings are passed in as null-terminated UTF-8 C strings.
//! - Byte buffers come back as `FluxBytes { ptr, len }`; the caller frees
//!   them with `sb_bytes_free`.
//! - Callbacks receive `(path, json_bytes, json_len, user_data)` on the
//!   thread that changed the state.

use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use flux::{Flux, Subscription};
use statusboard::request;
use statusboard::{register_handlers, StatusBoard};
use statusboard_core::{AppConfig, StatusError};

/// Opaque handle to a Flux instance plus its status board.
pub struct FluxHandle {
    flux: Flux,
    board: Arc<StatusBoard>,
    rt: tokio::runtime::Runtime,
    subscriptions: Mutex<HashMap<u64, Subscription>>,
    next_sub: AtomicU64,
}

/// Byte buffer returned from FFI calls. Free with `sb_bytes_free`.
#[repr(C)]
pub struct FluxBytes {
    pub ptr: *const u8,
    pub len: usize,
}

impl FluxBytes {
    fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }
}

/// Subscription callback: `(path, json_bytes, json_len, user_data)`.
pub type FluxCallback =
    extern "C" fn(path: *const c_char, data: *const u8, data_len: usize, user_data: *mut c_void);

// ============================================================================
// Lifecycle
// ============================================================================

/// Create a status board from the TOML config at `config_path` (null for
/// the default location). Returns null when the config cannot be read.
/// Free with `sb_free`.
#[no_mangle]
pub extern "C" fn sb_create(config_path: *const c_char) -> *mut FluxHandle {
    let path = match read_str(config_path) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => AppConfig::default_path(),
    };
    let config = match AppConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "cannot load config");
            return std::ptr::null_mut();
        }
    };
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "cannot start runtime");
            return std::ptr::null_mut();
        }
    };

    let board = Arc::new(StatusBoard::from_config(&config));
    let flux = Flux::new();
    register_handlers(&flux, Arc::clone(&board));

    Box::into_raw(Box::new(FluxHandle {
        flux,
        board,
        rt,
        subscriptions: Mutex::new(HashMap::new()),
        next_sub: AtomicU64::new(1),
    }))
}

/// Free a handle. Releases every subscription it holds.
#[no_mangle]
pub extern "C" fn sb_free(handle: *mut FluxHandle) {
    if handle.is_null() {
        return;
    }
    let handle = unsafe { Box::from_raw(handle) };
    handle
        .rt
        .block_on(handle.flux.emit(request::ShutdownReq::PATH, request::ShutdownReq {}));
    handle.subscriptions.lock().expect("subscriptions poisoned").clear();
    tracing::debug!(feed_open = handle.board.feed_is_open(), "handle freed");
}

// ============================================================================
// State: read
// ============================================================================

/// State at `path` as JSON. Empty when the path holds nothing.
#[no_mangle]
pub extern "C" fn sb_get(handle: *const FluxHandle, path: *const c_char) -> FluxBytes {
    let (Some(handle), Some(path)) = (unsafe { handle.as_ref() }, read_str(path)) else {
        return FluxBytes::empty();
    };
    match handle.flux.get(path).and_then(|v| v.to_json()) {
        Some(json) => json_to_ffi(&json),
        None => FluxBytes::empty(),
    }
}

/// Free bytes returned by this library.
#[no_mangle]
pub extern "C" fn sb_bytes_free(bytes: FluxBytes) {
    if !bytes.ptr.is_null() && bytes.len > 0 {
        unsafe {
            drop(Vec::from_raw_parts(bytes.ptr as *mut u8, bytes.len, bytes.len));
        }
    }
}

// ============================================================================
// Requests: emit
// ============================================================================

/// Emit a request with a JSON body (null for requests without fields)
/// and wait for its handlers.
///
/// Returns empty bytes on success, or `{"code", "message"}` JSON when the
/// request could not be decoded.
#[no_mangle]
pub extern "C" fn sb_emit(
    handle: *const FluxHandle,
    path: *const c_char,
    payload_json: *const c_char,
) -> FluxBytes {
    let (Some(handle), Some(path)) = (unsafe { handle.as_ref() }, read_str(path)) else {
        return error_to_ffi(&StatusError::Validation("null handle or path".into()));
    };
    let body = read_str(payload_json).unwrap_or("");
    match request::decode(path, body) {
        Ok(payload) => {
            handle.rt.block_on(handle.flux.emit_arc(path, payload));
            FluxBytes::empty()
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "rejected request");
            error_to_ffi(&e)
        }
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Subscribe to state changes matching `pattern`. Returns an id for
/// `sb_unsubscribe`, or 0 on bad arguments.
#[no_mangle]
pub extern "C" fn sb_subscribe(
    handle: *const FluxHandle,
    pattern: *const c_char,
    callback: FluxCallback,
    user_data: *mut c_void,
) -> u64 {
    let (Some(handle), Some(pattern)) = (unsafe { handle.as_ref() }, read_str(pattern)) else {
        return 0;
    };

    // The shell guarantees user_data outlives the subscription.
    let user_data = user_data as usize;
    let sub = handle.flux.subscribe(pattern, move |path, value| {
        let Some(json) = value.to_json() else {
            return;
        };
        let Ok(bytes) = serde_json::to_vec(&json) else {
            return;
        };
        let Ok(c_path) = CString::new(path) else {
            return;
        };
        callback(c_path.as_ptr(), bytes.as_ptr(), bytes.len(), user_data as *mut c_void);
    });

    let id = handle.next_sub.fetch_add(1, Ordering::Relaxed);
    handle
        .subscriptions
        .lock()
        .expect("subscriptions poisoned")
        .insert(id, sub);
    id
}

/// Release a subscription. Unknown ids are ignored.
#[no_mangle]
pub extern "C" fn sb_unsubscribe(handle: *const FluxHandle, sub_id: u64) {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return;
    };
    let sub = handle
        .subscriptions
        .lock()
        .expect("subscriptions poisoned")
        .remove(&sub_id);
    drop(sub);
}

// ============================================================================
// Helpers
// ============================================================================

fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn json_to_ffi(json: &serde_json::Value) -> FluxBytes {
    match serde_json::to_vec(json) {
        Ok(bytes) => bytes_to_ffi(bytes),
        Err(_) => FluxBytes::empty(),
    }
}

fn error_to_ffi(error: &StatusError) -> FluxBytes {
    json_to_ffi(&error.to_json())
}

fn bytes_to_ffi(bytes: Vec<u8>) -> FluxBytes {
    // Exact capacity so sb_bytes_free can rebuild the Vec.
    let mut bytes = bytes.into_boxed_slice().into_vec();
    let len = bytes.len();
    let ptr = bytes.as_mut_ptr();
    std::mem::forget(bytes);
    FluxBytes { ptr, len }
}
