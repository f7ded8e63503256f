//==================================================
// File: plugin/abi.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: C ABI shared by the loader and native plugins
// Objective: Describe exported symbols through a manifest and give plugin
//            authors the helpers needed to honour it
//==================================================

//! Native plugin ABI.
//!
//! A loadable artifact exports `solvra_plugin_manifest`, returning a pointer to a
//! static [`RawManifest`]. Every listed symbol is a C function taking
//! `param_count` `*const c_char` arguments and returning either nothing or a
//! `*mut c_char` the bridge copies and hands back through `free_text`.
//!
//! Plugin functions must not unwind into the host. Wrap bodies in [`guard`]; a
//! panic is recorded and reported to the bridge through `take_fault`.

use std::any::Any;
use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

pub const PLUGIN_ABI_VERSION: u32 = 1;

/// NUL-terminated name of the manifest entry point.
pub const MANIFEST_SYMBOL: &[u8] = b"solvra_plugin_manifest\0";

pub const PARAM_TEXT: u8 = 1;
pub const RETURN_VOID: u8 = 0;
pub const RETURN_TEXT: u8 = 1;

/// Highest parameter count the bridge can dispatch.
pub const MAX_NATIVE_ARITY: usize = 6;

pub type ManifestFn = unsafe extern "C" fn() -> *const RawManifest;
pub type FreeTextFn = unsafe extern "C" fn(*mut c_char);
pub type TakeFaultFn = unsafe extern "C" fn() -> *mut c_char;

#[repr(C)]
pub struct RawSymbol {
    pub name: *const c_char,
    pub params: *const u8,
    pub param_count: usize,
    pub returns: u8,
}

#[repr(C)]
#[derive(Debug)]
pub struct RawManifest {
    pub abi_version: u32,
    pub symbols: *const RawSymbol,
    pub symbol_count: usize,
    pub free_text: Option<FreeTextFn>,
    pub take_fault: Option<TakeFaultFn>,
}

/// Wrapper that lets plugins keep manifest tables in `static` items.
#[repr(transparent)]
pub struct StaticTable<T>(pub T);

// SAFETY: tables only hold pointers to immutable 'static data.
unsafe impl<T> Sync for StaticTable<T> {}

//==================================================
// Section 1.0 - Plugin-side helpers
//==================================================

thread_local! {
    static FAULT: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `f`, converting a panic into a recorded fault and returning `default`.
pub fn guard<R>(default: R, f: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let message = panic_message(payload.as_ref()).replace('\0', " ");
            let message = CString::new(message).unwrap_or_default();
            FAULT.with(|slot| *slot.borrow_mut() = Some(message));
            default
        }
    }
}

/// Hands ownership of `text` to the bridge. Release with [`free_text`].
pub fn into_text(text: impl Into<String>) -> *mut c_char {
    let text = text.into().replace('\0', " ");
    CString::new(text).map_or(ptr::null_mut(), CString::into_raw)
}

/// Borrow a text argument. Null reads as the empty string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
pub unsafe fn text_arg<'a>(ptr: *const c_char) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        return std::borrow::Cow::Borrowed("");
    }
    // SAFETY: caller guarantees a valid NUL-terminated string.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
}

/// Manifest `free_text` entry for text produced by [`into_text`].
///
/// # Safety
/// `ptr` must be null or come from [`into_text`] in the same plugin.
pub unsafe extern "C" fn free_text(ptr: *mut c_char) {
    if !ptr.is_null() {
        // SAFETY: pointer was produced by CString::into_raw.
        drop(unsafe { CString::from_raw(ptr) });
    }
}

/// Manifest `take_fault` entry: drains the fault recorded by [`guard`] on this thread.
///
/// # Safety
/// The returned pointer must be released with [`free_text`].
pub unsafe extern "C" fn take_fault() -> *mut c_char {
    FAULT
        .with(|slot| slot.borrow_mut().take())
        .map_or(ptr::null_mut(), CString::into_raw)
}
