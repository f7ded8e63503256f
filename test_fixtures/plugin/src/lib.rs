//=====================================================
// File: test_fixtures/plugin/src/lib.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Native plugin used by the bridge integration tests
// Objective: Export a small manifest of text symbols, including one that panics
//=====================================================

#![allow(non_snake_case)]

use std::ffi::c_char;
use std::ptr;

use solvra_bridge::plugin::abi::{
    self, PARAM_TEXT, PLUGIN_ABI_VERSION, RETURN_TEXT, RETURN_VOID, RawManifest, RawSymbol,
    StaticTable,
};

static ONE_TEXT: [u8; 1] = [PARAM_TEXT];
static TWO_TEXT: [u8; 2] = [PARAM_TEXT, PARAM_TEXT];

static SYMBOLS: StaticTable<[RawSymbol; 5]> = StaticTable([
    RawSymbol {
        name: c"Foo".as_ptr(),
        params: ONE_TEXT.as_ptr(),
        param_count: 1,
        returns: RETURN_VOID,
    },
    RawSymbol {
        name: c"Bar".as_ptr(),
        params: ptr::null(),
        param_count: 0,
        returns: RETURN_TEXT,
    },
    RawSymbol {
        name: c"Baz".as_ptr(),
        params: ptr::null(),
        param_count: 0,
        returns: RETURN_VOID,
    },
    RawSymbol {
        name: c"Join".as_ptr(),
        params: TWO_TEXT.as_ptr(),
        param_count: 2,
        returns: RETURN_TEXT,
    },
    RawSymbol {
        name: c"Boom".as_ptr(),
        params: ptr::null(),
        param_count: 0,
        returns: RETURN_TEXT,
    },
]);

static MANIFEST: StaticTable<RawManifest> = StaticTable(RawManifest {
    abi_version: PLUGIN_ABI_VERSION,
    symbols: SYMBOLS.0.as_ptr(),
    symbol_count: 5,
    free_text: Some(abi::free_text),
    take_fault: Some(abi::take_fault),
});

#[no_mangle]
pub extern "C" fn solvra_plugin_manifest() -> *const RawManifest {
    &MANIFEST.0
}

#[no_mangle]
pub extern "C" fn Foo(suffix: *const c_char) {
    abi::guard((), || {
        let suffix = unsafe { abi::text_arg(suffix) };
        println!("Foo{suffix}");
    })
}

#[no_mangle]
pub extern "C" fn Bar() -> *mut c_char {
    abi::guard(ptr::null_mut(), || abi::into_text("Bar"))
}

#[no_mangle]
pub extern "C" fn Baz() {}

#[no_mangle]
pub extern "C" fn Join(left: *const c_char, right: *const c_char) -> *mut c_char {
    abi::guard(ptr::null_mut(), || {
        let (left, right) = unsafe { (abi::text_arg(left), abi::text_arg(right)) };
        abi::into_text(format!("{left}{right}"))
    })
}

#[no_mangle]
pub extern "C" fn Boom() -> *mut c_char {
    abi::guard(ptr::null_mut(), || -> *mut c_char { panic!("boom") })
}
