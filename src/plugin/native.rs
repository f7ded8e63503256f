//==================================================
// File: plugin/native.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Dynamic-library plugin modules
// Objective: Open a platform shared library, read its manifest, and call its
//            symbols with marshalled arguments
//==================================================

use std::collections::HashMap;
use std::ffi::{CStr, CString, OsStr, c_char, c_void};
use std::fmt;
use std::mem::transmute_copy;
use std::slice;

use libloading::Library;
use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};

use super::abi::{
    FreeTextFn, MANIFEST_SYMBOL, MAX_NATIVE_ARITY, ManifestFn, PARAM_TEXT, PLUGIN_ABI_VERSION,
    RETURN_TEXT, RETURN_VOID, RawManifest, TakeFaultFn,
};
use super::marshal::{NativeKind, NativeValue, ReturnKind, Signature};
use super::module::InvokableModule;

type Text = *const c_char;

/// A shared library loaded through `libloading`.
pub struct NativeModule {
    specifier: String,
    symbols: HashMap<String, Signature>,
    free_text: Option<FreeTextFn>,
    take_fault: Option<TakeFaultFn>,
    // Declared last: dropped after everything that points into it.
    library: Library,
}

impl NativeModule {
    /// Open `location` and validate its manifest. Every failure is a `LoadError`.
    pub fn open(specifier: &str, location: &OsStr) -> BridgeResult<Self> {
        let load_error = |reason: String| BridgeError::Load {
            specifier: specifier.to_string(),
            reason,
        };

        // SAFETY: opening a library runs its initialisers; artifacts are trusted by the embedder.
        let library = unsafe { Library::new(location) }.map_err(|err| load_error(err.to_string()))?;

        // SAFETY: the manifest symbol is declared with the ABI's fixed signature.
        let manifest_fn: ManifestFn = *unsafe { library.get::<ManifestFn>(MANIFEST_SYMBOL) }
            .map_err(|err| load_error(format!("not a Solvra plugin: {err}")))?;

        // SAFETY: the manifest points at static data owned by `library`.
        let manifest = unsafe { read_manifest(manifest_fn()) }.map_err(load_error)?;
        // SAFETY: as above, the table lives as long as `library`.
        let symbols = unsafe { read_symbols(manifest) }.map_err(load_error)?;
        debug!(specifier, symbols = symbols.len(), "native plugin loaded");

        Ok(Self {
            specifier: specifier.to_string(),
            symbols,
            free_text: manifest.free_text,
            take_fault: manifest.take_fault,
            library,
        })
    }

    fn take_text(&self, raw: *mut c_char) -> Option<String> {
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null returns are NUL-terminated strings owned by the plugin.
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        if let Some(free) = self.free_text {
            // SAFETY: ownership of `raw` goes back to the plugin that produced it.
            unsafe { free(raw) };
        }
        Some(text)
    }

    fn check_fault(&self, symbol: &str) -> BridgeResult<()> {
        let Some(take_fault) = self.take_fault else {
            return Ok(());
        };
        // SAFETY: `take_fault` comes from the manifest and follows the ABI.
        let raw = unsafe { take_fault() };
        match self.take_text(raw) {
            Some(message) => Err(BridgeError::NativeFault {
                symbol: symbol.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

/// Check the manifest header before any of its tables are read.
///
/// # Safety
/// `raw` must be null or point at a `RawManifest` valid for `'a`.
unsafe fn read_manifest<'a>(raw: *const RawManifest) -> Result<&'a RawManifest, String> {
    // SAFETY: guaranteed by the caller.
    let manifest =
        unsafe { raw.as_ref() }.ok_or_else(|| "plugin returned a null manifest".to_string())?;
    if manifest.abi_version != PLUGIN_ABI_VERSION {
        return Err(format!(
            "unsupported plugin ABI version {} (expected {PLUGIN_ABI_VERSION})",
            manifest.abi_version
        ));
    }
    Ok(manifest)
}

/// # Safety
/// Every pointer in `manifest` must be null or valid for its declared length.
unsafe fn read_symbols(manifest: &RawManifest) -> Result<HashMap<String, Signature>, String> {
    let mut symbols = HashMap::new();
    if manifest.symbol_count == 0 {
        return Ok(symbols);
    }
    if manifest.symbols.is_null() {
        return Err("manifest symbol table is null".into());
    }
    // SAFETY: caller guarantees the table holds `symbol_count` entries.
    let table = unsafe { slice::from_raw_parts(manifest.symbols, manifest.symbol_count) };
    for raw in table {
        if raw.name.is_null() {
            return Err("manifest contains an unnamed symbol".into());
        }
        // SAFETY: names are NUL-terminated static strings.
        let name = unsafe { CStr::from_ptr(raw.name) }
            .to_str()
            .map_err(|_| "manifest symbol name is not valid UTF-8".to_string())?
            .to_string();

        let tags: &[u8] = if raw.param_count == 0 {
            &[]
        } else if raw.params.is_null() {
            return Err(format!("symbol '{name}' has a null parameter list"));
        } else {
            // SAFETY: `params` holds `param_count` tags.
            unsafe { slice::from_raw_parts(raw.params, raw.param_count) }
        };
        let params = tags
            .iter()
            .map(|tag| match *tag {
                PARAM_TEXT => Ok(NativeKind::Text),
                other => Err(format!("symbol '{name}' declares unknown parameter kind {other}")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let returns = match raw.returns {
            RETURN_VOID => ReturnKind::Void,
            RETURN_TEXT => ReturnKind::Text,
            other => return Err(format!("symbol '{name}' declares unknown return kind {other}")),
        };

        if params.len() > MAX_NATIVE_ARITY {
            warn!(
                symbol = %name,
                arity = params.len(),
                "skipping symbol with more parameters than the bridge can dispatch"
            );
            continue;
        }
        symbols.insert(name, Signature::new(params, returns));
    }
    Ok(symbols)
}

/// Call `address` as a C function of `argv.len()` text parameters returning `R`.
///
/// # Safety
/// `address` must be a function with exactly that C signature.
unsafe fn dispatch<R>(address: *const c_void, argv: &[Text]) -> BridgeResult<R> {
    // SAFETY: the caller vouches for the signature; fn pointers are pointer-sized.
    let value = unsafe {
        match *argv {
            [] => transmute_copy::<_, unsafe extern "C" fn() -> R>(&address)(),
            [a] => transmute_copy::<_, unsafe extern "C" fn(Text) -> R>(&address)(a),
            [a, b] => transmute_copy::<_, unsafe extern "C" fn(Text, Text) -> R>(&address)(a, b),
            [a, b, c] => {
                transmute_copy::<_, unsafe extern "C" fn(Text, Text, Text) -> R>(&address)(a, b, c)
            }
            [a, b, c, d] => transmute_copy::<_, unsafe extern "C" fn(Text, Text, Text, Text) -> R>(
                &address,
            )(a, b, c, d),
            [a, b, c, d, e] => transmute_copy::<
                _,
                unsafe extern "C" fn(Text, Text, Text, Text, Text) -> R,
            >(&address)(a, b, c, d, e),
            [a, b, c, d, e, f] => transmute_copy::<
                _,
                unsafe extern "C" fn(Text, Text, Text, Text, Text, Text) -> R,
            >(&address)(a, b, c, d, e, f),
            _ => {
                return Err(BridgeError::TypeMismatch(format!(
                    "native calls take at most {MAX_NATIVE_ARITY} arguments. got={}",
                    argv.len()
                )));
            }
        }
    };
    Ok(value)
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("specifier", &self.specifier)
            .field("symbols", &self.symbols())
            .finish()
    }
}

impl InvokableModule for NativeModule {
    fn specifier(&self) -> &str {
        &self.specifier
    }

    fn signature(&self, symbol: &str) -> Option<&Signature> {
        self.symbols.get(symbol)
    }

    fn symbols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.keys().cloned().collect();
        names.sort();
        names
    }

    fn invoke(
        &self,
        symbol: &str,
        signature: &Signature,
        args: Vec<NativeValue>,
    ) -> BridgeResult<Option<NativeValue>> {
        let undefined = || BridgeError::UndefinedSymbol {
            symbol: symbol.to_string(),
            specifier: self.specifier.clone(),
        };
        let name = CString::new(symbol).map_err(|_| undefined())?;
        // SAFETY: the address is only called through the signature the manifest declares.
        let address: *const c_void =
            *unsafe { self.library.get::<*const c_void>(name.as_bytes_with_nul()) }
                .map_err(|_| undefined())?;

        let texts = args
            .into_iter()
            .map(|value| match value {
                NativeValue::Text(text) => CString::new(text).map_err(|_| {
                    BridgeError::TypeMismatch("native text cannot contain NUL".into())
                }),
            })
            .collect::<BridgeResult<Vec<_>>>()?;
        let argv: Vec<Text> = texts.iter().map(|text| text.as_ptr()).collect();

        let result = match signature.returns {
            ReturnKind::Void => {
                // SAFETY: manifest declares a void function of this arity.
                unsafe { dispatch::<()>(address, &argv) }?;
                None
            }
            ReturnKind::Text => {
                // SAFETY: manifest declares a text-returning function of this arity.
                let raw = unsafe { dispatch::<*mut c_char>(address, &argv) }?;
                self.take_text(raw).map(NativeValue::Text)
            }
        };
        self.check_fault(symbol)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::abi::RawSymbol;
    use std::ptr;

    fn symbol(name: &'static CStr, params: &'static [u8], returns: u8) -> RawSymbol {
        RawSymbol {
            name: name.as_ptr(),
            params: params.as_ptr(),
            param_count: params.len(),
            returns,
        }
    }

    fn manifest(symbols: &[RawSymbol]) -> RawManifest {
        RawManifest {
            abi_version: PLUGIN_ABI_VERSION,
            symbols: symbols.as_ptr(),
            symbol_count: symbols.len(),
            free_text: None,
            take_fault: None,
        }
    }

    fn validate(manifest: &RawManifest) -> Result<HashMap<String, Signature>, String> {
        unsafe {
            let manifest = read_manifest(manifest)?;
            read_symbols(manifest)
        }
    }

    #[test]
    fn well_formed_manifest_yields_signatures() {
        let table = [
            symbol(c"Foo", &[PARAM_TEXT], RETURN_VOID),
            symbol(c"Bar", &[], RETURN_TEXT),
        ];
        let symbols = validate(&manifest(&table)).expect("valid manifest");
        assert_eq!(
            symbols.get("Foo"),
            Some(&Signature::new(vec![NativeKind::Text], ReturnKind::Void))
        );
        assert_eq!(
            symbols.get("Bar"),
            Some(&Signature::new(Vec::new(), ReturnKind::Text))
        );
    }

    #[test]
    fn null_manifest_is_rejected() {
        let err = unsafe { read_manifest(ptr::null()) }.expect_err("null");
        assert_eq!(err, "plugin returned a null manifest");
    }

    #[test]
    fn abi_version_mismatch_is_rejected() {
        let mut raw = manifest(&[]);
        raw.abi_version = PLUGIN_ABI_VERSION + 1;
        let err = validate(&raw).expect_err("version");
        assert!(err.starts_with("unsupported plugin ABI version"), "{err}");
    }

    #[test]
    fn null_symbol_table_is_rejected() {
        let mut raw = manifest(&[]);
        raw.symbols = ptr::null();
        raw.symbol_count = 2;
        assert_eq!(validate(&raw).expect_err("table"), "manifest symbol table is null");
    }

    #[test]
    fn empty_manifest_exports_nothing() {
        let mut raw = manifest(&[]);
        raw.symbols = ptr::null();
        assert!(validate(&raw).expect("empty").is_empty());
    }

    #[test]
    fn unnamed_symbol_is_rejected() {
        let table = [RawSymbol {
            name: ptr::null(),
            params: ptr::null(),
            param_count: 0,
            returns: RETURN_VOID,
        }];
        let err = validate(&manifest(&table)).expect_err("unnamed");
        assert_eq!(err, "manifest contains an unnamed symbol");
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let table = [symbol(c"Odd", &[PARAM_TEXT, 7], RETURN_VOID)];
        let err = validate(&manifest(&table)).expect_err("param tag");
        assert_eq!(err, "symbol 'Odd' declares unknown parameter kind 7");

        let table = [symbol(c"Odd", &[], 9)];
        let err = validate(&manifest(&table)).expect_err("return tag");
        assert_eq!(err, "symbol 'Odd' declares unknown return kind 9");
    }

    #[test]
    fn null_parameter_list_is_rejected() {
        let table = [RawSymbol {
            name: c"Foo".as_ptr(),
            params: ptr::null(),
            param_count: 1,
            returns: RETURN_VOID,
        }];
        let err = validate(&manifest(&table)).expect_err("params");
        assert_eq!(err, "symbol 'Foo' has a null parameter list");
    }

    #[test]
    fn symbols_beyond_dispatch_arity_are_skipped() {
        let table = [
            symbol(c"Wide", &[PARAM_TEXT; MAX_NATIVE_ARITY + 1], RETURN_TEXT),
            symbol(c"Full", &[PARAM_TEXT; MAX_NATIVE_ARITY], RETURN_TEXT),
        ];
        let symbols = validate(&manifest(&table)).expect("valid manifest");
        assert!(!symbols.contains_key("Wide"));
        assert_eq!(symbols.get("Full").map(Signature::arity), Some(MAX_NATIVE_ARITY));
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn library_without_manifest_is_not_a_plugin() {
        let err = NativeModule::open("libm", OsStr::new("libm.so.6")).expect_err("no manifest");
        assert_eq!(err.kind(), crate::value::ErrorKind::LoadError);
        assert!(err.to_string().contains("not a Solvra plugin"), "{err}");
    }
}
