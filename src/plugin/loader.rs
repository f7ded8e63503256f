//==================================================
// File: plugin/loader.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Resolve import specifiers into loaded modules
// Objective: Map a path-like specifier onto a shared library location and
//            open it, reporting every failure as a LoadError
//==================================================

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::BridgeResult;

use super::module::InvokableModule;
use super::native::NativeModule;

/// Candidate locations for `specifier`, in lookup order.
pub fn candidate_paths(specifier: &str, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let direct = PathBuf::from(specifier);
    let decorated = format!("{DLL_PREFIX}{specifier}{DLL_SUFFIX}");
    let mut candidates = vec![direct.clone()];
    if !specifier.ends_with(DLL_SUFFIX) {
        candidates.push(PathBuf::from(format!("{specifier}{DLL_SUFFIX}")));
    }
    if direct.is_relative() {
        for root in search_paths {
            candidates.push(root.join(specifier));
            candidates.push(root.join(&decorated));
        }
    }
    candidates
}

/// First existing candidate as an absolute path, otherwise the raw specifier so
/// the platform loader can apply its own search rules.
///
/// A found file is always made absolute: the platform loader treats a bare file
/// name as a library name and never looks in the working directory.
pub fn resolve_location(specifier: &str, search_paths: &[PathBuf]) -> OsString {
    candidate_paths(specifier, search_paths)
        .into_iter()
        .find(|path| path.is_file())
        .map(|path| std::path::absolute(&path).unwrap_or(path).into_os_string())
        .unwrap_or_else(|| OsString::from(specifier))
}

/// Load the shared library named by `specifier`.
pub fn load_native(
    specifier: &str,
    search_paths: &[PathBuf],
) -> BridgeResult<Arc<dyn InvokableModule>> {
    let location = resolve_location(specifier, search_paths);
    tracing::debug!(specifier, location = %Path::new(&location).display(), "loading native plugin");
    let module = NativeModule::open(specifier, &location)?;
    Ok(Arc::new(module))
}
