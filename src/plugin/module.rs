//==================================================
// File: plugin/module.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Invocation seam for loaded modules
// Objective: Give native and embedded modules one calling interface
//==================================================

use crate::error::BridgeResult;

use super::marshal::{NativeValue, Signature};

/// A loaded module whose exported symbols can be invoked by name.
///
/// Implemented once per native-module representation (dynamic library,
/// in-process embedded module). Implementations may panic inside `invoke`;
/// the bridge intercepts that at its boundary.
pub trait InvokableModule: Send + Sync {
    /// Location specifier the module was imported from.
    fn specifier(&self) -> &str;

    /// Declared signature of `symbol`, or `None` when it is not exported.
    fn signature(&self, symbol: &str) -> Option<&Signature>;

    /// Exported symbol names, sorted.
    fn symbols(&self) -> Vec<String>;

    /// Call `symbol` with arguments already marshalled against `signature`.
    /// `Ok(None)` means the symbol produced no value.
    fn invoke(
        &self,
        symbol: &str,
        signature: &Signature,
        args: Vec<NativeValue>,
    ) -> BridgeResult<Option<NativeValue>>;
}
