//==================================================
// File: plugin/embedded.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: In-process plugin modules
// Objective: Let the embedder expose Rust closures to `import`/`send` through
//            the same invocation path as dynamic libraries
//==================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};

use super::marshal::{NativeKind, NativeValue, ReturnKind, Signature};
use super::module::InvokableModule;

pub type EmbeddedFn = Arc<dyn Fn(&[NativeValue]) -> Option<NativeValue> + Send + Sync>;

struct EmbeddedExport {
    signature: Signature,
    func: EmbeddedFn,
}

/// Module assembled from Rust closures and registered under a name.
pub struct EmbeddedModule {
    name: String,
    exports: HashMap<String, EmbeddedExport>,
}

impl EmbeddedModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exports: HashMap::new(),
        }
    }

    /// Export `symbol` with an explicit signature.
    pub fn export<F>(mut self, symbol: &str, signature: Signature, func: F) -> Self
    where
        F: Fn(&[NativeValue]) -> Option<NativeValue> + Send + Sync + 'static,
    {
        self.exports.insert(
            symbol.to_string(),
            EmbeddedExport {
                signature,
                func: Arc::new(func),
            },
        );
        self
    }

    /// Export a function of `arity` text parameters returning text.
    pub fn export_text<F>(self, symbol: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        let signature = Signature::new(vec![NativeKind::Text; arity], ReturnKind::Text);
        self.export(symbol, signature, move |args| {
            Some(NativeValue::Text(func(&texts(args))))
        })
    }

    /// Export a function of `arity` text parameters returning nothing.
    pub fn export_void<F>(self, symbol: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        let signature = Signature::new(vec![NativeKind::Text; arity], ReturnKind::Void);
        self.export(symbol, signature, move |args| {
            func(&texts(args));
            None
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn texts(args: &[NativeValue]) -> Vec<String> {
    args.iter()
        .map(|value| match value {
            NativeValue::Text(text) => text.clone(),
        })
        .collect()
}

impl fmt::Debug for EmbeddedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedModule")
            .field("name", &self.name)
            .field("symbols", &self.symbols())
            .finish()
    }
}

impl InvokableModule for EmbeddedModule {
    fn specifier(&self) -> &str {
        &self.name
    }

    fn signature(&self, symbol: &str) -> Option<&Signature> {
        self.exports.get(symbol).map(|export| &export.signature)
    }

    fn symbols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exports.keys().cloned().collect();
        names.sort();
        names
    }

    fn invoke(
        &self,
        symbol: &str,
        _signature: &Signature,
        args: Vec<NativeValue>,
    ) -> BridgeResult<Option<NativeValue>> {
        let Some(export) = self.exports.get(symbol) else {
            return Err(BridgeError::UndefinedSymbol {
                symbol: symbol.to_string(),
                specifier: self.name.clone(),
            });
        };
        Ok((export.func)(&args))
    }
}
