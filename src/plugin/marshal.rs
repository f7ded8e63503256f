//==================================================
// File: plugin/marshal.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script <-> native value conversion
// Objective: Keep the set of representable kinds closed so a new kind is a
//            change to this file only
//==================================================

use crate::error::{BridgeError, BridgeResult};
use crate::value::ScriptValue;

/// Parameter kinds a native symbol may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Text,
}

impl NativeKind {
    pub fn name(self) -> &'static str {
        match self {
            NativeKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    Void,
    Text,
}

/// Declared shape of an exported symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<NativeKind>,
    pub returns: ReturnKind,
}

impl Signature {
    pub fn new(params: Vec<NativeKind>, returns: ReturnKind) -> Self {
        Self { params, returns }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A value already converted to its host representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Text(String),
}

pub fn to_native(value: &ScriptValue, kind: NativeKind) -> BridgeResult<NativeValue> {
    match (kind, value) {
        (NativeKind::Text, ScriptValue::String(text)) => {
            if text.contains('\0') {
                return Err(BridgeError::TypeMismatch(
                    "String containing NUL cannot be passed as native text".into(),
                ));
            }
            Ok(NativeValue::Text(text.clone()))
        }
        (kind, other) => Err(BridgeError::TypeMismatch(format!(
            "cannot marshal {} as native {}",
            other.type_name(),
            kind.name()
        ))),
    }
}

pub fn from_native(value: NativeValue) -> ScriptValue {
    match value {
        NativeValue::Text(text) => ScriptValue::String(text),
    }
}

/// Marshal `args` in order against `signature`; nothing is converted unless the arity matches.
pub fn marshal_args(
    symbol: &str,
    signature: &Signature,
    args: &[ScriptValue],
) -> BridgeResult<Vec<NativeValue>> {
    if args.len() != signature.arity() {
        return Err(BridgeError::TypeMismatch(format!(
            "'{symbol}' expects {} argument(s). got={}",
            signature.arity(),
            args.len()
        )));
    }
    signature
        .params
        .iter()
        .zip(args)
        .map(|(kind, arg)| to_native(arg, *kind))
        .collect()
}
