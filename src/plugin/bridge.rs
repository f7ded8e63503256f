//==================================================
// File: plugin/bridge.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Plugin invocation bridge
// Objective: Resolve, marshal, invoke and isolate a native symbol call so a
//            host fault never escapes into the interpreter
//==================================================

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::value::ScriptValue;

use super::abi::panic_message;
use super::marshal::{from_native, marshal_args};
use super::registry::{HandleState, PluginHandle, PluginRegistry};

/// `<plugin>.send(symbol, *args)`.
///
/// Steps run in order and stop at the first failure: a failed handle replays
/// its `LoadError`, an unknown symbol is a `NameError`, marshalling problems are
/// a `TypeMismatchError` raised before anything is invoked, and a fault during
/// the call becomes an `InternalError`.
pub fn send(
    registry: &PluginRegistry,
    handle: PluginHandle,
    symbol: &str,
    args: &[ScriptValue],
) -> BridgeResult<ScriptValue> {
    let slot = registry.slot(handle)?;
    let module = match slot.state() {
        HandleState::Failed(err) => return Err(err.clone()),
        HandleState::Loaded(module) => module,
    };

    let Some(signature) = module.signature(symbol) else {
        return Err(BridgeError::UndefinedSymbol {
            symbol: symbol.to_string(),
            specifier: slot.specifier().to_string(),
        });
    };
    let natives = marshal_args(symbol, signature, args)?;

    debug!(plugin = slot.specifier(), symbol, argc = natives.len(), "invoking native symbol");
    let _serialized = slot.gate().map(|gate| gate.lock());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        module.invoke(symbol, signature, natives)
    }));

    match outcome {
        Ok(Ok(Some(value))) => Ok(from_native(value)),
        Ok(Ok(None)) => Ok(ScriptValue::Unit),
        Ok(Err(err)) => {
            if matches!(err, BridgeError::NativeFault { .. }) {
                warn!(plugin = slot.specifier(), symbol, error = %err, "native fault intercepted");
            }
            Err(err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(plugin = slot.specifier(), symbol, %message, "native panic intercepted");
            Err(BridgeError::NativeFault {
                symbol: symbol.to_string(),
                message,
            })
        }
    }
}
