//=====================================================
// File: lib.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: SolvraScript native capability bridge
// Objective: Export the HTTP adapter, native plugin loader and invocation
//            bridge used by the SolvraScript VM
//=====================================================

pub mod builtins;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod plugin;
pub mod value;

pub use builtins::Builtins;
pub use config::BridgeConfig;
pub use context::BridgeContext;
pub use error::{BridgeError, BridgeResult};
pub use http::{HttpTransport, UreqTransport};
pub use plugin::{EmbeddedModule, PluginHandle, PluginRegistry};
pub use value::{ErrorKind, ErrorObject, ScriptValue};

//=====================================================
// End of file
//=====================================================
