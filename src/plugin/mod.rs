//==================================================
// File: plugin/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Native plugin subsystem
// Objective: Wire the loader, registry, marshalling and invocation bridge together
//==================================================

//! Native plugin support: loading shared libraries (or embedded modules) into
//! opaque handles and invoking their exported symbols.

pub mod abi;
pub mod arena;
pub mod bridge;
pub mod embedded;
pub mod loader;
pub mod marshal;
pub mod module;
pub mod native;
pub mod registry;

pub use bridge::send;
pub use embedded::EmbeddedModule;
pub use marshal::{NativeKind, NativeValue, ReturnKind, Signature};
pub use module::InvokableModule;
pub use registry::{HandleState, LoadState, PluginHandle, PluginRegistry, PluginSlot};
