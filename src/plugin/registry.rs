//==================================================
// File: plugin/registry.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Plugin handle table
// Objective: Own loaded-module state behind opaque arena handles so script
//            values never carry raw symbol pointers
//==================================================

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::PluginConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::value::ErrorObject;

use super::arena::{Arena, ArenaHandle};
use super::embedded::EmbeddedModule;
use super::loader;
use super::module::InvokableModule;

//==================================================
// Section 1.0 - Handle state
//==================================================
// @ZNOTE[Plugins]: A slot is only created once resolution has finished, so the
// transient unloaded phase is never observable. Loaded and Failed are terminal.

pub type PluginHandle = ArenaHandle<PluginSlot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    Failed,
}

pub enum HandleState {
    Loaded(Arc<dyn InvokableModule>),
    Failed(BridgeError),
}

pub struct PluginSlot {
    specifier: String,
    state: HandleState,
    gate: Option<Mutex<()>>,
}

impl PluginSlot {
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    pub fn state(&self) -> &HandleState {
        &self.state
    }

    pub(crate) fn gate(&self) -> Option<&Mutex<()>> {
        self.gate.as_ref()
    }
}

impl fmt::Debug for PluginSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            HandleState::Loaded(_) => "Loaded",
            HandleState::Failed(_) => "Failed",
        };
        f.debug_struct("PluginSlot")
            .field("specifier", &self.specifier)
            .field("state", &state)
            .finish()
    }
}

//==================================================
// Section 2.0 - Registry
//==================================================

#[derive(Default)]
pub struct PluginRegistry {
    slots: Arena<PluginSlot>,
    embedded: HashMap<String, Arc<dyn InvokableModule>>,
    search_paths: Vec<PathBuf>,
    serialize_calls: bool,
}

impl PluginRegistry {
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            slots: Arena::new(),
            embedded: HashMap::new(),
            search_paths: config.search_paths.clone(),
            serialize_calls: config.serialize_calls,
        }
    }

    /// Make `module` importable by its name. Embedded names win over filesystem paths.
    pub fn register_embedded(&mut self, module: EmbeddedModule) {
        let name = module.name().to_string();
        self.embedded.insert(name, Arc::new(module));
    }

    /// Resolve `specifier` into a new, independent handle.
    ///
    /// Never fails: a resolution error is stored in a `Failed` handle and
    /// replayed by every later `send`.
    pub fn import(&mut self, specifier: &str) -> PluginHandle {
        let loaded = match self.embedded.get(specifier) {
            Some(module) => Ok(module.clone()),
            None => loader::load_native(specifier, &self.search_paths),
        };
        let state = match loaded {
            Ok(module) => {
                info!(specifier, "plugin imported");
                HandleState::Loaded(module)
            }
            Err(err) => {
                warn!(specifier, error = %err, "plugin import failed");
                HandleState::Failed(err)
            }
        };
        self.slots.allocate(PluginSlot {
            specifier: specifier.to_string(),
            state,
            gate: self.serialize_calls.then(|| Mutex::new(())),
        })
    }

    pub fn state(&self, handle: PluginHandle) -> Option<LoadState> {
        self.slots.get(handle).map(|slot| match slot.state {
            HandleState::Loaded(_) => LoadState::Loaded,
            HandleState::Failed(_) => LoadState::Failed,
        })
    }

    /// The `LoadError` stored on a failed handle.
    pub fn load_error(&self, handle: PluginHandle) -> Option<ErrorObject> {
        match &self.slots.get(handle)?.state {
            HandleState::Failed(err) => Some(err.clone().into()),
            HandleState::Loaded(_) => None,
        }
    }

    pub fn specifier(&self, handle: PluginHandle) -> Option<&str> {
        self.slots.get(handle).map(PluginSlot::specifier)
    }

    /// Exported symbol names of a loaded handle.
    pub fn symbols(&self, handle: PluginHandle) -> BridgeResult<Vec<String>> {
        match &self.slot(handle)?.state {
            HandleState::Loaded(module) => Ok(module.symbols()),
            HandleState::Failed(err) => Err(err.clone()),
        }
    }

    /// Drop the slot behind `handle`; the module unloads once nothing else references it.
    pub fn release(&mut self, handle: PluginHandle) -> bool {
        self.slots.remove(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn slot(&self, handle: PluginHandle) -> BridgeResult<&PluginSlot> {
        self.slots
            .get(handle)
            .ok_or_else(|| BridgeError::UnknownHandle(handle.to_string()))
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut embedded: Vec<&String> = self.embedded.keys().collect();
        embedded.sort();
        f.debug_struct("PluginRegistry")
            .field("handles", &self.slots.len())
            .field("embedded", &embedded)
            .field("search_paths", &self.search_paths)
            .field("serialize_calls", &self.serialize_calls)
            .finish()
    }
}
