//==================================================
// File: context.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Explicit bridge context created at VM initialisation
// Objective: Own the builtin registry, HTTP transport and plugin handles and
//            turn every bridge failure into a script error value
//==================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::builtins::Builtins;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::http::{HttpTransport, UreqTransport};
use crate::plugin::{EmbeddedModule, PluginRegistry};
use crate::value::ScriptValue;

pub struct BridgeContext {
    config: BridgeConfig,
    builtins: Arc<Builtins>,
    transport: Arc<dyn HttpTransport>,
    plugins: PluginRegistry,
}

impl BridgeContext {
    pub fn new(config: BridgeConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(&config.http));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: BridgeConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let plugins = PluginRegistry::new(&config.plugins);
        Self {
            config,
            builtins: Arc::new(Builtins::with_defaults()),
            transport,
            plugins,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    pub fn register_embedded(&mut self, module: EmbeddedModule) {
        self.plugins.register_embedded(module);
    }

    /// Call a global builtin such as `import`.
    pub fn call_function(&mut self, name: &str, args: &[ScriptValue]) -> ScriptValue {
        let result = match self.builtins.lookup_function(name) {
            Some(func) => func(self, args),
            None => Err(BridgeError::UnknownBuiltin(name.to_string())),
        };
        settle(name, result)
    }

    /// Call a class method such as `Net::HTTP.get`.
    pub fn call_class_method(
        &mut self,
        class: &str,
        name: &str,
        args: &[ScriptValue],
    ) -> ScriptValue {
        let result = match self.builtins.lookup_class_method(class, name) {
            Some(func) => func(self, args),
            None => Err(BridgeError::UnknownBuiltin(format!("{class}.{name}"))),
        };
        settle(name, result)
    }

    /// Call an instance method such as `Plugin#send`.
    pub fn call_method(
        &mut self,
        receiver: &ScriptValue,
        name: &str,
        args: &[ScriptValue],
    ) -> ScriptValue {
        let result = match self.builtins.lookup_method(receiver.type_name(), name) {
            Some(func) => func(self, receiver, args),
            None => Err(BridgeError::UnknownBuiltin(format!(
                "{}#{name}",
                receiver.type_name()
            ))),
        };
        settle(name, result)
    }

    /// Release the handle wrapped by a plugin object.
    pub fn release(&mut self, value: &ScriptValue) -> bool {
        value
            .as_plugin()
            .is_some_and(|handle| self.plugins.release(handle))
    }
}

fn settle(name: &str, result: BridgeResult<ScriptValue>) -> ScriptValue {
    match result {
        Ok(value) => value,
        Err(err) => {
            debug!(builtin = name, kind = %err.kind(), error = %err, "bridge call failed");
            err.into()
        }
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("config", &self.config)
            .field("builtins", &self.builtins)
            .field("plugins", &self.plugins)
            .finish()
    }
}
