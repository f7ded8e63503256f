//==================================================
// File: builtins.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script-visible surface of the native bridge
// Objective: Build the Net::HTTP namespace, `import`, and `Plugin#send` once at
//            VM initialisation instead of through process-wide class state
//==================================================

use std::collections::HashMap;

use crate::context::BridgeContext;
use crate::error::{BridgeResult, argument_count, wrong_argument_type};
use crate::http;
use crate::plugin;
use crate::value::ScriptValue;

pub type BuiltinFn = fn(&mut BridgeContext, &[ScriptValue]) -> BridgeResult<ScriptValue>;
pub type MethodFn =
    fn(&mut BridgeContext, &ScriptValue, &[ScriptValue]) -> BridgeResult<ScriptValue>;

pub const NET: &str = "Net";
pub const HTTP_CLASS: &str = "Net::HTTP";
pub const REQUEST_CLASS: &str = "Net::HTTP::Request";
pub const RESPONSE_CLASS: &str = "Net::HTTP::Response";

//==================================================
// Section 1.0 - Registry
//==================================================
// @ZNOTE[Bridge]: Request and Response are registered as constants with no
// builtin methods yet; script libraries extend them.

#[derive(Debug, Clone, Default)]
pub struct Builtins {
    classes: Vec<String>,
    functions: HashMap<String, BuiltinFn>,
    methods: HashMap<String, MethodFn>,
}

impl Builtins {
    pub fn with_defaults() -> Self {
        let mut builtins = Self::default();
        builtins.register_class(NET);
        builtins.register_class(HTTP_CLASS);
        builtins.register_class(REQUEST_CLASS);
        builtins.register_class(RESPONSE_CLASS);
        builtins.register_class_method(HTTP_CLASS, "get", builtin_http_get);
        builtins.register_class_method(HTTP_CLASS, "post", builtin_http_post);
        builtins.register_function("import", builtin_import);
        builtins.register_method("Plugin", "send", builtin_plugin_send);
        builtins
    }

    pub fn register_class(&mut self, path: &str) {
        if !self.classes.iter().any(|name| name == path) {
            self.classes.push(path.to_string());
        }
    }

    pub fn register_function(&mut self, name: &str, func: BuiltinFn) {
        self.functions.insert(name.to_string(), func);
    }

    pub fn register_class_method(&mut self, class: &str, name: &str, func: BuiltinFn) {
        self.register_class(class);
        self.functions.insert(class_method_key(class, name), func);
    }

    pub fn register_method(&mut self, receiver: &str, name: &str, func: MethodFn) {
        self.methods.insert(format!("{receiver}#{name}"), func);
    }

    pub fn class_names(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, path: &str) -> bool {
        self.classes.iter().any(|name| name == path)
    }

    pub fn lookup_function(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).copied()
    }

    pub fn lookup_class_method(&self, class: &str, name: &str) -> Option<BuiltinFn> {
        self.functions.get(&class_method_key(class, name)).copied()
    }

    pub fn lookup_method(&self, receiver: &str, name: &str) -> Option<MethodFn> {
        self.methods.get(&format!("{receiver}#{name}")).copied()
    }
}

fn class_method_key(class: &str, name: &str) -> String {
    format!("{class}.{name}")
}

//==================================================
// Section 2.0 - Builtin bodies
//==================================================

fn builtin_http_get(ctx: &mut BridgeContext, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    http::get(ctx.transport(), args)
}

fn builtin_http_post(ctx: &mut BridgeContext, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    http::post(ctx.transport(), args)
}

fn builtin_import(ctx: &mut BridgeContext, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    if args.len() != 1 {
        return Err(argument_count("1", args.len()));
    }
    let specifier = args[0]
        .as_str()
        .ok_or_else(|| wrong_argument_type("String", &args[0]))?;
    let handle = ctx.plugins_mut().import(specifier);
    Ok(ScriptValue::Plugin(handle))
}

fn builtin_plugin_send(
    ctx: &mut BridgeContext,
    receiver: &ScriptValue,
    args: &[ScriptValue],
) -> BridgeResult<ScriptValue> {
    let handle = receiver
        .as_plugin()
        .ok_or_else(|| wrong_argument_type("Plugin", receiver))?;
    let Some((symbol, rest)) = args.split_first() else {
        return Err(argument_count("at least 1", 0));
    };
    let symbol = symbol
        .as_str()
        .ok_or_else(|| wrong_argument_type("String", symbol))?;
    plugin::send(ctx.plugins(), handle, symbol, rest)
}
