//==================================================
// File: value.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script values exchanged across the native bridge
// Objective: Model the tagged values and error objects the VM hands to and
//            receives from the HTTP adapter and plugin bridge
//==================================================

use std::fmt;

use crate::plugin::PluginHandle;

//==================================================
// Section 1.0 - Error objects
//==================================================

/// Error classes the bridge raises into script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArgumentError,
    InternalError,
    NameError,
    TypeMismatchError,
    LoadError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::NameError => "NameError",
            ErrorKind::TypeMismatchError => "TypeMismatchError",
            ErrorKind::LoadError => "LoadError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable error value scripts can inspect and branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorObject {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

//==================================================
// Section 2.0 - Script values
//==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Unit,
    String(String),
    Error(ErrorObject),
    Plugin(PluginHandle),
}

impl ScriptValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Unit => "Null",
            ScriptValue::String(_) => "String",
            ScriptValue::Error(_) => "Error",
            ScriptValue::Plugin(_) => "Plugin",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ScriptValue::Error(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorObject> {
        match self {
            ScriptValue::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_plugin(&self) -> Option<PluginHandle> {
        match self {
            ScriptValue::Plugin(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl From<ErrorObject> for ScriptValue {
    fn from(value: ErrorObject) -> Self {
        ScriptValue::Error(value)
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Unit => Ok(()),
            ScriptValue::String(text) => f.write_str(text),
            ScriptValue::Error(error) => write!(f, "{error}"),
            ScriptValue::Plugin(handle) => write!(f, "#<Plugin {handle}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_object_renders_kind_and_message() {
        let err = ErrorObject::new(ErrorKind::ArgumentError, "Expect 3 arguments. got=2");
        assert_eq!(err.to_string(), "ArgumentError: Expect 3 arguments. got=2");
    }

    #[test]
    fn string_accessors() {
        let value = ScriptValue::from("Bar");
        assert_eq!(value.as_str(), Some("Bar"));
        assert!(!value.is_error());
        assert_eq!(value.type_name(), "String");
        assert_eq!(ScriptValue::Unit.as_str(), None);
    }
}
