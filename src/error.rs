//==================================================
// File: error.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host-side failure taxonomy for the native bridge
// Objective: Map every transport, loader and invocation failure onto a
//            recoverable script error object
//==================================================

use thiserror::Error;

use crate::value::{ErrorKind, ErrorObject, ScriptValue};

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("{0}")]
    Argument(String),
    #[error("{0}")]
    Transport(String),
    #[error("failed to read response body: {0}")]
    BodyRead(String),
    #[error("undefined symbol '{symbol}' for plugin '{specifier}'")]
    UndefinedSymbol { symbol: String, specifier: String },
    #[error("{0}")]
    TypeMismatch(String),
    #[error("failed to load plugin '{specifier}': {reason}")]
    Load { specifier: String, reason: String },
    #[error("native symbol '{symbol}' faulted: {message}")]
    NativeFault { symbol: String, message: String },
    #[error("unknown plugin handle {0}")]
    UnknownHandle(String),
    #[error("undefined method '{0}'")]
    UnknownBuiltin(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Argument(_) => ErrorKind::ArgumentError,
            BridgeError::Transport(_)
            | BridgeError::BodyRead(_)
            | BridgeError::NativeFault { .. }
            | BridgeError::UnknownHandle(_) => ErrorKind::InternalError,
            BridgeError::UndefinedSymbol { .. } | BridgeError::UnknownBuiltin(_) => {
                ErrorKind::NameError
            }
            BridgeError::TypeMismatch(_) => ErrorKind::TypeMismatchError,
            BridgeError::Load { .. } => ErrorKind::LoadError,
        }
    }
}

/// Builds the `ArgumentError` raised when a builtin receives the wrong number of arguments.
pub fn argument_count(expected: &str, got: usize) -> BridgeError {
    BridgeError::Argument(format!("Expect {expected} arguments. got={got}"))
}

/// Builds the `TypeMismatchError` raised when an argument is not the expected script type.
pub fn wrong_argument_type(expected: &str, got: &ScriptValue) -> BridgeError {
    BridgeError::TypeMismatch(format!(
        "Expect argument to be {expected}. got={}",
        got.type_name()
    ))
}

impl From<BridgeError> for ErrorObject {
    fn from(value: BridgeError) -> Self {
        ErrorObject::new(value.kind(), value.to_string())
    }
}

impl From<BridgeError> for ScriptValue {
    fn from(value: BridgeError) -> Self {
        ScriptValue::Error(value.into())
    }
}
