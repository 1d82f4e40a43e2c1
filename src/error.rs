//! Engine error taxonomy
//!
//! Every fallible operation in the crate returns [`EngineError`]. Player
//! mistakes (`InvalidOperation`) are recoverable and are reported back to the
//! UI as rejected moves; bad static data (`MalformedLevel`) blocks a level
//! from starting. `DivisionByZero` and `IndexOutOfRange` are contract
//! violations inside the engine.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("malformed level: {0}")]
    MalformedLevel(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index ({row}, {col}) out of range for a {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("cannot parse '{0}' as a fraction")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        EngineError::MalformedLevel(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidOperation(msg.into())
    }

    /// Whether the error is a player-facing rejection rather than a bug or bad data
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InvalidOperation(_))
    }
}

impl From<EngineError> for JsValue {
    fn from(err: EngineError) -> JsValue {
        js_sys::Error::new(&err.to_string()).into()
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
