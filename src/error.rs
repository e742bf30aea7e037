use std::fmt;

use thiserror::Error;

/// Broad classification of a runtime failure.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Operand kind mismatch, or the wrong number or shape of arguments.
    Type,

    /// A missing property, variable or passage.
    Reference,

    /// Index out of bounds, division by zero, or a malformed number.
    Range,

    /// Malformed code, such as a bad lambda clause.
    Syntax,

    /// An illegal mutation.
    Operation,
}

/// A computation that failed. These travel through the runtime as ordinary
/// values (see `Value::Error`) and are only surfaced by whatever renders them.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{kind} error: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,

    pub message: String,

    /// Extra hint shown below the message, if any.
    pub explanation: Option<String>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            ErrorKind::Type => "type",
            ErrorKind::Reference => "reference",
            ErrorKind::Range => "range",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Operation => "operation",
        })
    }
}

/// Return early with a `ScriptError` of the given kind, like `anyhow::bail!`.
macro_rules! fail {
    ($kind:ident, $($arg:tt)*) => {
        return Err($crate::error::ScriptError::new(
            $crate::error::ErrorKind::$kind,
            format!($($arg)*),
        ))
    };
}

pub(crate) use fail;

#[test]
fn error_display() {
    let err = ScriptError::new(ErrorKind::Range, "There's no 4th position.");
    assert_eq!(err.to_string(), "range error: There's no 4th position.");
}
