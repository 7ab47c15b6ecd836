//! Error types for the runtime

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::value::Value;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Stack frame for error traces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        match &self.location {
            Some(loc) => write!(f, "    at {} ({})", name, loc),
            None => write!(f, "    at {}", name),
        }
    }
}

/// The native error constructors an error raised by the runtime maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    EvalError,
    URIError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ECMAScript exception together with the diagnostics attached when it
/// first became abrupt.
#[derive(Debug, Clone)]
pub struct Exception {
    pub value: Value,
    /// One-line rendering, e.g. `TypeError: x is not a function`.
    pub summary: String,
    pub location: Option<SourceLocation>,
    pub stack: Vec<StackFrame>,
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uncaught {}", self.summary)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        for frame in &self.stack {
            write!(f, "\n{}", frame)?;
        }
        Ok(())
    }
}

/// Main error type for the runtime
#[derive(Debug, Error)]
pub enum JsError {
    /// A value thrown by script (or a materialized native error) that no
    /// handler caught.
    #[error("{0}")]
    Thrown(Box<Exception>),

    /// An ECMAScript error raised by the runtime itself. It is materialized
    /// into an error object of the current realm as soon as script can
    /// observe it.
    #[error("{kind}: {message}")]
    Native { kind: ErrorKind, message: String },

    /// Early error reported by the front end.
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("Execution timeout: exceeded {timeout_ms}ms (ran {elapsed_ms}ms)")]
    Timeout { timeout_ms: u64, elapsed_ms: u64 },

    #[error("Execution step limit of {limit} exceeded")]
    StepLimit { limit: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    /// Internal marker: a generator was resumed with a return completion at a
    /// `yield`. Unwinds like `return` and never escapes a function body.
    #[doc(hidden)]
    #[error("GeneratorReturn")]
    GeneratorReturn(Value),

    /// Internal marker for optional chain short-circuit (not a real error).
    /// `a?.b.c` with nullish `a` unwinds to the enclosing chain.
    #[doc(hidden)]
    #[error("OptionalChainShortCircuit")]
    OptionalChainShortCircuit,
}

/// Result alias used by every fallible runtime operation.
pub type JsResult<T> = Result<T, JsError>;

impl JsError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation {
                file: None,
                line,
                column,
            },
        }
    }

    pub fn native(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsError::Native {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::native(ErrorKind::TypeError, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::native(ErrorKind::RangeError, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::native(ErrorKind::ReferenceError, message)
    }

    /// `x is not defined`
    pub fn not_defined(name: impl fmt::Display) -> Self {
        Self::reference_error(format!("{} is not defined", name))
    }

    /// A catchable SyntaxError raised at run time (e.g. by `JSON.parse`).
    pub fn runtime_syntax_error(message: impl Into<String>) -> Self {
        Self::native(ErrorKind::SyntaxError, message)
    }

    /// Create an internal error for unexpected runtime states.
    /// These should never happen in correctly-written code.
    pub fn internal(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn thrown(value: Value) -> Self {
        JsError::Thrown(Box::new(Exception {
            value,
            summary: String::new(),
            location: None,
            stack: Vec::new(),
        }))
    }

    /// Whether `try/catch`, iterator cleanup and promise rejection may observe
    /// this error. Budget violations and internal failures unwind everything.
    pub fn is_catchable(&self) -> bool {
        matches!(self, JsError::Thrown(_) | JsError::Native { .. })
    }

    /// Fatal conditions terminate the whole evaluation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            JsError::Timeout { .. } | JsError::StepLimit { .. } | JsError::Internal(_)
        )
    }

    /// The thrown value, when this is an uncaught exception.
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            JsError::Thrown(exception) => Some(&exception.value),
            _ => None,
        }
    }

    pub fn exception(&self) -> Option<&Exception> {
        match self {
            JsError::Thrown(exception) => Some(exception),
            _ => None,
        }
    }

    /// Structured report suitable for a driver.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            JsError::Thrown(exception) => Diagnostic {
                kind: DiagnosticKind::Uncaught,
                message: exception.summary.clone(),
                location: exception.location.clone(),
                stack: exception.stack.clone(),
            },
            JsError::SyntaxError { message, location } => Diagnostic {
                kind: DiagnosticKind::Syntax,
                message: message.clone(),
                location: Some(location.clone()),
                stack: Vec::new(),
            },
            JsError::Timeout { .. } | JsError::StepLimit { .. } => Diagnostic {
                kind: DiagnosticKind::Terminated,
                message: self.to_string(),
                location: None,
                stack: Vec::new(),
            },
            JsError::Native { .. } => Diagnostic {
                kind: DiagnosticKind::Uncaught,
                message: self.to_string(),
                location: None,
                stack: Vec::new(),
            },
            JsError::Internal(_)
            | JsError::GeneratorReturn(_)
            | JsError::OptionalChainShortCircuit => Diagnostic {
                kind: DiagnosticKind::Internal,
                message: self.to_string(),
                location: None,
                stack: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Uncaught,
    Syntax,
    Terminated,
    Internal,
}

/// Driver-facing rendering of a [`JsError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stack: Vec<StackFrame>,
}
