//! Centralised error hierarchy for **kvexpr**.
//!
//! Three channels are kept apart:
//!
//! * [`SyntaxError`] records are *accumulated* by the parser and never thrown.
//! * [`EvalError`] is the thrown evaluation failure (contract violations such
//!   as calling a non-callable or reading a member of `null`).
//! * First-class error *values* live in [`crate::value::ErrorValue`]; they
//!   flow as data and are not represented here.
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

/// One independent parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    /// Byte offset of the failure point.
    pub position: usize,

    /// Length in bytes of the offending text (may be zero).
    pub length: usize,

    /// Human-readable description.
    pub message: String,
}

impl SyntaxError {
    /// Helper constructor for the **parser**.
    pub fn new<S: Into<String>>(position: usize, length: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating syntax error: position={}, length={}, msg={}",
            position, length, message
        );

        SyntaxError {
            position,
            length,
            message,
        }
    }

    /// Error for a missing closing delimiter or keyword at `position`.
    pub fn expected(position: usize, what: &str) -> Self {
        Self::new(position, 0, format!("{} expected", what))
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[offset {}] Error: {}", self.position, self.message)
    }
}

/// Thrown evaluation failure.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    /// A reference did not resolve anywhere along the provider chain.
    #[error("'{name}' is not defined")]
    Undefined { name: String },

    /// A field needed its own value and no outer scope could supply it.
    #[error("circular reference while evaluating '{name}'")]
    CircularReference { name: String },

    /// Argument count outside the callable's declared bounds.
    #[error(
        "'{function}' expects {} parameter(s), got {actual}",
        expected_count(.min, .max)
    )]
    ParameterCountMismatch {
        function: String,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },

    /// The callee of a call expression is not a function, list or KVC.
    #[error("value of type {0} is not callable")]
    NotCallable(String),

    /// `.` applied to `null`.
    #[error("cannot read member '{member}' of null")]
    MemberOfNull { member: String },

    /// A host boundary or serializer received a value it cannot handle.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Invariant breach inside the evaluator.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Helper constructor for arity failures.
    pub fn parameter_count<S: Into<String>>(
        function: S,
        min: usize,
        max: Option<usize>,
        actual: usize,
    ) -> Self {
        let function: String = function.into();

        info!(
            "Creating ParameterCountMismatch: function={}, min={}, max={:?}, actual={}",
            function, min, max, actual
        );

        EvalError::ParameterCountMismatch {
            function,
            min,
            max,
            actual,
        }
    }

    /// Helper constructor for host/serializer type failures.
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating TypeMismatch error: {}", message);

        EvalError::TypeMismatch(message)
    }
}

fn expected_count(min: &usize, max: &Option<usize>) -> String {
    match *max {
        Some(max) if max == *min => min.to_string(),
        Some(max) => format!("{}..{}", min, max),
        None => format!("at least {}", min),
    }
}

/// Umbrella error for the "parse then evaluate" facade and the CLI.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source did not parse; nothing was evaluated.
    #[error("{} syntax error(s), first: {}", .0.len(), first_message(.0))]
    Syntax(Vec<SyntaxError>),

    /// The parser stopped before the end of the input.
    #[error("unexpected input at offset {0}")]
    TrailingInput(usize),

    /// Evaluation threw.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Wrapper around `std::io::Error` (transparent).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// JSON text could not be read or written.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn first_message(errors: &[SyntaxError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_default()
}

/// Crate-wide evaluation `Result` alias.
pub type Result<T> = std::result::Result<T, EvalError>;
