//! Centralised error hierarchy for the **Monkey interpreter**.
//!
//! Two families live here:
//!
//! * [`MonkeyError`] covers the front end (scanner, parser) and host I/O.
//!   Every fallible front‑end API returns the crate‑wide [`Result`] alias.
//! * [`RuntimeError`] is the typed form of a failed evaluation.  It never
//!   escapes to the host as a Rust error: the evaluator turns it into an
//!   `Object::Error` value at the program boundary.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

use crate::object::ObjectType;

/// Canonical front‑end error type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MonkeyError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting a source file.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl MonkeyError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        MonkeyError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        MonkeyError::Parse { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, MonkeyError>;

/// Every way evaluating a program can fail.
///
/// The `Display` text is exactly the message an `Object::Error` carries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },

    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: &'static str,
        right: ObjectType,
    },

    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },

    #[error("not a function: {0}")]
    NotAFunction(ObjectType),

    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },

    /// `len` style: the builtin accepts several types, none matched.
    #[error("argument to `{builtin}` not supported, got {got}")]
    UnsupportedArgument {
        builtin: &'static str,
        got: ObjectType,
    },

    /// Single‑argument builtin received the wrong type.
    #[error("argument to `{builtin}` must be {expected}, got {got}")]
    ArgumentType {
        builtin: &'static str,
        expected: ObjectType,
        got: ObjectType,
    },

    /// Multi‑argument builtin received the wrong type at `position`.
    #[error("{position} argument to `{builtin}` must be {expected}, got {got}")]
    PositionalArgumentType {
        position: &'static str,
        builtin: &'static str,
        expected: ObjectType,
        got: ObjectType,
    },

    #[error("`reduce` callback must return INTEGER, got {0}")]
    ReduceAccumulator(ObjectType),

    #[error("index operator not supported: {left}[{index}]")]
    IndexNotSupported { left: ObjectType, index: ObjectType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow: {left} {operator} {right}")]
    IntegerOverflow {
        left: i64,
        operator: &'static str,
        right: i64,
    },

    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    /// `puts` could not write to the evaluator's output.
    #[error("failed to write output: {0}")]
    Output(String),
}
