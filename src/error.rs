//! Error types for the breadboard engine.
//!
//! [`BreadboardError`] covers everything that can go wrong while reading a
//! bench description or editing a board. [`WiringFault`] is the separate,
//! recoverable signal the solver raises for invalid user wiring; `settle`
//! never fails with it, it rolls back and reports it instead.

use thiserror::Error;

use crate::circuit::{ElementId, ElementKind, PathId, TerminalSide};

/// Result type alias using [`BreadboardError`].
pub type Result<T> = std::result::Result<T, BreadboardError>;

/// Unified error type for all breadboard operations.
#[derive(Error, Debug)]
pub enum BreadboardError {
    // ============ Description Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Unknown element keyword
    #[error("Unknown element type '{element_type}' at line {line}")]
    UnknownElementType { element_type: String, line: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for element '{element}': {message}")]
    InvalidParameter {
        element: String,
        param: String,
        message: String,
    },

    /// Duplicate element name
    #[error("Duplicate element name '{name}'")]
    DuplicateElement { name: String },

    /// Wire refers to an element that was never declared
    #[error("Wire at line {line} refers to undeclared element '{name}'")]
    UndeclaredElement { name: String, line: usize },

    // ============ Board Editing Errors ============
    /// No element with this id on the board
    #[error("Element {id} not found on the board")]
    ElementNotFound { id: ElementId },

    /// Operation does not apply to this kind of element
    #[error("Element {id} is a {kind}, expected {expected}")]
    WrongElementKind {
        id: ElementId,
        kind: ElementKind,
        expected: &'static str,
    },

    /// A wire needs two distinct component terminals
    #[error("A wire cannot start and end on element {id}")]
    DegenerateWire { id: ElementId },

    // ============ Settling Errors ============
    /// Invalid wiring surfaced as an error (see [`crate::Settlement::into_result`])
    #[error("Invalid wiring: {0}")]
    InvalidWiring(#[from] WiringFault),

    // ============ I/O Errors ============
    /// Error reading a bench description file
    #[error("Failed to read bench file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a report
    #[error("Report output error: {message}")]
    OutputError { message: String },

    /// Snapshot (de)serialization failure
    #[cfg(any(feature = "cli", feature = "wasm"))]
    #[error("Snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}

impl BreadboardError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        element: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            element: element.into(),
            param: param.into(),
            message: message.into(),
        }
    }
}

/// Invalid user wiring detected while settling.
///
/// Every variant is recovered by rolling back the most recently added
/// connection; hosts receive it to show a message to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WiringFault {
    /// Two active neighbours of one component disagree on polarity
    #[error("{kind} {element} joins a '+' node to a '-' node")]
    ConflictingPolarity { element: ElementId, kind: ElementKind },

    /// Both terminals of one battery reach the same node
    #[error("battery {battery} is shorted through path {path}")]
    ShortCircuit { battery: ElementId, path: PathId },

    /// More wires on a terminal than the component allows
    #[error("{side} terminal of {kind} {element} has {count} wires (at most {limit})")]
    OverConnected {
        element: ElementId,
        kind: ElementKind,
        side: TerminalSide,
        count: usize,
        limit: usize,
    },

    /// One wire joins both terminals of the same component
    #[error("path {path} joins both terminals of {kind} {element}")]
    SelfLoop {
        element: ElementId,
        kind: ElementKind,
        path: PathId,
    },

    /// The relaxation did not reach a fixed point
    #[error("circuit did not settle after {iterations} passes")]
    NonConvergence { iterations: usize },
}
