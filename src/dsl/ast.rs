//! Abstract Syntax Tree types for bench descriptions.

use std::collections::HashMap;

use crate::circuit::{Position, TerminalSide};
use crate::components::ElementKind;

/// Complete AST representation of a parsed bench.
#[derive(Debug, Clone, Default)]
pub struct BenchAst {
    /// Element declarations in source order
    pub elements: Vec<ElementDef>,
    /// Wires in source order
    pub wires: Vec<WireDef>,
}

impl BenchAst {
    /// Create a new empty bench AST.
    pub fn new() -> Self {
        Self::default()
    }
}

/// An element declaration.
#[derive(Debug, Clone)]
pub struct ElementDef {
    pub kind: ElementKind,
    /// Unique element name
    pub name: String,
    /// Primary value (volts, ohms, farads)
    pub value: Option<f64>,
    /// Named parameters (`x`, `y`, `state`)
    pub params: HashMap<String, f64>,
    /// Source line number for error reporting
    pub line: usize,
}

impl ElementDef {
    /// Canvas position from the `x`/`y` parameters.
    pub fn position(&self) -> Position {
        Position::new(
            self.params.get("x").copied().unwrap_or(0.0),
            self.params.get("y").copied().unwrap_or(0.0),
        )
    }
}

/// One end of a wire: `NAME.left` or `NAME.right`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRef {
    pub element: String,
    pub side: TerminalSide,
}

/// A wire from one terminal, through optional bends, to another.
#[derive(Debug, Clone)]
pub struct WireDef {
    pub from: TerminalRef,
    pub waypoints: Vec<Position>,
    pub to: TerminalRef,
    pub line: usize,
}
