//! Bench description language.
//!
//! A small line-oriented text format for describing a breadboard: one
//! element or wire per line. Used by the CLI and handy in tests.
//!
//! # Grammar Overview
//!
//! ```text
//! bench      = { line }
//! line       = comment | element | wire | empty
//! comment    = ('#' | ';') { any_char }
//! element    = kind name [value] { state | param }
//! wire       = "WIRE" terminal { waypoint } terminal
//!
//! kind       = "BAT" | "SW" | "RES" | "POT" | "LED" | "CAP" | "DIODE" | "VM" | "AM"
//! state      = "closed" | "open" | "on" | "off"
//! param      = identifier '=' number
//! terminal   = name '.' ("left" | "right")
//! waypoint   = '(' number [','] number ')'
//!
//! number     = ['-'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+] [multiplier] [unit]
//! multiplier = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! unit       = 'V' | 'A' | 'F' | 'R' | 'Ω'
//! ```
//!
//! # Element Types
//!
//! | Kind | Description | Value | Default |
//! |------|-------------|-------|---------|
//! | BAT | Battery | volts | 9 V |
//! | SW | Switch | - | open |
//! | RES | Resistor | ohms | 220 Ω |
//! | POT | Potentiometer | ohms (0 to 10k) | 220 Ω |
//! | LED | LED | series ohms | 20 Ω |
//! | CAP | Capacitor | farads | 1 µF |
//! | DIODE | Diode | series ohms | 0 Ω |
//! | VM | Voltmeter | - | - |
//! | AM | Ammeter | - | - |
//!
//! A battery's right terminal is positive. The right terminal of an LED
//! or diode is the anode.
//!
//! # Example
//!
//! ```text
//! # LED with current-limiting resistor
//! BAT  B1  9V
//! RES  R1  220
//! LED  L1
//!
//! WIRE B1.right R1.left
//! WIRE R1.right L1.right
//! WIRE L1.left (0 120) B1.left
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a bench description string into an AST.
pub fn parse(input: &str) -> Result<BenchAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    parser.parse()
}

/// Parse a bench description file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<BenchAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::BreadboardError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
