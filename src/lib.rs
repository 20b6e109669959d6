//! # Breadboard Core
//!
//! Circuit state propagation for an educational DC breadboard.
//!
//! This library provides:
//! - A topology model of placed elements and the wires between them
//! - A fixed-point propagation engine that resolves every node's voltage,
//!   polarity and series resistance from the batteries outward
//! - Local rules for switches, resistors, potentiometers, LEDs, diodes,
//!   capacitors, voltmeters and ammeters
//! - Recovery from invalid wiring by undoing the newest connection
//! - A small text format for describing benches
//!
//! ## Architecture
//!
//! - [`circuit`] - Points, connections, elements and topology queries
//! - [`components`] - Per-element state and transfer rules
//! - [`solver`] - Path table, relaxation loop and settling
//! - [`workbench`] - Deferred, supersedable settling for interactive hosts
//! - [`dsl`] - Parser for the bench description language
//! - [`report`] - Text and JSON output (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! breadboard lamp.bench --toggle S1
//! ```
//!
//! ### Library
//!
//! ```ignore
//! let bench = Breadboard::from_ast(dsl::parse(source)?)?;
//! let settlement = settle(&bench.board.elements, &bench.board.connections);
//! for element in &settlement.elements {
//!     println!("{} {}", element.kind(), element.is_on());
//! }
//! ```
//!
//! ## Propagation Model
//!
//! There is no nodal analysis. Each battery stamps its terminals (`+` on the
//! right, `-` on the left) and every other element copies state from a
//! powered neighbour to an unpowered one, adding its own resistance along
//! the way. Passes repeat until nothing changes; LED brightness and meter
//! readings are computed from the resulting per-node state.

pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod solver;
pub mod workbench;

#[cfg(feature = "cli")]
pub mod report;

// Re-export main types for convenience
pub use circuit::{Breadboard, Connection, Element, Point};
pub use error::{BreadboardError, Result, WiringFault};
pub use solver::{settle, Rollback, SettleConfig, Settlement, Settler, DEFAULT_MAX_ITERATIONS};
pub use workbench::Workbench;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmBreadboard;
