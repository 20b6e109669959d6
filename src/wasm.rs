//! WASM bindings for Breadboard Core.
//!
//! Elements and connections cross the boundary as two JSON arrays in the
//! same shape the engine serializes them.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmBreadboard } from 'breadboard_core';
//!
//! await init();
//!
//! const bench = new WasmBreadboard();
//! bench.load(JSON.stringify(elements), JSON.stringify(connections));
//!
//! // From the UI's idle callback:
//! const settled = bench.idle();
//! if (settled) {
//!   const { elements, connections, rollbacks } = JSON.parse(settled);
//! }
//! ```

use wasm_bindgen::prelude::*;

use serde::Serialize;

use crate::circuit::{Breadboard, Connection, Element};
use crate::dsl;
use crate::solver::{Rollback, SettleConfig, Settler};
use crate::workbench::Workbench;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Build a board from the host's element and connection arrays.
fn parse_snapshot(elements_json: &str, connections_json: &str) -> crate::Result<Breadboard> {
    let elements: Vec<Element> = serde_json::from_str(elements_json)?;
    let connections: Vec<Connection> = serde_json::from_str(connections_json)?;
    Ok(Breadboard::from_parts(elements, connections))
}

/// What the host gets back after a settle.
#[derive(Serialize)]
struct Settled<'a> {
    elements: &'a [Element],
    connections: &'a [Connection],
    rollbacks: &'a [Rollback],
}

fn settled_json(board: &Breadboard, rollbacks: &[Rollback]) -> crate::Result<String> {
    Ok(serde_json::to_string(&Settled {
        elements: &board.elements,
        connections: &board.connections,
        rollbacks,
    })?)
}

/// WASM-compatible breadboard.
///
/// Wraps a [`Workbench`]: edits arrive as whole snapshots, settling happens
/// when the host calls `idle`.
#[wasm_bindgen]
pub struct WasmBreadboard {
    workbench: Workbench,
    rollback_messages: Vec<String>,
}

#[wasm_bindgen]
impl WasmBreadboard {
    /// Create an empty board.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmBreadboard {
        Self::with_max_iterations(crate::DEFAULT_MAX_ITERATIONS)
    }

    /// Create an empty board with a custom relaxation bound.
    #[wasm_bindgen]
    pub fn with_max_iterations(max_iterations: usize) -> WasmBreadboard {
        let config = SettleConfig::new().with_max_iterations(max_iterations);
        WasmBreadboard {
            workbench: Workbench::with_config(config),
            rollback_messages: Vec::new(),
        }
    }

    /// Create a board from a bench description.
    #[wasm_bindgen]
    pub fn from_description(description: &str) -> Result<WasmBreadboard, JsValue> {
        let ast = dsl::parse(description).map_err(js_error)?;
        let bench = Breadboard::from_ast(ast).map_err(js_error)?;
        let mut wasm = Self::new();
        wasm.workbench.load(bench.board);
        Ok(wasm)
    }

    /// Replace the board with the host's elements and connections.
    /// Settling is deferred to [`WasmBreadboard::idle`].
    #[wasm_bindgen]
    pub fn load(&mut self, elements_json: &str, connections_json: &str) -> Result<(), JsValue> {
        let board = parse_snapshot(elements_json, connections_json).map_err(js_error)?;
        self.workbench.load(board);
        Ok(())
    }

    /// Settle if the board changed since the last call.
    ///
    /// Returns the settled `{ elements, connections, rollbacks }` JSON, or
    /// `undefined` when nothing changed.
    #[wasm_bindgen]
    pub fn idle(&mut self) -> Result<Option<String>, JsValue> {
        let Some(report) = self.workbench.idle() else {
            return Ok(None);
        };
        self.rollback_messages = report
            .rollbacks
            .iter()
            .map(|r| r.fault.to_string())
            .collect();
        settled_json(self.workbench.board(), &report.rollbacks)
            .map(Some)
            .map_err(js_error)
    }

    /// The current board as JSON.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.workbench.board()).map_err(js_error)
    }

    /// Messages for the wiring faults undone by the last settle.
    #[wasm_bindgen]
    pub fn rollbacks(&self) -> Vec<String> {
        self.rollback_messages.clone()
    }

    /// Whether the board has edits not yet settled.
    #[wasm_bindgen(getter)]
    pub fn dirty(&self) -> bool {
        self.workbench.is_dirty()
    }
}

impl Default for WasmBreadboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Settle the host's elements and connections immediately.
#[wasm_bindgen]
pub fn settle_json(elements_json: &str, connections_json: &str) -> Result<String, JsValue> {
    let board = parse_snapshot(elements_json, connections_json).map_err(js_error)?;
    let settlement = Settler::new().settle_board(&board);
    let rollbacks = settlement.rollbacks.clone();
    settled_json(&settlement.into_board(), &rollbacks).map_err(js_error)
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENTS: &str = r#"[
        {"id": 1, "x": 0, "y": 0, "type": "battery", "voltage": 9},
        {"id": 2, "x": 200, "y": 0, "type": "rezistor", "resistance": 220},
        {"id": 3, "x": 400, "y": 0, "type": "led", "resistance": 20}
    ]"#;

    fn wire(from: (u64, &str), to: (u64, &str), path: u64) -> String {
        format!(
            r#"{{"start": {{"id": {}, "terminalSide": "{}", "role": "start", "pathId": {path}, "x": 0, "y": 0}},
                "end": {{"id": {}, "terminalSide": "{}", "role": "end", "pathId": {path}, "x": 0, "y": 0}}}}"#,
            from.0, from.1, to.0, to.1
        )
    }

    fn connections() -> String {
        format!(
            "[{}, {}, {}]",
            wire((1, "right"), (2, "left"), 1),
            wire((2, "right"), (3, "right"), 2),
            wire((3, "left"), (1, "left"), 3)
        )
    }

    #[test]
    fn test_snapshot_from_host_arrays() {
        let board = parse_snapshot(ELEMENTS, &connections()).unwrap();
        assert_eq!(board.elements.len(), 3);
        assert_eq!(board.connections.len(), 3);
        assert!(parse_snapshot("{}", "[]").is_err());
    }

    #[test]
    fn test_idle_returns_settled_json_once() {
        let mut bench = WasmBreadboard::new();
        bench.load(ELEMENTS, &connections()).unwrap();
        assert!(bench.dirty());

        let settled = bench.idle().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&settled).unwrap();
        assert_eq!(value["elements"][2]["isOn"], true);
        assert_eq!(value["rollbacks"].as_array().map(Vec::len), Some(0));
        assert!(bench.idle().unwrap().is_none());
    }
}
