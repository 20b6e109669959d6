//! Human-readable and JSON output for the CLI.

use std::io::Write;

use crate::circuit::{Bench, Element};
use crate::components::Component;
use crate::error::{BreadboardError, Result};
use crate::solver::Settlement;

/// A settled bench ready to print.
pub struct Report<'a> {
    bench: &'a Bench,
    settlement: &'a Settlement,
}

impl<'a> Report<'a> {
    pub fn new(bench: &'a Bench, settlement: &'a Settlement) -> Self {
        Self { bench, settlement }
    }

    fn label(&self, element: &Element) -> String {
        self.bench
            .name_of(element.id)
            .map(str::to_string)
            .unwrap_or_else(|| element.id.to_string())
    }

    /// One-line readout of an element.
    pub fn describe(element: &Element) -> String {
        match &element.component {
            Component::Battery(b) => format!("{:.2} V", b.voltage),
            Component::Switch(sw) => match (sw.closed, sw.out) {
                (true, Some(side)) => format!("closed, driving {side}"),
                (true, None) => "closed".to_string(),
                (false, _) => "open".to_string(),
            },
            Component::Resistor(r) | Component::Potentiometer(r) => format!("{} Ω", r.ohms),
            Component::Led(led) if led.burned => "burned out".to_string(),
            Component::Led(led) if led.lit => format!(
                "lit, brightness {}, {:.1} mA, drop {:.2} V",
                led.brightness,
                led.current * 1000.0,
                led.voltage_drop
            ),
            Component::Led(_) => "dark".to_string(),
            Component::Capacitor(c) => format!(
                "{} µF, {:.2} V",
                c.capacitance * 1e6,
                c.voltage
            ),
            Component::Diode(d) if d.conducting => {
                format!("conducting, drop {:.2} V", d.voltage_drop)
            }
            Component::Diode(_) => "blocking".to_string(),
            Component::Voltmeter(m) => format!("{:.2} V", m.value),
            Component::Ammeter(m) => format!("{:.3} A", m.value),
        }
    }

    /// Plain text report: elements, node states, then any rollbacks.
    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        self.text(out).map_err(|e| BreadboardError::OutputError {
            message: e.to_string(),
        })
    }

    fn text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Elements:")?;
        for element in &self.settlement.elements {
            writeln!(
                out,
                "  {:<8} {:<13} {}",
                self.label(element),
                element.kind().to_string(),
                Self::describe(element)
            )?;
        }

        writeln!(out, "Nodes:")?;
        for (path, node) in self.settlement.path_states() {
            writeln!(
                out,
                "  {:<8} {:<20} {} Ω",
                path.to_string(),
                node.voltage.to_string(),
                node.cumulative_resistance
            )?;
        }

        if !self.settlement.rollbacks.is_empty() {
            writeln!(out, "Rolled back:")?;
            for rollback in &self.settlement.rollbacks {
                let (Some(first), Some(last)) = (rollback.removed.first(), rollback.removed.last()) else {
                    continue;
                };
                writeln!(
                    out,
                    "  {} ({}.{} to {}.{}, {} segments): {}",
                    rollback.path,
                    first.start.element,
                    first.start.terminal_side,
                    last.end.element,
                    last.end.terminal_side,
                    rollback.removed.len(),
                    rollback.fault
                )?;
            }
        }
        writeln!(out, "Settled in {} passes.", self.settlement.iterations)
    }

    /// The settled snapshot as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self.settlement)?;
        writeln!(out).map_err(|e| BreadboardError::OutputError {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Breadboard;
    use crate::dsl;
    use crate::solver::settle;

    #[test]
    fn test_text_report_names_elements() {
        let ast = dsl::parse(
            "BAT B1 9V\nRES R1 220\nLED L1\n\
             WIRE B1.right R1.left\nWIRE R1.right L1.right\nWIRE L1.left B1.left\n",
        )
        .unwrap();
        let bench = Breadboard::from_ast(ast).unwrap();
        let settlement = settle(&bench.board.elements, &bench.board.connections);

        let mut out = Vec::new();
        Report::new(&bench, &settlement).write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("B1"));
        assert!(text.contains("lit, brightness 38"));
        assert!(!text.contains("Rolled back"));
    }

    #[test]
    fn test_json_report_is_valid() {
        let bench = Breadboard::from_ast(dsl::parse("BAT B1\n").unwrap()).unwrap();
        let settlement = settle(&bench.board.elements, &bench.board.connections);

        let mut out = Vec::new();
        Report::new(&bench, &settlement).write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["elements"][0]["type"], "battery");
    }
}
