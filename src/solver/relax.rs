//! Fixed-point relaxation over component rules.

use tracing::{debug, trace};

use crate::circuit::{Element, TopologyIndex};
use crate::components::{inject_sources, Component, RuleContext, RuleStage};
use crate::error::WiringFault;

use super::propagate::PathTable;
use super::settle::SettleConfig;

/// Outcome of a converged relaxation.
#[derive(Debug)]
pub(crate) struct Relaxed {
    pub table: PathTable,
    pub iterations: usize,
}

/// Run passes until neither the path table nor any element changes.
///
/// Element readouts are updated in place. Switches left closed with no
/// power on either side are opened once the board is quiescent.
pub(crate) fn relax(
    elements: &mut [Element],
    index: &TopologyIndex<'_>,
    config: &SettleConfig,
) -> Result<Relaxed, WiringFault> {
    let mut table = PathTable::new();

    for iteration in 1..=config.max_iterations {
        let nodes_before = table.clone();
        let elements_before = elements.to_vec();

        run_pass(elements, index, &mut table, config)?;

        if table == nodes_before && elements[..] == elements_before[..] {
            release_idle_switches(elements, index, &mut table, config);
            debug!(
                iterations = iteration,
                active_paths = table.active_count(),
                "relaxation converged"
            );
            return Ok(Relaxed {
                table,
                iterations: iteration,
            });
        }
        trace!(iteration, "pass changed state");
    }

    Err(WiringFault::NonConvergence {
        iterations: config.max_iterations,
    })
}

/// One pass: seed sources, then every rule group in order.
fn run_pass(
    elements: &mut [Element],
    index: &TopologyIndex<'_>,
    table: &mut PathTable,
    config: &SettleConfig,
) -> Result<(), WiringFault> {
    inject_sources(elements, index, table)?;

    let mut ctx = RuleContext::new(index, table, config);
    for stage in RuleStage::ORDER {
        for element in elements.iter_mut() {
            if element.component.stage() != Some(stage) {
                continue;
            }
            let id = element.id;
            element.component.apply(id, &mut ctx)?;
        }
    }
    Ok(())
}

fn release_idle_switches(
    elements: &mut [Element],
    index: &TopologyIndex<'_>,
    table: &mut PathTable,
    config: &SettleConfig,
) {
    let ctx = RuleContext::new(index, table, config);
    for element in elements.iter_mut() {
        let id = element.id;
        if let Component::Switch(sw) = &mut element.component {
            if sw.release_if_idle(id, &ctx) {
                debug!(switch = %id, "opened unpowered switch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Breadboard, Position, TerminalSide};
    use crate::components::{LedState, ResistiveState, SourceState, SwitchState};

    #[test]
    fn test_series_led_converges_lit() {
        let mut board = Breadboard::new();
        let bat = board.add_element(Component::Battery(SourceState::default()), Position::default());
        let r = board.add_element(Component::Resistor(ResistiveState::default()), Position::default());
        let led = board.add_element(Component::Led(LedState::default()), Position::default());
        board.add_wire((bat, TerminalSide::Right), &[], (r, TerminalSide::Left)).unwrap();
        board.add_wire((r, TerminalSide::Right), &[], (led, TerminalSide::Right)).unwrap();
        board.add_wire((led, TerminalSide::Left), &[], (bat, TerminalSide::Left)).unwrap();

        let index = TopologyIndex::new(&board.connections);
        let mut elements = board.elements.clone();
        let relaxed = relax(&mut elements, &index, &SettleConfig::default()).unwrap();

        assert!(relaxed.iterations >= 2);
        assert!(elements[2].is_on());
        assert_eq!(relaxed.table.active_count(), 3);
    }

    #[test]
    fn test_iteration_bound() {
        let mut board = Breadboard::new();
        let bat = board.add_element(Component::Battery(SourceState::default()), Position::default());
        let r = board.add_element(Component::Resistor(ResistiveState::default()), Position::default());
        board.add_wire((bat, TerminalSide::Right), &[], (r, TerminalSide::Left)).unwrap();

        // the first pass always seeds, so one pass can never be quiescent
        let index = TopologyIndex::new(&board.connections);
        let mut elements = board.elements.clone();
        let config = SettleConfig::new().with_max_iterations(1);
        assert_eq!(
            relax(&mut elements, &index, &config).unwrap_err(),
            WiringFault::NonConvergence { iterations: 1 }
        );
    }

    #[test]
    fn test_unpowered_closed_switch_opens() {
        let mut board = Breadboard::new();
        let sw = board.add_element(Component::Switch(SwitchState::new(true)), Position::default());
        let led = board.add_element(Component::Led(LedState::default()), Position::default());
        board.add_wire((sw, TerminalSide::Right), &[], (led, TerminalSide::Right)).unwrap();

        let index = TopologyIndex::new(&board.connections);
        let mut elements = board.elements.clone();
        relax(&mut elements, &index, &SettleConfig::default()).unwrap();
        assert!(!elements[0].is_on());
    }
}
