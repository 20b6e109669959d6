//! Semiconductor junctions: the LED and the rectifier diode.
//!
//! The right terminal of both parts is the anode. A lit LED stamps its own
//! voltage drop onto the powered nodes on either side. A diode forwards
//! state from anode to cathode only.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::circuit::{ElementId, Polarity, TerminalSide, Voltage};
use crate::solver::NodeState;

use super::{across, RuleContext};

/// Total loop resistance below this is clamped before dividing.
const MIN_LOOP_RESISTANCE: f64 = 1e-3;

/// Calibration from loop current to LED brightness.
#[derive(Debug, Clone, PartialEq)]
pub struct LedParams {
    /// Brightness units per ampere
    pub gain: f64,
    /// Dimmest visible brightness
    pub min_brightness: f64,
    /// Brightest non-destructive brightness
    pub max_brightness: f64,
    /// Brightness above which the LED burns out
    pub burnout_brightness: f64,
    /// Burnout also requires a driving voltage above this
    pub burnout_min_voltage: f64,
}

impl Default for LedParams {
    fn default() -> Self {
        Self {
            gain: 1000.0,
            min_brightness: 1.0,
            max_brightness: 100.0,
            burnout_brightness: 100.0,
            burnout_min_voltage: 3.0,
        }
    }
}

/// A light-emitting diode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedState {
    /// Series resistance in ohms
    pub resistance: f64,
    #[serde(default, rename = "isOn")]
    pub lit: bool,
    #[serde(default)]
    pub brightness: f64,
    /// Burned out; stays dark until replaced
    #[serde(default, rename = "isBurned")]
    pub burned: bool,
    /// Loop current in amperes
    #[serde(default)]
    pub current: f64,
    /// Drop across the LED's own resistance, rounded to 0.01 V
    #[serde(default)]
    pub voltage_drop: f64,
}

impl LedState {
    pub const DEFAULT_RESISTANCE: f64 = 20.0;

    pub fn new(resistance: f64) -> Self {
        Self {
            resistance: resistance.max(0.0),
            lit: false,
            brightness: 0.0,
            burned: false,
            current: 0.0,
            voltage_drop: 0.0,
        }
    }

    fn go_dark(&mut self) {
        self.lit = false;
        self.brightness = 0.0;
        self.current = 0.0;
        self.voltage_drop = 0.0;
    }

    /// Evaluate the LED against its two neighbouring nodes.
    ///
    /// Forward bias needs a negative node on the left (cathode) and a
    /// positive node on the right (anode). Anything else leaves it dark.
    /// Current is taken from the full battery voltage, so the drop written
    /// back by a previous pass does not feed into the next one.
    pub fn apply(&mut self, id: ElementId, ctx: &mut RuleContext<'_>) {
        if self.burned {
            self.go_dark();
            return;
        }
        let (Some(left), Some(right)) = (
            ctx.first_active(id, TerminalSide::Left),
            ctx.first_active(id, TerminalSide::Right),
        ) else {
            self.go_dark();
            return;
        };
        let Some(volts) = across(&ctx.supply(left.node), &ctx.supply(right.node)) else {
            self.go_dark();
            return;
        };

        let params = &ctx.config().led;
        let total = (left.node.cumulative_resistance
            + self.resistance
            + right.node.cumulative_resistance)
            .max(MIN_LOOP_RESISTANCE);
        let current = volts / total;
        let brightness = (current * params.gain).round();

        if brightness > params.burnout_brightness && volts > params.burnout_min_voltage {
            warn!(led = %id, current, volts, "LED burned out");
            self.burned = true;
            self.go_dark();
        } else if brightness >= params.min_brightness && brightness <= params.max_brightness {
            if !self.lit {
                debug!(led = %id, brightness, "LED lit");
            }
            self.lit = true;
            self.brightness = brightness;
            self.current = current;
            self.voltage_drop = (current * self.resistance * 100.0).round() / 100.0;
            self.stamp_drop(id, ctx);
        } else {
            self.go_dark();
        }
    }

    /// Powered neighbours on both sides take the LED's drop as their
    /// magnitude; polarity, source and resistance are kept. Battery paths
    /// refuse the write.
    fn stamp_drop(&self, id: ElementId, ctx: &mut RuleContext<'_>) {
        for side in [TerminalSide::Left, TerminalSide::Right] {
            for neighbour in ctx.neighbours(id, side) {
                if !neighbour.is_active() {
                    continue;
                }
                let dropped = NodeState::new(
                    Voltage {
                        magnitude: self.voltage_drop,
                        ..neighbour.node.voltage
                    },
                    neighbour.node.cumulative_resistance,
                );
                ctx.propagate(neighbour.path, dropped);
            }
        }
    }
}

impl Default for LedState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RESISTANCE)
    }
}

/// A rectifier diode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiodeState {
    /// Series resistance in ohms
    #[serde(default)]
    pub resistance: f64,
    /// Forward biased and carrying state across
    #[serde(default, rename = "isOn")]
    pub conducting: bool,
    /// Forward drop while conducting
    #[serde(default)]
    pub voltage_drop: f64,
}

impl DiodeState {
    pub fn new(resistance: f64) -> Self {
        Self {
            resistance: resistance.max(0.0),
            conducting: false,
            voltage_drop: 0.0,
        }
    }

    /// Forward anode state to the cathode side and vice versa for a
    /// negative cathode. Reverse bias blocks silently.
    pub fn apply(&mut self, id: ElementId, ctx: &mut RuleContext<'_>) {
        let left = ctx.first_active(id, TerminalSide::Left);
        let right = ctx.first_active(id, TerminalSide::Right);

        self.conducting = match (left, right) {
            (None, Some(anode)) if anode.node.polarity() == Some(Polarity::Positive) => {
                ctx.drive(id, TerminalSide::Left, anode.node.through(self.resistance));
                true
            }
            (Some(cathode), None) if cathode.node.polarity() == Some(Polarity::Negative) => {
                ctx.drive(id, TerminalSide::Right, cathode.node.through(self.resistance));
                true
            }
            (Some(cathode), Some(anode)) => match (cathode.node.polarity(), anode.node.polarity()) {
                (Some(Polarity::Negative), Some(Polarity::Positive)) => true,
                (Some(Polarity::Positive), Some(Polarity::Positive)) => {
                    cathode.node.cumulative_resistance >= anode.node.cumulative_resistance
                }
                (Some(Polarity::Negative), Some(Polarity::Negative)) => {
                    anode.node.cumulative_resistance >= cathode.node.cumulative_resistance
                }
                _ => false,
            },
            _ => false,
        };
        self.voltage_drop = if self.conducting {
            ctx.config().diode_forward_drop
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_defaults() {
        let led = LedState::default();
        assert_eq!(led.resistance, 20.0);
        assert!(!led.lit);
        assert!(!led.burned);
    }

    #[test]
    fn test_led_params_default_band() {
        let p = LedParams::default();
        assert_eq!(p.gain, 1000.0);
        assert!(p.min_brightness <= p.max_brightness);
        assert_eq!(p.burnout_brightness, p.max_brightness);
    }

    #[test]
    fn test_led_wire_format() {
        let led: LedState =
            serde_json::from_str(r#"{"resistance":20,"isOn":true,"brightness":38,"isBurned":false}"#)
                .unwrap();
        assert!(led.lit);
        assert_eq!(led.brightness, 38.0);
        assert_eq!(led.current, 0.0);
    }
}
