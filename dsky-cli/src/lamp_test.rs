//! Manual lamp test
//!
//! Drives the controllers through a fixed sequence of control-line events: every
//! digit to 8, each sign through plus/blank/minus, every lamp on and off, and
//! finally a static picture of the display.

use crate::transport::Peripherals;
use anyhow::{Context, Result};
use dsky_protocol::{ControlLineEvent, Dispatcher};
use std::thread;
use std::time::Duration;

use dsky_protocol::ControlLineEvent::{Disp, Indc, ParityAlarm, Reset, Standby};

/// One labelled group of events
pub struct Step {
    pub label: &'static str,
    pub events: &'static [ControlLineEvent],
}

pub const SEQUENCE: &[Step] = &[
    Step {
        label: "reset",
        events: &[Reset],
    },
    Step {
        label: "all digits 8",
        events: &[
            Disp(0x5BBD),
            Disp(0x53BD),
            Disp(0x4BBD),
            Disp(0x43BD),
            Disp(0x3BBD),
            Disp(0x33BD),
            Disp(0x2BBD),
            Disp(0x23BD),
            Disp(0x1BBD),
            Disp(0x13BD),
            Disp(0x0BBD),
        ],
    },
    Step {
        label: "signs plus",
        events: &[Disp(0x3FBD), Disp(0x2FBD), Disp(0x17BD)],
    },
    Step {
        label: "signs blank",
        events: &[Disp(0x3BBD), Disp(0x2BBD), Disp(0x13BD)],
    },
    Step {
        label: "signs minus",
        events: &[Disp(0x37BD), Disp(0x27BD), Disp(0x0FBD)],
    },
    Step {
        label: "signs blank",
        events: &[Disp(0x33BD), Disp(0x23BD), Disp(0x0BBD)],
    },
    Step {
        label: "lamps on",
        events: &[
            // VEL, NO ATT, ALT, GIMBAL LOCK, TRACKER, PROG
            Disp(0x61BC),
            // UPLINK ACTY, TEMP, KEY REL, OPR ERR
            Indc(0x005C),
            Standby(true),
            ParityAlarm(true),
            // COMP ACTY
            Indc(0x005E),
        ],
    },
    Step {
        label: "lamps off",
        events: &[
            Disp(0x6000),
            Indc(0x0002),
            Standby(false),
            ParityAlarm(false),
            Indc(0x0000),
        ],
    },
    Step {
        label: "picture",
        events: &[
            // KEY REL, TEMP
            Indc(0x0018),
            // NO ATT, PROG, VEL
            Disp(0x610C),
            Disp(0x5AB5),
            Disp(0x52BC),
            Disp(0x4B7C),
            Disp(0x42B5),
            Disp(0x3AB5),
            Disp(0x347E),
            Disp(0x2AB5),
            Disp(0x26A3),
            Disp(0x1B35),
            Disp(0x16BE),
            Disp(0x0B9D),
        ],
    },
];

/// Play the sequence, pausing between steps; returns the number of commands produced
pub fn run(
    dispatcher: &mut Dispatcher,
    peripherals: &mut Peripherals,
    step_delay: Duration,
) -> Result<usize> {
    let mut produced = 0;
    for (i, step) in SEQUENCE.iter().enumerate() {
        log::info!("Lamp test step {}/{}: {}", i + 1, SEQUENCE.len(), step.label);

        for event in step.events {
            let reaction = dispatcher.handle_event(*event);
            produced += reaction.commands.len();
            peripherals
                .send_all(&reaction.commands)
                .with_context(|| format!("Lamp test step '{}' failed", step.label))?;
        }

        if i + 1 < SEQUENCE.len() && !step_delay.is_zero() {
            thread::sleep(step_delay);
        }
    }
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsky_protocol::{Digit, DisplayField, Indicator, Row, Sign};

    #[test]
    fn test_sequence_ends_on_picture() {
        let mut dispatcher = Dispatcher::default();
        let mut peripherals = Peripherals::new();
        let produced = run(&mut dispatcher, &mut peripherals, Duration::ZERO).unwrap();

        assert!(produced > 0);
        assert_eq!(peripherals.dropped(), produced);

        let display = dispatcher.display();
        assert_eq!(display.digit(DisplayField::Vd2), Some(Digit::Decimal(6)));
        assert_eq!(display.digit(DisplayField::R3d5), Some(Digit::Decimal(8)));
        assert_eq!(display.sign(Row::R1), Sign::Minus);
        assert_eq!(display.sign(Row::R3), Sign::Plus);
        assert_eq!(display.stats().invalid_patterns, 0);

        let channel11 = dispatcher.channel11();
        assert!(channel11.is_lit(Indicator::KeyRel));
        assert!(channel11.is_lit(Indicator::Temp));
        assert!(!channel11.is_lit(Indicator::OprErr));
        assert!(!channel11.is_lit(Indicator::Stby));
    }
}
