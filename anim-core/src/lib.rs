//! Per-frame animation pipeline for the Hughes 500D.
//!
//! Every stage is a plain function over the owned [`AnimState`] and the tick's
//! [`SimInputs`]; nothing here touches XPLM. The order in [`PIPELINE`] is
//! fixed: the door stage reads its own latch from the previous tick and the
//! host expects every cell to be consistent when the tick returns.

pub mod door;
pub mod pilot;
pub mod radio;
pub mod rotor;
pub mod shudder;

use dataref_schema::{AnimState, SimInputs, SimWrites};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Door,
    Rotor,
    PilotHead,
    RadioSwitch,
    Shudder,
}

pub const PIPELINE: [Stage; 5] = [
    Stage::Door,
    Stage::Rotor,
    Stage::PilotHead,
    Stage::RadioSwitch,
    Stage::Shudder,
];

impl Stage {
    pub fn run(self, state: &mut AnimState, inputs: &SimInputs, writes: &mut SimWrites) {
        match self {
            Stage::Door        => door::update(state, inputs),
            Stage::Rotor       => rotor::update(state, inputs, writes),
            Stage::PilotHead   => pilot::update(state, inputs),
            Stage::RadioSwitch => radio::update(state, inputs),
            Stage::Shudder     => shudder::update(inputs, writes),
        }
    }
}

/// Run one frame. Returns the values to push back into sim-owned datarefs.
pub fn run_frame(state: &mut AnimState, inputs: &SimInputs) -> SimWrites {
    let mut writes = SimWrites::default();
    for stage in PIPELINE {
        stage.run(state, inputs, &mut writes);
    }
    writes
}
