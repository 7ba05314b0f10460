//! Main and tail rotor animation.
//!
//! Accumulates the true disc angles, decides per rotor whether it is spinning
//! fast enough to be drawn as a blurred disc, and derives the per-blade pitch
//! from cyclic and collective.
//!
//! The main and tail regime branches are not symmetric: in the low-speed
//! regime the tail muting cell follows the true angle, the main one holds.

use dataref_schema::{AnimState, SimInputs, SimWrites, BLADE_CELLS};

/// Rotor angles wrap once this magnitude is exceeded.
pub const MAX_ROTATION: f32 = 720.0;
/// Tacrad at or above which a rotor is drawn as a blurred disc.
pub const HIGH_SPEED_TACRAD: f32 = 15.0;
/// Synthetic blur-disc advance per frame, in degrees.
pub const FPS_MUTING_STEP: f32 = 36.0;
/// Blur-disc accumulator wrap point.
pub const FPS_MUTING_WRAP: f32 = 36000.0;
/// Blade count above which the spacing is computed as if there were five blades.
const MAX_BLADES: f32 = BLADE_CELLS as f32;

const MAIN: usize = 0;
const TAIL: usize = 1;

pub fn update(state: &mut AnimState, inputs: &SimInputs, writes: &mut SimWrites) {
    let dt = inputs.frame_period_s;
    let main_rate = inputs.tacrad[MAIN];
    let tail_rate = inputs.tacrad[TAIL];

    state.rotor_position_main = accumulate(state.rotor_position_main, main_rate, dt);
    state.rotor_position_tail = accumulate(state.rotor_position_tail, tail_rate, dt);

    update_main_regime(state, inputs, writes);
    update_tail_regime(state, tail_rate);

    state.rotor_blades_pitch = blade_pitches(state.rotor_position_main, inputs);
}

/// Advance `angle` by `rate` rad/s over `dt`, wrapping once into (-720°, 720°].
pub fn accumulate(angle: f32, rate: f32, dt: f32) -> f32 {
    let next = angle + rate.to_degrees() * dt;
    if next > MAX_ROTATION {
        next - MAX_ROTATION
    } else if next <= -MAX_ROTATION {
        next + MAX_ROTATION
    } else {
        next
    }
}

fn advance_fps_muting(accumulator: f32) -> f32 {
    let wrapped = if accumulator > FPS_MUTING_WRAP {
        accumulator - FPS_MUTING_WRAP
    } else {
        accumulator
    };
    wrapped + FPS_MUTING_STEP
}

fn update_main_regime(state: &mut AnimState, inputs: &SimInputs, writes: &mut SimWrites) {
    let elev_tilt = inputs.cyclic_elev_disc_tilt;
    let ailn_tilt = inputs.cyclic_ailn_disc_tilt;

    if inputs.tacrad[MAIN] >= HIGH_SPEED_TACRAD {
        state.tacrads_high_main = 1.0;

        // Blurred disc: hide the real tilt, drive the muted tilt instead.
        writes.cyclic_elev_disc_tilt = 0.0;
        writes.cyclic_ailn_disc_tilt = 0.0;
        state.rotor_muting_low_pitch = elev_tilt;
        state.rotor_muting_low_roll = ailn_tilt;

        state.rotor_position_main_fps_muting =
            advance_fps_muting(state.rotor_position_main_fps_muting);
        state.rotor_position_main_muting = 0.0;
    } else {
        state.tacrads_high_main = 0.0;

        writes.cyclic_elev_disc_tilt = elev_tilt;
        writes.cyclic_ailn_disc_tilt = ailn_tilt;
        state.rotor_muting_low_pitch = 0.0;
        state.rotor_muting_low_roll = 0.0;

        // rotor_position_main_muting is left as it was.
        state.rotor_position_main_fps_muting = 0.0;
    }
}

fn update_tail_regime(state: &mut AnimState, tail_rate: f32) {
    if tail_rate >= HIGH_SPEED_TACRAD {
        state.tacrads_high_tail = 1.0;
        state.rotor_position_tail_muting = 0.0;
        state.rotor_position_tail_fps_muting =
            advance_fps_muting(state.rotor_position_tail_fps_muting);
    } else {
        state.tacrads_high_tail = 0.0;
        state.rotor_position_tail_muting = state.rotor_position_tail;
        state.rotor_position_tail_fps_muting = 0.0;
    }
}

/// Cyclic blade pitch for five evenly spaced blades around `main_angle`.
///
/// A blade count of zero yields non-finite pitches; the aircraft always
/// reports at least one blade.
pub fn blade_pitches(main_angle: f32, inputs: &SimInputs) -> [f32; BLADE_CELLS] {
    let blades = inputs.num_blades.min(MAX_BLADES);
    let step = 360.0 / blades;
    let first = main_angle - step * 0.5;

    let roll = inputs.acf_cyclic_ailn * inputs.yoke_roll_ratio;
    let pitch = inputs.acf_cyclic_elev * inputs.yoke_pitch_ratio;

    let mut out = [0.0; BLADE_CELLS];
    for (i, slot) in out.iter_mut().enumerate() {
        let offset = (first + i as f32 * step).to_radians();
        *slot = -(roll * offset.cos() - pitch * offset.sin()) + inputs.collective_pitch_deg;
    }
    out
}
