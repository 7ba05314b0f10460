//! Transitional-lift shudder: a small rotor-rate-modulated oscillation added
//! to the sim's P/Q angular accelerations.

use dataref_schema::{SimInputs, SimWrites};

const PHASE_SCALE: f32 = 0.03;
const PITCH_GAIN: f32 = 0.05;
const ROLL_GAIN: f32 = 0.005;
const GROUND_PITCH_DAMPING: f32 = 0.001;
const GROUND_ROLL_DAMPING: f32 = 0.5;

/// Main/tail rotor rates and the two phase drivers in `POINT_tacrad`.
const MAIN: usize = 0;
const TAIL: usize = 1;
const PITCH_PHASE: usize = 4;
const ROLL_PHASE: usize = 5;

pub fn update(inputs: &SimInputs, writes: &mut SimWrites) {
    let mut p = inputs.p_dot;
    let mut q = inputs.q_dot;

    if inputs.on_ground {
        p *= GROUND_PITCH_DAMPING;
        q *= GROUND_ROLL_DAMPING;
    }

    let tacrad = &inputs.tacrad;
    p += (tacrad[PITCH_PHASE] * PHASE_SCALE).sin() * tacrad[MAIN] * PITCH_GAIN;
    q += (tacrad[ROLL_PHASE] * PHASE_SCALE).sin() * tacrad[TAIL] * ROLL_GAIN;

    writes.p_dot = p;
    writes.q_dot = q;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_rotor_passes_accelerations_through_in_air() {
        let mut writes = SimWrites::default();
        let inputs = SimInputs { p_dot: 1.25, q_dot: -0.5, ..SimInputs::default() };
        update(&inputs, &mut writes);
        assert_eq!(writes.p_dot, 1.25);
        assert_eq!(writes.q_dot, -0.5);
    }

    #[test]
    fn ground_contact_damps_with_rotor_stopped() {
        let mut writes = SimWrites::default();
        let inputs = SimInputs { p_dot: 10.0, q_dot: 4.0, on_ground: true, ..SimInputs::default() };
        update(&inputs, &mut writes);
        assert!((writes.p_dot - 0.01).abs() < 1e-6);
        assert!((writes.q_dot - 2.0).abs() < 1e-6);
    }

    #[test]
    fn ground_damping_leaves_perturbation_undamped() {
        let mut tacrad = [0.0; 8];
        tacrad[MAIN] = 40.0;
        tacrad[TAIL] = 200.0;
        tacrad[PITCH_PHASE] = 30.0;
        tacrad[ROLL_PHASE] = 50.0;
        let inputs = SimInputs { p_dot: 10.0, q_dot: 4.0, on_ground: true, tacrad, ..SimInputs::default() };
        let mut writes = SimWrites::default();
        update(&inputs, &mut writes);

        let expected_p = 10.0 * 0.001 + (30.0_f32 * 0.03).sin() * 40.0 * 0.05;
        let expected_q = 4.0 * 0.5 + (50.0_f32 * 0.03).sin() * 200.0 * 0.005;
        assert!((writes.p_dot - expected_p).abs() < 1e-5, "got {}", writes.p_dot);
        assert!((writes.q_dot - expected_q).abs() < 1e-5, "got {}", writes.q_dot);
    }

    #[test]
    fn perturbation_scales_with_rotor_rate() {
        let mut tacrad = [0.0; 8];
        tacrad[MAIN] = 40.0;
        tacrad[TAIL] = 200.0;
        tacrad[PITCH_PHASE] = 30.0;
        tacrad[ROLL_PHASE] = 50.0;
        let mut writes = SimWrites::default();
        update(&SimInputs { tacrad, ..SimInputs::default() }, &mut writes);

        let expected_p = (30.0_f32 * 0.03).sin() * 40.0 * 0.05;
        let expected_q = (50.0_f32 * 0.03).sin() * 200.0 * 0.005;
        assert!((writes.p_dot - expected_p).abs() < 1e-5);
        assert!((writes.q_dot - expected_q).abs() < 1e-5);
    }
}
