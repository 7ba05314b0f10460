//! Pilot head turn. On the ground the pilot looks towards the viewpoint,
//! in the air the head leans into the roll.

use dataref_schema::{AnimState, SimInputs};

/// Maximum head rotation rate, degrees per second.
pub const HEAD_ROTATION_SPEED: f32 = 150.0;
/// Head heading limit either side of centre, degrees.
pub const HEAD_LIMIT: f32 = 70.0;
/// Distance to target at which the head turns at full speed.
const FULL_SPEED_DISTANCE: f32 = 25.0;
/// Relative bearings outside this band are treated as "behind" and ignored.
const BEARING_MIN: f32 = -100.0;
const BEARING_MAX: f32 = 92.0;

pub fn update(state: &mut AnimState, inputs: &SimInputs) {
    let target = target_heading(inputs).clamp(-HEAD_LIMIT, HEAD_LIMIT);

    let fraction = ((target - state.head_heading) / FULL_SPEED_DISTANCE).clamp(-1.0, 1.0);
    let next = state.head_heading + HEAD_ROTATION_SPEED * fraction * inputs.frame_period_s;

    state.head_heading = next.clamp(-HEAD_LIMIT, HEAD_LIMIT);
}

fn target_heading(inputs: &SimInputs) -> f32 {
    if !inputs.on_ground {
        return inputs.roll_deg;
    }

    let bearing = course_to(inputs.view_x - inputs.local_x, inputs.view_z - inputs.local_z);
    let mut relative = bearing - inputs.heading_deg;
    if relative > 180.0 {
        relative -= 360.0;
    } else if relative < -180.0 {
        relative += 360.0;
    }

    if in_bearing_band(relative) { relative } else { 0.0 }
}

fn in_bearing_band(relative: f32) -> bool {
    (BEARING_MIN..=BEARING_MAX).contains(&relative)
}

/// Course in degrees from the origin to `(dx, dz)` in local OpenGL coordinates.
fn course_to(dx: f32, dz: f32) -> f32 {
    dz.atan2(dx).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_ground_looking_at(dx: f32, dz: f32, heading: f32) -> SimInputs {
        SimInputs {
            on_ground: true,
            view_x: 100.0 + dx,
            view_z: -50.0 + dz,
            local_x: 100.0,
            local_z: -50.0,
            heading_deg: heading,
            frame_period_s: 0.1,
            ..SimInputs::default()
        }
    }

    #[test]
    fn ground_target_at_45_degrees_advances_at_full_rate() {
        let mut state = AnimState::default();
        update(&mut state, &on_ground_looking_at(1.0, 1.0, 0.0));
        assert!((state.head_heading - 15.0).abs() < 1e-4, "got {}", state.head_heading);
    }

    #[test]
    fn close_to_target_slows_down() {
        let mut state = AnimState { head_heading: 40.0, ..AnimState::default() };
        update(&mut state, &on_ground_looking_at(1.0, 1.0, 0.0));
        // fraction = 5 / 25 = 0.2 → 150 * 0.2 * 0.1 = 3
        assert!((state.head_heading - 43.0).abs() < 1e-3);
    }

    #[test]
    fn viewpoint_behind_is_ignored() {
        let mut state = AnimState { head_heading: 20.0, ..AnimState::default() };
        // bearing 135° relative: outside the valid band, target 0
        update(&mut state, &on_ground_looking_at(-1.0, 1.0, 0.0));
        assert!(state.head_heading < 20.0);
    }

    #[test]
    fn relative_bearing_wraps_through_180() {
        // atan2 gives -135°, heading 200° → -335° → +25°
        let inputs = on_ground_looking_at(-1.0, -1.0, 200.0);
        assert!((target_heading(&inputs) - 25.0).abs() < 1e-3);
    }

    #[test]
    fn band_edges() {
        let inside = on_ground_looking_at(0.0, 1.0, -1.5); // 90 + 1.5
        assert!((target_heading(&inside) - 91.5).abs() < 1e-3);
        let past_max = on_ground_looking_at(0.0, 1.0, -3.0);
        assert_eq!(target_heading(&past_max), 0.0);

        // -90 - 9.5
        let inside_min = on_ground_looking_at(0.0, -1.0, 9.5);
        assert!((target_heading(&inside_min) + 99.5).abs() < 1e-3);
        // -90 - 10.5
        let past_min = on_ground_looking_at(0.0, -1.0, 10.5);
        assert_eq!(target_heading(&past_min), 0.0);
    }

    #[test]
    fn band_is_inclusive_at_both_ends() {
        assert!(in_bearing_band(-100.0));
        assert!(in_bearing_band(92.0));
        assert!(!in_bearing_band(-100.5));
        assert!(!in_bearing_band(92.5));
    }

    #[test]
    fn airborne_tracks_roll() {
        let mut state = AnimState::default();
        let inputs = SimInputs { roll_deg: -10.0, frame_period_s: 0.05, ..SimInputs::default() };
        update(&mut state, &inputs);
        // fraction = -10/25 = -0.4 → 150 * -0.4 * 0.05 = -3
        assert!((state.head_heading + 3.0).abs() < 1e-4);
    }

    #[test]
    fn heading_never_leaves_band() {
        let mut state = AnimState::default();
        let rolls = [90.0, -180.0, 45.0, 170.0, -75.0];
        let periods = [0.01, 0.5, 3.0, 10.0];
        for &roll in &rolls {
            for &dt in &periods {
                let inputs = SimInputs { roll_deg: roll, frame_period_s: dt, ..SimInputs::default() };
                for _ in 0..20 {
                    update(&mut state, &inputs);
                    assert!(state.head_heading.abs() <= HEAD_LIMIT);
                }
            }
        }
    }

    #[test]
    fn host_written_out_of_band_value_is_pulled_back() {
        let mut state = AnimState { head_heading: 120.0, ..AnimState::default() };
        update(&mut state, &SimInputs::default());
        assert_eq!(state.head_heading, HEAD_LIMIT);
    }
}
