//! Cabin door animation: eased opening, a short settle bounce near full
//! travel, and an eased close. The only retained phase state is
//! `AnimState::door_bounce`.

use dataref_schema::{AnimState, SimInputs};

/// Speed scale applied to every door phase (travel fraction per second).
pub const MAX_DOOR_SPEED: f32 = 0.8;
/// Opening speed is proportional to the distance from this virtual target.
const OPEN_TARGET: f32 = 1.5;
/// The bounce retracts towards this position.
const SETTLE_POSITION: f32 = 0.87;
/// Closing speed is proportional to the distance from this virtual target.
const CLOSE_TARGET: f32 = 1.2;
/// Bounce speeds below this snap to zero.
const SETTLE_SPEED: f32 = 0.01;

pub fn update(state: &mut AnimState, inputs: &SimInputs) {
    let dt = inputs.frame_period_s;
    let position = state.door_left;

    if inputs.door_request > 0.0 {
        if position < 1.0 && !state.door_bounce {
            let speed = MAX_DOOR_SPEED * (OPEN_TARGET - position);
            set_position(state, (position + speed * dt).min(1.0));
        } else {
            state.door_bounce = true;
            let mut speed = MAX_DOOR_SPEED * (position - SETTLE_POSITION);
            if speed < SETTLE_SPEED {
                speed = 0.0;
            }
            if speed > 0.0 {
                let mut next = position - speed * dt;
                if next < 0.0 {
                    next = 0.0;
                    state.door_bounce = false;
                }
                set_position(state, next);
            }
        }
    } else {
        state.door_bounce = false;
        let speed = MAX_DOOR_SPEED * (CLOSE_TARGET - position);
        if position > 0.0 {
            set_position(state, (position - speed * dt).max(0.0));
        }
    }
}

fn set_position(state: &mut AnimState, position: f32) {
    state.door_left = position;
    state.door_right = position;
}
