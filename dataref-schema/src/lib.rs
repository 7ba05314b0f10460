//! Shared dataref definitions for the Hughes 500D animation plugin and the
//! offline replay tool.
//!
//! `SimInputs` is what the plugin reads from X-Plane once per frame,
//! `AnimState` is what it owns and publishes, and `SimWrites` is the small set
//! of sim-owned values it pushes back. `CELLS` is the one table every host
//! accessor is built from.

use serde::{Deserialize, Serialize};

/// Number of blade-pitch cells published regardless of the aircraft's blade count.
pub const BLADE_CELLS: usize = 5;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Snapshot of every external dataref consumed during one flight-loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimInputs {
    // ── Timing ────────────────────────────────────────────────────────────────
    pub frame_period_s: f32,

    // ── Doors ─────────────────────────────────────────────────────────────────
    /// Flap request ratio; any positive value means "doors open".
    pub door_request: f32,

    // ── Rotor ─────────────────────────────────────────────────────────────────
    /// `POINT_tacrad`: 0 = main rotor, 1 = tail rotor, 4/5 = shudder phase.
    pub tacrad: [f32; 8],
    pub cyclic_elev_disc_tilt: f32,
    pub cyclic_ailn_disc_tilt: f32,
    pub acf_cyclic_elev: f32,
    pub acf_cyclic_ailn: f32,
    pub yoke_pitch_ratio: f32,
    pub yoke_roll_ratio: f32,
    pub collective_pitch_deg: f32,
    pub num_blades: f32,

    // ── Attitude / position ───────────────────────────────────────────────────
    pub on_ground: bool,
    pub roll_deg: f32,
    pub heading_deg: f32,
    pub local_x: f32,
    pub local_z: f32,
    pub view_x: f32,
    pub view_z: f32,

    // ── Audio panel ───────────────────────────────────────────────────────────
    pub audio_selector: i32,

    // ── Angular accelerations (read-modify-write) ────────────────────────────
    pub p_dot: f32,
    pub q_dot: f32,
}

// ── Owned state ───────────────────────────────────────────────────────────────

/// Every cell the plugin publishes, plus the retained door-bounce latch.
///
/// All fields start at zero; the host may overwrite any published cell
/// between ticks through the accessor table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimState {
    pub door_left: f32,
    pub door_right: f32,
    pub door_bounce: bool,

    pub adf1: f32,
    pub adf2: f32,
    pub com1: f32,
    pub com2: f32,
    pub dme: f32,
    pub nav1: f32,
    pub nav2: f32,

    pub tacrads_high_main: f32,
    pub tacrads_high_tail: f32,

    pub head_heading: f32,

    pub rotor_blades_pitch: [f32; BLADE_CELLS],
    pub rotor_muting_low_pitch: f32,
    pub rotor_muting_low_roll: f32,

    pub rotor_position_main: f32,
    pub rotor_position_main_muting: f32,
    pub rotor_position_tail: f32,
    pub rotor_position_tail_muting: f32,
    pub rotor_position_main_fps_muting: f32,
    pub rotor_position_tail_fps_muting: f32,
}

impl AnimState {
    /// Read the cell at `index` in [`CELLS`]; unknown indices read as 0.
    pub fn cell(&self, index: usize) -> f32 {
        CELLS.get(index).map_or(0.0, |c| (c.get)(self))
    }

    /// Write the cell at `index` in [`CELLS`]; unknown indices are ignored.
    pub fn set_cell(&mut self, index: usize, value: f32) {
        if let Some(c) = CELLS.get(index) {
            (c.set)(self, value);
        }
    }
}

// ── Write-back ────────────────────────────────────────────────────────────────

/// Sim-owned values the plugin overwrites at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimWrites {
    pub cyclic_elev_disc_tilt: f32,
    pub cyclic_ailn_disc_tilt: f32,
    pub p_dot: f32,
    pub q_dot: f32,
}

// ── Cell table ────────────────────────────────────────────────────────────────

/// A single host-visible float dataref backed by a field of [`AnimState`].
#[derive(Clone, Copy)]
pub struct CellDescriptor {
    pub path: &'static str,
    pub get: fn(&AnimState) -> f32,
    pub set: fn(&mut AnimState, f32),
}

impl std::fmt::Debug for CellDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellDescriptor").field("path", &self.path).finish()
    }
}

macro_rules! cell {
    ($path:expr, $($field:tt)+) => {
        CellDescriptor {
            path: $path,
            get: |s: &AnimState| s.$($field)+,
            set: |s: &mut AnimState, v: f32| s.$($field)+ = v,
        }
    };
}

/// Every published dataref, registered in this order.
pub const CELLS: [CellDescriptor; 25] = [
    cell!("abb/doors/left/cockpit/position",        door_left),
    cell!("abb/doors/right/cockpit/position",       door_right),
    cell!("abb/flags/audio/panel/adf1",             adf1),
    cell!("abb/flags/audio/panel/adf2",             adf2),
    cell!("abb/flags/audio/panel/com1",             com1),
    cell!("abb/flags/audio/panel/com2",             com2),
    cell!("abb/flags/audio/panel/dme",              dme),
    cell!("abb/flags/audio/panel/nav1",             nav1),
    cell!("abb/flags/audio/panel/nav2",             nav2),
    cell!("abb/flags/rotor/disc/tacrads/high/main", tacrads_high_main),
    cell!("abb/flags/rotor/disc/tacrads/high/tail", tacrads_high_tail),
    cell!("abb/pilot/head/heading/degrees",         head_heading),
    cell!("abb/rotor/blades/pitch/0",               rotor_blades_pitch[0]),
    cell!("abb/rotor/blades/pitch/1",               rotor_blades_pitch[1]),
    cell!("abb/rotor/blades/pitch/2",               rotor_blades_pitch[2]),
    cell!("abb/rotor/blades/pitch/3",               rotor_blades_pitch[3]),
    cell!("abb/rotor/blades/pitch/4",               rotor_blades_pitch[4]),
    cell!("abb/rotor/disc/tilt/pitch/muting/low",   rotor_muting_low_pitch),
    cell!("abb/rotor/disc/tilt/roll/muting/low",    rotor_muting_low_roll),
    cell!("abb/rotor/position/degrees/main",        rotor_position_main),
    cell!("abb/rotor/position/degrees/main/muting", rotor_position_main_muting),
    cell!("abb/rotor/position/degrees/tail",        rotor_position_tail),
    cell!("abb/rotor/position/degrees/tail/muting", rotor_position_tail_muting),
    cell!("abb/rotor/position/main/fps/muting",     rotor_position_main_fps_muting),
    cell!("abb/rotor/position/tail/fps/muting",     rotor_position_tail_fps_muting),
];

/// Index of the cell registered under `path`.
pub fn find_cell(path: &str) -> Option<usize> {
    CELLS.iter().position(|c| c.path == path)
}
