//! HughesPlugin — owns the animation state and bridges it to X-Plane.
//!
//! This module is free of any XPLM types so it can be fully unit-tested via
//! the `MockXplm` shim.

use anim_core::run_frame;
use dataref_schema::{AnimState, SimInputs, SimWrites, CELLS};
use thiserror::Error;

use crate::xplm_shim::{DataRefHandle, XplmApi};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Flight-loop return value asking to be called again next frame.
pub const FLIGHT_LOOP_EVERY_FRAME: f32 = -1.0;
pub const LOG_PREFIX: &str = "Hughes500D";

// ── X-Plane dataref paths ─────────────────────────────────────────────────────

pub(crate) mod paths {
    // Timing
    pub const FRAME_RATE_PERIOD: &str = "sim/operation/misc/frame_rate_period";
    // Doors
    pub const FLAP_REQUEST: &str = "sim/flightmodel/controls/flaprqst";
    // Rotor
    pub const POINT_TACRAD:          &str = "sim/flightmodel/engine/POINT_tacrad";
    pub const POINT_PITCH_DEG:       &str = "sim/flightmodel/engine/POINT_pitch_deg";
    pub const CYCLIC_ELEV_DISC_TILT: &str = "sim/flightmodel/cyclic/cyclic_elev_disc_tilt";
    pub const CYCLIC_AILN_DISC_TILT: &str = "sim/flightmodel/cyclic/cyclic_ailn_disc_tilt";
    pub const ACF_CYCLIC_ELEV:       &str = "sim/aircraft/vtolcontrols/acf_cyclic_elev";
    pub const ACF_CYCLIC_AILN:       &str = "sim/aircraft/vtolcontrols/acf_cyclic_ailn";
    pub const ACF_NUM_BLADES:        &str = "sim/aircraft/prop/acf_num_blades";
    pub const YOKE_PITCH_RATIO:      &str = "sim/joystick/yolk_pitch_ratio";
    pub const YOKE_ROLL_RATIO:       &str = "sim/joystick/yolk_roll_ratio";
    // Attitude / position
    pub const ON_GROUND_ANY: &str = "sim/flightmodel/failures/onground_any";
    pub const PHI:           &str = "sim/flightmodel/position/phi";
    pub const PSI:           &str = "sim/flightmodel/position/psi";
    pub const LOCAL_X:       &str = "sim/flightmodel/position/local_x";
    pub const LOCAL_Z:       &str = "sim/flightmodel/position/local_z";
    pub const VIEW_X:        &str = "sim/graphics/view/view_x";
    pub const VIEW_Z:        &str = "sim/graphics/view/view_z";
    // Audio panel
    pub const AUDIO_PANEL_OUT: &str = "sim/cockpit/switches/audio_panel_out";
    // Angular accelerations (read and written)
    pub const P_DOT: &str = "sim/flightmodel/position/P_dot";
    pub const Q_DOT: &str = "sim/flightmodel/position/Q_dot";
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("could not register dataref {path}")]
    Registration { path: String },

    #[error("plugin already started")]
    AlreadyStarted,

    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ── InputHandles ──────────────────────────────────────────────────────────────

/// Cached handles for every sim dataref the animations read, looked up once
/// at start. A missing dataref reads as zero.
#[derive(Default)]
pub struct InputHandles {
    pub frame_rate_period:     Option<DataRefHandle>,
    pub flap_request:          Option<DataRefHandle>,
    pub point_tacrad:          Option<DataRefHandle>,
    pub point_pitch_deg:       Option<DataRefHandle>,
    pub cyclic_elev_disc_tilt: Option<DataRefHandle>,
    pub cyclic_ailn_disc_tilt: Option<DataRefHandle>,
    pub acf_cyclic_elev:       Option<DataRefHandle>,
    pub acf_cyclic_ailn:       Option<DataRefHandle>,
    pub acf_num_blades:        Option<DataRefHandle>,
    pub yoke_pitch_ratio:      Option<DataRefHandle>,
    pub yoke_roll_ratio:       Option<DataRefHandle>,
    pub on_ground_any:         Option<DataRefHandle>,
    pub phi:                   Option<DataRefHandle>,
    pub psi:                   Option<DataRefHandle>,
    pub local_x:               Option<DataRefHandle>,
    pub local_z:               Option<DataRefHandle>,
    pub view_x:                Option<DataRefHandle>,
    pub view_z:                Option<DataRefHandle>,
    pub audio_panel_out:       Option<DataRefHandle>,
    pub p_dot:                 Option<DataRefHandle>,
    pub q_dot:                 Option<DataRefHandle>,
}

// ── HughesPlugin ──────────────────────────────────────────────────────────────

pub struct HughesPlugin {
    xplm:       Box<dyn XplmApi>,
    handles:    InputHandles,
    /// Accessor handles in `CELLS` order; empty until `register_cells`.
    registered: Vec<DataRefHandle>,
    state:      AnimState,
}

impl HughesPlugin {
    pub fn new(xplm: Box<dyn XplmApi>) -> Self {
        HughesPlugin {
            xplm,
            handles: InputHandles::default(),
            registered: Vec::new(),
            state: AnimState::default(),
        }
    }

    pub fn log(&self, message: &str) {
        self.xplm.log(&format!("{LOG_PREFIX}: {message}"));
    }

    // ── Handle caching ────────────────────────────────────────────────────────

    /// (Re-)fetch all input dataref handles.
    pub fn find_handles(&mut self) {
        macro_rules! find {
            ($field:ident, $path:expr) => {
                self.handles.$field = self.xplm.find_dataref($path);
                if self.handles.$field.is_none() {
                    self.log(&format!("dataref not found: {}", $path));
                }
            };
        }

        find!(frame_rate_period,     paths::FRAME_RATE_PERIOD);
        find!(flap_request,          paths::FLAP_REQUEST);
        find!(point_tacrad,          paths::POINT_TACRAD);
        find!(point_pitch_deg,       paths::POINT_PITCH_DEG);
        find!(cyclic_elev_disc_tilt, paths::CYCLIC_ELEV_DISC_TILT);
        find!(cyclic_ailn_disc_tilt, paths::CYCLIC_AILN_DISC_TILT);
        find!(acf_cyclic_elev,       paths::ACF_CYCLIC_ELEV);
        find!(acf_cyclic_ailn,       paths::ACF_CYCLIC_AILN);
        find!(acf_num_blades,        paths::ACF_NUM_BLADES);
        find!(yoke_pitch_ratio,      paths::YOKE_PITCH_RATIO);
        find!(yoke_roll_ratio,       paths::YOKE_ROLL_RATIO);
        find!(on_ground_any,         paths::ON_GROUND_ANY);
        find!(phi,                   paths::PHI);
        find!(psi,                   paths::PSI);
        find!(local_x,               paths::LOCAL_X);
        find!(local_z,               paths::LOCAL_Z);
        find!(view_x,                paths::VIEW_X);
        find!(view_z,                paths::VIEW_Z);
        find!(audio_panel_out,       paths::AUDIO_PANEL_OUT);
        find!(p_dot,                 paths::P_DOT);
        find!(q_dot,                 paths::Q_DOT);
    }

    // ── Cell registration ─────────────────────────────────────────────────────

    /// Publish one accessor per entry in [`CELLS`].
    ///
    /// On failure every accessor registered so far is released again.
    pub fn register_cells(&mut self) -> Result<(), PluginError> {
        for (index, cell) in CELLS.iter().enumerate() {
            match self.xplm.register_float_accessor(cell.path, index) {
                Some(h) => self.registered.push(h),
                None => {
                    self.log(&format!("failed to register {}", cell.path));
                    self.unregister_cells();
                    return Err(PluginError::Registration { path: cell.path.to_string() });
                }
            }
        }
        Ok(())
    }

    pub fn unregister_cells(&mut self) {
        for h in self.registered.drain(..) {
            self.xplm.unregister_accessor(h);
        }
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    // ── Accessor backing ──────────────────────────────────────────────────────

    pub fn cell(&self, index: usize) -> f32 {
        self.state.cell(index)
    }

    pub fn set_cell(&mut self, index: usize, value: f32) {
        self.state.set_cell(index, value);
    }

    pub fn state(&self) -> &AnimState {
        &self.state
    }

    pub fn state_json(&self) -> Result<String, PluginError> {
        Ok(serde_json::to_string(&self.state)?)
    }

    // ── Input snapshot ────────────────────────────────────────────────────────

    /// Read every consumed dataref. `elapsed` stands in for the frame period
    /// when the sim does not publish one.
    pub fn read_inputs(&self, elapsed: f32) -> SimInputs {
        let gf = |h: Option<DataRefHandle>| h.map_or(0.0_f32, |h| self.xplm.get_float(h));
        let gi = |h: Option<DataRefHandle>| h.map_or(0_i32, |h| self.xplm.get_int(h));
        let first = |h: Option<DataRefHandle>| {
            let mut v = [0f32; 1];
            if let Some(h) = h { self.xplm.get_float_array(h, 0, &mut v); }
            v[0]
        };

        let mut tacrad = [0f32; 8];
        if let Some(h) = self.handles.point_tacrad {
            self.xplm.get_float_array(h, 0, &mut tacrad);
        }

        SimInputs {
            frame_period_s:        self.handles.frame_rate_period.map_or(elapsed, |h| self.xplm.get_float(h)),
            door_request:          gf(self.handles.flap_request),
            tacrad,
            cyclic_elev_disc_tilt: first(self.handles.cyclic_elev_disc_tilt),
            cyclic_ailn_disc_tilt: first(self.handles.cyclic_ailn_disc_tilt),
            acf_cyclic_elev:       gf(self.handles.acf_cyclic_elev),
            acf_cyclic_ailn:       gf(self.handles.acf_cyclic_ailn),
            yoke_pitch_ratio:      gf(self.handles.yoke_pitch_ratio),
            yoke_roll_ratio:       gf(self.handles.yoke_roll_ratio),
            collective_pitch_deg:  first(self.handles.point_pitch_deg),
            num_blades:            first(self.handles.acf_num_blades),
            on_ground:             gi(self.handles.on_ground_any) != 0,
            roll_deg:              gf(self.handles.phi),
            heading_deg:           gf(self.handles.psi),
            local_x:               gf(self.handles.local_x),
            local_z:               gf(self.handles.local_z),
            view_x:                gf(self.handles.view_x),
            view_z:                gf(self.handles.view_z),
            audio_selector:        gi(self.handles.audio_panel_out),
            p_dot:                 gf(self.handles.p_dot),
            q_dot:                 gf(self.handles.q_dot),
        }
    }

    fn write_back(&self, writes: &SimWrites) {
        if let Some(h) = self.handles.cyclic_elev_disc_tilt {
            self.xplm.set_float_array(h, 0, &[writes.cyclic_elev_disc_tilt]);
        }
        if let Some(h) = self.handles.cyclic_ailn_disc_tilt {
            self.xplm.set_float_array(h, 0, &[writes.cyclic_ailn_disc_tilt]);
        }
        if let Some(h) = self.handles.p_dot {
            self.xplm.set_float(h, writes.p_dot);
        }
        if let Some(h) = self.handles.q_dot {
            self.xplm.set_float(h, writes.q_dot);
        }
    }

    // ── Flight loop tick ──────────────────────────────────────────────────────

    /// Called from the X-Plane flight loop callback.
    ///
    /// Returns [`FLIGHT_LOOP_EVERY_FRAME`] so the callback runs every frame.
    pub fn flight_loop_tick(&mut self, elapsed: f32) -> f32 {
        let inputs = self.read_inputs(elapsed);
        let writes = run_frame(&mut self.state, &inputs);
        self.write_back(&writes);
        FLIGHT_LOOP_EVERY_FRAME
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xplm_shim::{DataRefValue, MockXplm};
    use dataref_schema::find_cell;
    use std::sync::Arc;

    /// Shares one mock between the plugin and the test body.
    struct SharedMock(Arc<MockXplm>);

    impl XplmApi for SharedMock {
        fn find_dataref(&self, path: &str) -> Option<DataRefHandle> { self.0.find_dataref(path) }
        fn get_float(&self, h: DataRefHandle) -> f32 { self.0.get_float(h) }
        fn get_int(&self, h: DataRefHandle) -> i32 { self.0.get_int(h) }
        fn get_float_array(&self, h: DataRefHandle, offset: usize, out: &mut [f32]) {
            self.0.get_float_array(h, offset, out)
        }
        fn set_float(&self, h: DataRefHandle, v: f32) { self.0.set_float(h, v) }
        fn set_float_array(&self, h: DataRefHandle, offset: usize, values: &[f32]) {
            self.0.set_float_array(h, offset, values)
        }
        fn register_float_accessor(&self, path: &str, cell: usize) -> Option<DataRefHandle> {
            self.0.register_float_accessor(path, cell)
        }
        fn unregister_accessor(&self, h: DataRefHandle) { self.0.unregister_accessor(h) }
        fn log(&self, message: &str) { self.0.log(message) }
    }

    fn make_mock() -> Arc<MockXplm> {
        let m = MockXplm::new();
        // Populate every dataref the plugin will try to read.
        m.set_dataref(paths::FRAME_RATE_PERIOD,     DataRefValue::Float(0.05));
        m.set_dataref(paths::FLAP_REQUEST,          DataRefValue::Float(0.0));
        m.set_dataref(paths::POINT_TACRAD,          DataRefValue::FloatArray(vec![40.0, 200.0, 0.0, 0.0, 30.0, 50.0, 0.0, 0.0]));
        m.set_dataref(paths::POINT_PITCH_DEG,       DataRefValue::FloatArray(vec![6.0]));
        m.set_dataref(paths::CYCLIC_ELEV_DISC_TILT, DataRefValue::FloatArray(vec![1.5]));
        m.set_dataref(paths::CYCLIC_AILN_DISC_TILT, DataRefValue::FloatArray(vec![-0.5]));
        m.set_dataref(paths::ACF_CYCLIC_ELEV,       DataRefValue::Float(10.0));
        m.set_dataref(paths::ACF_CYCLIC_AILN,       DataRefValue::Float(8.0));
        m.set_dataref(paths::ACF_NUM_BLADES,        DataRefValue::FloatArray(vec![5.0]));
        m.set_dataref(paths::YOKE_PITCH_RATIO,      DataRefValue::Float(0.1));
        m.set_dataref(paths::YOKE_ROLL_RATIO,       DataRefValue::Float(-0.2));
        m.set_dataref(paths::ON_GROUND_ANY,         DataRefValue::Int(0));
        m.set_dataref(paths::PHI,                   DataRefValue::Float(12.0));
        m.set_dataref(paths::PSI,                   DataRefValue::Float(90.0));
        m.set_dataref(paths::LOCAL_X,               DataRefValue::Float(0.0));
        m.set_dataref(paths::LOCAL_Z,               DataRefValue::Float(0.0));
        m.set_dataref(paths::VIEW_X,                DataRefValue::Float(0.0));
        m.set_dataref(paths::VIEW_Z,                DataRefValue::Float(0.0));
        m.set_dataref(paths::AUDIO_PANEL_OUT,       DataRefValue::Int(10));
        m.set_dataref(paths::P_DOT,                 DataRefValue::Float(0.4));
        m.set_dataref(paths::Q_DOT,                 DataRefValue::Float(-0.2));
        Arc::new(m)
    }

    fn make_plugin(mock: &Arc<MockXplm>) -> HughesPlugin {
        let mut plugin = HughesPlugin::new(Box::new(SharedMock(Arc::clone(mock))));
        plugin.find_handles();
        plugin
    }

    #[test]
    fn registers_every_cell_in_order() {
        let mock = make_mock();
        let mut plugin = make_plugin(&mock);
        plugin.register_cells().unwrap();

        let registered = mock.registered_accessors();
        assert_eq!(registered.len(), CELLS.len());
        assert_eq!(plugin.registered_count(), CELLS.len());
        for (i, (path, cell)) in registered.iter().enumerate() {
            assert_eq!(path, CELLS[i].path);
            assert_eq!(*cell, i);
        }
    }

    #[test]
    fn failed_registration_releases_earlier_cells() {
        let mock = make_mock();
        mock.reject_accessor("abb/pilot/head/heading/degrees");
        let mut plugin = make_plugin(&mock);

        let err = plugin.register_cells().unwrap_err();
        assert!(matches!(err, PluginError::Registration { ref path } if path == "abb/pilot/head/heading/degrees"));
        assert!(mock.registered_accessors().is_empty());
        assert_eq!(plugin.registered_count(), 0);
        assert!(mock.log_messages().iter().any(|m| m.contains("failed to register")));
    }

    #[test]
    fn unregister_releases_all_cells() {
        let mock = make_mock();
        let mut plugin = make_plugin(&mock);
        plugin.register_cells().unwrap();
        plugin.unregister_cells();
        assert!(mock.registered_accessors().is_empty());
        assert_eq!(plugin.registered_count(), 0);
    }

    #[test]
    fn reads_all_inputs() {
        let mock = make_mock();
        let plugin = make_plugin(&mock);
        let inputs = plugin.read_inputs(1.0);

        assert!((inputs.frame_period_s - 0.05).abs() < 1e-6);
        assert_eq!(inputs.tacrad[1], 200.0);
        assert_eq!(inputs.tacrad[5], 50.0);
        assert_eq!(inputs.collective_pitch_deg, 6.0);
        assert_eq!(inputs.cyclic_elev_disc_tilt, 1.5);
        assert_eq!(inputs.num_blades, 5.0);
        assert!(!inputs.on_ground);
        assert_eq!(inputs.heading_deg, 90.0);
        assert_eq!(inputs.audio_selector, 10);
    }

    #[test]
    fn missing_inputs_read_as_zero_and_are_logged() {
        let mock = Arc::new(MockXplm::new());
        mock.set_dataref(paths::PHI, DataRefValue::Float(5.0));
        let plugin = make_plugin(&mock);
        let inputs = plugin.read_inputs(0.02);

        assert_eq!(inputs.roll_deg, 5.0);
        assert_eq!(inputs.tacrad, [0.0; 8]);
        assert_eq!(inputs.p_dot, 0.0);
        // frame period falls back to the callback's elapsed time
        assert!((inputs.frame_period_s - 0.02).abs() < 1e-6);

        let logs = mock.log_messages();
        assert!(logs.iter().any(|m| m == "Hughes500D: dataref not found: sim/flightmodel/engine/POINT_tacrad"));
        assert!(!logs.iter().any(|m| m.contains(paths::PHI)));
    }

    #[test]
    fn tick_runs_every_frame_and_writes_back() {
        let mock = make_mock();
        let mut plugin = make_plugin(&mock);

        assert_eq!(plugin.flight_loop_tick(0.05), FLIGHT_LOOP_EVERY_FRAME);

        // main rotor above threshold: real disc tilt is zeroed in the sim
        assert_eq!(mock.dataref(paths::CYCLIC_ELEV_DISC_TILT), Some(DataRefValue::FloatArray(vec![0.0])));
        assert_eq!(mock.dataref(paths::CYCLIC_AILN_DISC_TILT), Some(DataRefValue::FloatArray(vec![0.0])));
        assert_eq!(plugin.state().rotor_muting_low_pitch, 1.5);

        let expected_p = 0.4 + (30.0_f32 * 0.03).sin() * 40.0 * 0.05;
        match mock.dataref(paths::P_DOT) {
            Some(DataRefValue::Float(p)) => assert!((p - expected_p).abs() < 1e-5),
            other => panic!("unexpected P_dot {other:?}"),
        }
        assert_eq!(plugin.state().com1, 1.0);
        assert!(plugin.state().head_heading > 0.0);

        let written: Vec<String> = mock.set_float_calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(written, [
            paths::CYCLIC_ELEV_DISC_TILT,
            paths::CYCLIC_AILN_DISC_TILT,
            paths::P_DOT,
            paths::Q_DOT,
        ]);
    }

    #[test]
    fn host_write_is_seen_next_tick() {
        let mock = make_mock();
        let mut plugin = make_plugin(&mock);
        let idx = find_cell("abb/rotor/position/degrees/main").unwrap();
        plugin.set_cell(idx, 719.0);

        plugin.flight_loop_tick(0.05);

        // 719 + 40 rad/s * 0.05 s in degrees, wrapped once
        let expected = 719.0 + 40.0_f32.to_degrees() * 0.05 - 720.0;
        assert!((plugin.cell(idx) - expected).abs() < 1e-3);
    }

    #[test]
    fn doors_open_on_flap_request() {
        let mock = make_mock();
        mock.set_dataref(paths::FLAP_REQUEST, DataRefValue::Float(1.0));
        let mut plugin = make_plugin(&mock);

        for _ in 0..20 {
            plugin.flight_loop_tick(0.05);
        }
        let state = plugin.state();
        assert!(state.door_left > 0.5);
        assert_eq!(state.door_left, state.door_right);
    }

    #[test]
    fn state_json_names_fields() {
        let mock = make_mock();
        let mut plugin = make_plugin(&mock);
        plugin.flight_loop_tick(0.05);
        let json = plugin.state_json().unwrap();
        assert!(json.contains("\"rotor_position_main\""));
        assert!(json.contains("\"door_bounce\":false"));
    }
}
