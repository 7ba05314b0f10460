//! Hughes 500D animation plugin for X-Plane.
//!
//! Compiles to a `.xpl` shared library loaded by X-Plane. The `XPLM*` entry
//! points below are only present in non-test builds; unit tests use `MockXplm`
//! and call `HughesPlugin` methods directly.

pub mod plugin;
pub mod xplm_shim;

pub const PLUGIN_NAME: &str = "Hughes 500D";
pub const PLUGIN_SIGNATURE: &str = "de.bwravencl.hughes_500d";
pub const PLUGIN_DESCRIPTION: &str = "Hughes 500D provides advanced animations for the Hughes 500D!";

// Raw X-Plane SDK extern declarations, production builds only.
// Symbols are resolved at runtime by X-Plane when the .xpl is loaded.
#[cfg(not(test))]
pub(crate) mod xplm_sys {
    use std::ffi::{c_char, c_double, c_float, c_int, c_void};

    pub type XPLMDataRef = *mut c_void;
    pub type XPLMDataTypeID = c_int;

    pub const XPLM_TYPE_FLOAT: XPLMDataTypeID = 2;

    pub type GetDataiF  = unsafe extern "C" fn(*mut c_void) -> c_int;
    pub type SetDataiF  = unsafe extern "C" fn(*mut c_void, c_int);
    pub type GetDatafF  = unsafe extern "C" fn(*mut c_void) -> c_float;
    pub type SetDatafF  = unsafe extern "C" fn(*mut c_void, c_float);
    pub type GetDatadF  = unsafe extern "C" fn(*mut c_void) -> c_double;
    pub type SetDatadF  = unsafe extern "C" fn(*mut c_void, c_double);
    pub type GetDataviF = unsafe extern "C" fn(*mut c_void, *mut c_int, c_int, c_int) -> c_int;
    pub type SetDataviF = unsafe extern "C" fn(*mut c_void, *mut c_int, c_int, c_int);
    pub type GetDatavfF = unsafe extern "C" fn(*mut c_void, *mut c_float, c_int, c_int) -> c_int;
    pub type SetDatavfF = unsafe extern "C" fn(*mut c_void, *mut c_float, c_int, c_int);
    pub type GetDatabF  = unsafe extern "C" fn(*mut c_void, *mut c_void, c_int, c_int) -> c_int;
    pub type SetDatabF  = unsafe extern "C" fn(*mut c_void, *mut c_void, c_int, c_int);

    pub type FlightLoopF = unsafe extern "C" fn(f32, f32, c_int, *mut c_void) -> f32;

    extern "C" {
        pub fn XPLMFindDataRef(inDataRefName: *const c_char) -> XPLMDataRef;
        pub fn XPLMGetDataf(inDataRef: XPLMDataRef) -> c_float;
        pub fn XPLMGetDatai(inDataRef: XPLMDataRef) -> c_int;
        pub fn XPLMGetDatavf(
            inDataRef:  XPLMDataRef,
            outValues:  *mut c_float,
            inOffset:   c_int,
            inMax:      c_int,
        ) -> c_int;
        pub fn XPLMSetDataf(inDataRef: XPLMDataRef, inValue: c_float);
        pub fn XPLMSetDatavf(
            inDataRef: XPLMDataRef,
            inValues:  *mut c_float,
            inoffset:  c_int,
            inCount:   c_int,
        );
        pub fn XPLMRegisterDataAccessor(
            inDataName:    *const c_char,
            inDataType:    XPLMDataTypeID,
            inIsWritable:  c_int,
            inReadInt:     Option<GetDataiF>,
            inWriteInt:    Option<SetDataiF>,
            inReadFloat:   Option<GetDatafF>,
            inWriteFloat:  Option<SetDatafF>,
            inReadDouble:  Option<GetDatadF>,
            inWriteDouble: Option<SetDatadF>,
            inReadIntArray:    Option<GetDataviF>,
            inWriteIntArray:   Option<SetDataviF>,
            inReadFloatArray:  Option<GetDatavfF>,
            inWriteFloatArray: Option<SetDatavfF>,
            inReadData:    Option<GetDatabF>,
            inWriteData:   Option<SetDatabF>,
            inReadRefcon:  *mut c_void,
            inWriteRefcon: *mut c_void,
        ) -> XPLMDataRef;
        pub fn XPLMUnregisterDataAccessor(inDataRef: XPLMDataRef);
        pub fn XPLMDebugString(inString: *const c_char);
        pub fn XPLMRegisterFlightLoopCallback(
            inFlightLoop: Option<FlightLoopF>,
            inInterval:   c_float,
            inRefcon:     *mut c_void,
        );
        pub fn XPLMUnregisterFlightLoopCallback(
            inFlightLoop: Option<FlightLoopF>,
            inRefcon:     *mut c_void,
        );
    }
}

// ── XPLM entry points (production only) ──────────────────────────────────────

#[cfg(not(test))]
pub(crate) use entry::{read_cell_cb, write_cell_cb};

#[cfg(not(test))]
mod entry {
    use super::plugin::{HughesPlugin, PluginError, FLIGHT_LOOP_EVERY_FRAME, LOG_PREFIX};
    use super::xplm_shim::RealXplm;
    use super::{PLUGIN_DESCRIPTION, PLUGIN_NAME, PLUGIN_SIGNATURE};
    use std::ffi::{c_float, c_int, c_void, CString};
    use std::sync::{Mutex, OnceLock};

    static PLUGIN: OnceLock<Mutex<HughesPlugin>> = OnceLock::new();

    #[no_mangle]
    pub unsafe extern "C" fn XPluginStart(
        out_name: *mut std::ffi::c_char,
        out_sig:  *mut std::ffi::c_char,
        out_desc: *mut std::ffi::c_char,
    ) -> c_int {
        write_cstr(out_name, PLUGIN_NAME);
        write_cstr(out_sig,  PLUGIN_SIGNATURE);
        write_cstr(out_desc, PLUGIN_DESCRIPTION);

        match start() {
            Ok(()) => {
                log("XPluginStart OK");
                1
            }
            Err(e) => {
                log(&format!("XPluginStart failed: {e}"));
                0
            }
        }
    }

    fn start() -> Result<(), PluginError> {
        if PLUGIN.get().is_some() {
            return Err(PluginError::AlreadyStarted);
        }
        let mut plugin = HughesPlugin::new(Box::new(RealXplm));
        plugin.register_cells()?;
        plugin.find_handles();
        PLUGIN
            .set(Mutex::new(plugin))
            .map_err(|_| PluginError::AlreadyStarted)
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginStop() {
        if let Some(plugin) = PLUGIN.get() {
            if let Ok(mut p) = plugin.lock() {
                p.unregister_cells();
                match p.state_json() {
                    Ok(json) => p.log(&format!("final state {json}")),
                    Err(e)   => p.log(&format!("{e}")),
                }
            }
        }
        log("XPluginStop");
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginEnable() -> c_int {
        if PLUGIN.get().is_none() {
            log("XPluginEnable: plugin not initialized");
            return 0;
        }
        super::xplm_sys::XPLMRegisterFlightLoopCallback(
            Some(flight_loop_cb),
            FLIGHT_LOOP_EVERY_FRAME,
            std::ptr::null_mut(),
        );
        log("XPluginEnable OK");
        1
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginDisable() {
        super::xplm_sys::XPLMUnregisterFlightLoopCallback(
            Some(flight_loop_cb),
            std::ptr::null_mut(),
        );
        log("XPluginDisable");
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginReceiveMessage(
        _from:  c_int,
        _msg:   c_int,
        _param: *mut c_void,
    ) {
        // No inter-plugin messages handled.
    }

    unsafe extern "C" fn flight_loop_cb(
        since_last_call:   f32,
        _since_last_floop: f32,
        _counter:          c_int,
        _refcon:           *mut c_void,
    ) -> f32 {
        if let Some(plugin) = PLUGIN.get() {
            if let Ok(mut p) = plugin.lock() {
                return p.flight_loop_tick(since_last_call);
            }
        }
        FLIGHT_LOOP_EVERY_FRAME
    }

    // Accessor callbacks shared by every published cell; the refcon is the
    // cell's index in `CELLS`. `try_lock` so a read issued while the flight
    // loop holds the plugin returns 0 instead of deadlocking.

    pub unsafe extern "C" fn read_cell_cb(refcon: *mut c_void) -> c_float {
        PLUGIN
            .get()
            .and_then(|p| p.try_lock().ok())
            .map_or(0.0, |p| p.cell(refcon as usize))
    }

    pub unsafe extern "C" fn write_cell_cb(refcon: *mut c_void, value: c_float) {
        if let Some(mut p) = PLUGIN.get().and_then(|p| p.try_lock().ok()) {
            p.set_cell(refcon as usize, value);
        }
    }

    fn log(msg: &str) {
        if let Ok(c) = CString::new(format!("{LOG_PREFIX}: {msg}\n")) {
            unsafe { super::xplm_sys::XPLMDebugString(c.as_ptr()) }
        }
    }

    unsafe fn write_cstr(dst: *mut std::ffi::c_char, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(255);
        std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const std::ffi::c_char, dst, len);
        *dst.add(len) = 0;
    }
}

// ── Re-exports ───────────────────────────────────────────────────────────────

pub use dataref_schema::{AnimState, CELLS};
pub use plugin::{HughesPlugin, PluginError, FLIGHT_LOOP_EVERY_FRAME};
