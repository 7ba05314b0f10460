//! XPLM abstraction layer.
//!
//! All X-Plane SDK calls go through the `XplmApi` trait so that unit tests can
//! substitute `MockXplm` without a running simulator.

/// Opaque handle to a cached X-Plane dataref (pointer-sized).
pub type DataRefHandle = usize;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Abstraction over all XPLM dataref operations used by the plugin.
///
/// `Send + Sync` so the trait object can live in a global `OnceLock`.
pub trait XplmApi: Send + Sync {
    fn find_dataref(&self, path: &str) -> Option<DataRefHandle>;
    fn get_float(&self, handle: DataRefHandle) -> f32;
    fn get_int(&self, handle: DataRefHandle) -> i32;
    /// Read up to `out.len()` floats starting at `offset`.
    fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]);
    fn set_float(&self, handle: DataRefHandle, value: f32);
    /// Write `values` starting at `offset`.
    fn set_float_array(&self, handle: DataRefHandle, offset: usize, values: &[f32]);
    /// Publish a writable float dataref whose accessors resolve to `cell`
    /// (an index into `dataref_schema::CELLS`).
    fn register_float_accessor(&self, path: &str, cell: usize) -> Option<DataRefHandle>;
    fn unregister_accessor(&self, handle: DataRefHandle);
    fn log(&self, message: &str);
}

#[cfg(any(test, feature = "mock_xplm"))]
pub use mock::{DataRefValue, MockXplm};

// ── MockXplm ─────────────────────────────────────────────────────────────────

#[cfg(any(test, feature = "mock_xplm"))]
mod mock {
    use super::{DataRefHandle, XplmApi};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Accessor handles start here so they never collide with dataref handles.
    const ACCESSOR_HANDLE_BASE: DataRefHandle = 1 << 20;

    /// Value stored in the mock shim for a single dataref.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DataRefValue {
        Float(f32),
        Int(i32),
        FloatArray(Vec<f32>),
    }

    struct MockInner {
        datarefs: HashMap<String, DataRefValue>,
        /// handle → canonical path (assigned on first `find_dataref` call)
        handles: Vec<String>,
        /// accessor slot → (path, cell index); `None` once unregistered
        accessors: Vec<Option<(String, usize)>>,
        rejected_accessors: Vec<String>,
        set_float_log: Vec<(String, f32)>,
        log_messages: Vec<String>,
    }

    /// Test double: serves preset datarefs and records every write, accessor and log line.
    pub struct MockXplm {
        inner: Mutex<MockInner>,
    }

    impl MockXplm {
        pub fn new() -> Self {
            MockXplm {
                inner: Mutex::new(MockInner {
                    datarefs:           HashMap::new(),
                    handles:            Vec::new(),
                    accessors:          Vec::new(),
                    rejected_accessors: Vec::new(),
                    set_float_log:      Vec::new(),
                    log_messages:       Vec::new(),
                }),
            }
        }

        /// Pre-populate a dataref value before calling `find_dataref`.
        pub fn set_dataref(&self, path: &str, value: DataRefValue) {
            self.inner.lock().unwrap().datarefs.insert(path.to_string(), value);
        }

        /// Current value of a dataref, including anything the plugin wrote.
        pub fn dataref(&self, path: &str) -> Option<DataRefValue> {
            self.inner.lock().unwrap().datarefs.get(path).cloned()
        }

        /// Make `register_float_accessor` fail for `path`.
        pub fn reject_accessor(&self, path: &str) {
            self.inner.lock().unwrap().rejected_accessors.push(path.to_string());
        }

        /// Paths of all accessors currently registered, in registration order.
        pub fn registered_accessors(&self) -> Vec<(String, usize)> {
            self.inner.lock().unwrap().accessors.iter().flatten().cloned().collect()
        }

        /// Snapshot the recorded `set_float` / `set_float_array` calls (path, value).
        pub fn set_float_calls(&self) -> Vec<(String, f32)> {
            self.inner.lock().unwrap().set_float_log.clone()
        }

        /// Snapshot all logged messages.
        pub fn log_messages(&self) -> Vec<String> {
            self.inner.lock().unwrap().log_messages.clone()
        }
    }

    impl Default for MockXplm {
        fn default() -> Self {
            Self::new()
        }
    }

    impl XplmApi for MockXplm {
        fn find_dataref(&self, path: &str) -> Option<DataRefHandle> {
            let mut g = self.inner.lock().unwrap();
            if !g.datarefs.contains_key(path) {
                return None;
            }
            // Reuse existing handle if already assigned.
            if let Some(idx) = g.handles.iter().position(|p| p == path) {
                return Some(idx);
            }
            let idx = g.handles.len();
            g.handles.push(path.to_string());
            Some(idx)
        }

        fn get_float(&self, handle: DataRefHandle) -> f32 {
            let g = self.inner.lock().unwrap();
            let path = g.handles.get(handle).cloned().unwrap_or_default();
            match g.datarefs.get(&path) {
                Some(DataRefValue::Float(v)) => *v,
                Some(DataRefValue::Int(v))   => *v as f32,
                _ => 0.0,
            }
        }

        fn get_int(&self, handle: DataRefHandle) -> i32 {
            let g = self.inner.lock().unwrap();
            let path = g.handles.get(handle).cloned().unwrap_or_default();
            match g.datarefs.get(&path) {
                Some(DataRefValue::Int(v))   => *v,
                Some(DataRefValue::Float(v)) => *v as i32,
                _ => 0,
            }
        }

        fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]) {
            let g = self.inner.lock().unwrap();
            let path = g.handles.get(handle).cloned().unwrap_or_default();
            if let Some(DataRefValue::FloatArray(arr)) = g.datarefs.get(&path) {
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = arr.get(offset + i).copied().unwrap_or(0.0);
                }
            }
        }

        fn set_float(&self, handle: DataRefHandle, value: f32) {
            let mut g = self.inner.lock().unwrap();
            let path = g.handles.get(handle).cloned().unwrap_or_default();
            g.datarefs.insert(path.clone(), DataRefValue::Float(value));
            g.set_float_log.push((path, value));
        }

        fn set_float_array(&self, handle: DataRefHandle, offset: usize, values: &[f32]) {
            let mut g = self.inner.lock().unwrap();
            let path = g.handles.get(handle).cloned().unwrap_or_default();
            let mut arr = match g.datarefs.get(&path) {
                Some(DataRefValue::FloatArray(arr)) => arr.clone(),
                _ => Vec::new(),
            };
            if arr.len() < offset + values.len() {
                arr.resize(offset + values.len(), 0.0);
            }
            arr[offset..offset + values.len()].copy_from_slice(values);
            g.datarefs.insert(path.clone(), DataRefValue::FloatArray(arr));
            for &v in values {
                g.set_float_log.push((path.clone(), v));
            }
        }

        fn register_float_accessor(&self, path: &str, cell: usize) -> Option<DataRefHandle> {
            let mut g = self.inner.lock().unwrap();
            if g.rejected_accessors.iter().any(|p| p == path) {
                return None;
            }
            g.accessors.push(Some((path.to_string(), cell)));
            Some(ACCESSOR_HANDLE_BASE + g.accessors.len() - 1)
        }

        fn unregister_accessor(&self, handle: DataRefHandle) {
            let mut g = self.inner.lock().unwrap();
            if let Some(slot) = handle
                .checked_sub(ACCESSOR_HANDLE_BASE)
                .and_then(|i| g.accessors.get_mut(i))
            {
                *slot = None;
            }
        }

        fn log(&self, message: &str) {
            self.inner.lock().unwrap().log_messages.push(message.to_string());
        }
    }
}

// ── RealXplm — only compiled in production (not test) builds ─────────────────

#[cfg(not(test))]
pub use real::RealXplm;

#[cfg(not(test))]
mod real {
    use super::{DataRefHandle, XplmApi};
    use crate::xplm_sys::{self, XPLM_TYPE_FLOAT};
    use std::ffi::{c_void, CString};

    /// Production implementation — wraps raw XPLM extern calls.
    pub struct RealXplm;

    impl XplmApi for RealXplm {
        fn find_dataref(&self, path: &str) -> Option<DataRefHandle> {
            let c = CString::new(path).ok()?;
            let h = unsafe { xplm_sys::XPLMFindDataRef(c.as_ptr()) };
            if h.is_null() { None } else { Some(h as usize) }
        }

        fn get_float(&self, handle: DataRefHandle) -> f32 {
            unsafe { xplm_sys::XPLMGetDataf(handle as _) }
        }

        fn get_int(&self, handle: DataRefHandle) -> i32 {
            unsafe { xplm_sys::XPLMGetDatai(handle as _) }
        }

        fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]) {
            unsafe {
                xplm_sys::XPLMGetDatavf(
                    handle as _,
                    out.as_mut_ptr(),
                    offset as i32,
                    out.len() as i32,
                );
            }
        }

        fn set_float(&self, handle: DataRefHandle, value: f32) {
            unsafe { xplm_sys::XPLMSetDataf(handle as _, value) }
        }

        fn set_float_array(&self, handle: DataRefHandle, offset: usize, values: &[f32]) {
            // XPLMSetDatavf takes a mutable pointer but does not write through it.
            let mut buf = values.to_vec();
            unsafe {
                xplm_sys::XPLMSetDatavf(
                    handle as _,
                    buf.as_mut_ptr(),
                    offset as i32,
                    buf.len() as i32,
                );
            }
        }

        fn register_float_accessor(&self, path: &str, cell: usize) -> Option<DataRefHandle> {
            let c = CString::new(path).ok()?;
            let refcon = cell as *mut c_void;
            let h = unsafe {
                xplm_sys::XPLMRegisterDataAccessor(
                    c.as_ptr(),
                    XPLM_TYPE_FLOAT,
                    1,
                    None, None,
                    Some(crate::read_cell_cb),
                    Some(crate::write_cell_cb),
                    None, None,
                    None, None,
                    None, None,
                    None, None,
                    refcon,
                    refcon,
                )
            };
            if h.is_null() { None } else { Some(h as usize) }
        }

        fn unregister_accessor(&self, handle: DataRefHandle) {
            unsafe { xplm_sys::XPLMUnregisterDataAccessor(handle as _) }
        }

        fn log(&self, message: &str) {
            if let Ok(c) = CString::new(format!("{message}\n")) {
                unsafe { xplm_sys::XPLMDebugString(c.as_ptr()) }
            }
        }
    }
}
