//! Audio-panel selector → one-hot radio flags.

use dataref_schema::{AnimState, SimInputs};

/// Radio selected by an `audio_panel_out` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radio {
    Nav1,
    Nav2,
    Adf1,
    Adf2,
    Dme,
    Com1,
    Com2,
}

impl Radio {
    /// Codes 4, 6–9 and anything outside the panel's range map to nothing.
    pub fn from_selector(code: i32) -> Option<Self> {
        match code {
            0  => Some(Self::Nav1),
            1  => Some(Self::Nav2),
            2  => Some(Self::Adf1),
            3  => Some(Self::Adf2),
            5  => Some(Self::Dme),
            10 => Some(Self::Com1),
            11 => Some(Self::Com2),
            _  => None,
        }
    }
}

/// Unrecognised selector codes leave every flag as it was.
pub fn update(state: &mut AnimState, inputs: &SimInputs) {
    let Some(radio) = Radio::from_selector(inputs.audio_selector) else { return };

    let flag = |r: Radio| if r == radio { 1.0 } else { 0.0 };
    state.adf1 = flag(Radio::Adf1);
    state.adf2 = flag(Radio::Adf2);
    state.com1 = flag(Radio::Com1);
    state.com2 = flag(Radio::Com2);
    state.dme  = flag(Radio::Dme);
    state.nav1 = flag(Radio::Nav1);
    state.nav2 = flag(Radio::Nav2);
}
