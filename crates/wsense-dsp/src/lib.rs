//! # WSense-DSP
//!
//! Numeric conditioning for stacked CSI tensors.
//!
//! Raw channel matrices carry acquisition artifacts that must be removed
//! before a classifier sees them:
//!
//! 1. **Linear phase ramp**: sampling-frequency offset and packet detection
//!    delay add a phase slope across subcarriers, removed per `(time,
//!    antenna)` lane by [`calibrate_phase`].
//! 2. **Amplitude noise**: hardware glitches and interference ride on each
//!    per-subcarrier magnitude time series, shrunk by the VisuShrink
//!    wavelet scheme in [`WaveletDenoiser`], degrading to the identity
//!    whenever decomposition is infeasible.
//! 3. **Ragged time axes**: captures differ in length; [`resize_to_fixed_length`]
//!    pads or truncates to the dataset's fixed window.
//!
//! All operations take `[time, frequency, antenna]` tensors and are pure.

pub mod phase;
pub mod resize;
pub mod wavelet;

pub use phase::calibrate_phase;
pub use resize::{resize_tensor, resize_to_fixed_length};
pub use wavelet::WaveletDenoiser;
