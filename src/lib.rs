pub mod bispec_errors;
pub mod bispectrum;
pub mod constants;
pub mod field;
pub mod power_spectrum;
pub mod spectral;

pub use bispec_errors::BispecError;
pub use bispectrum::{Bispectrum, BispectrumEstimator};
pub use field::GridField;
pub use power_spectrum::{compute_power_spectrum_1d, KBinning, PowerSpectrum1d};
