//! # Spectral estimation backends
//!
//! The bispectrum front-end does not own the FFT machinery. It talks to a
//! [`SpectralBackend`] chosen at construction time, in the same way the original
//! pipeline delegated the heavy lifting to an external spectral-estimation
//! toolkit. The trait keeps that collaborator swappable: the shipped
//! [`FftGridBackend`] computes shell-masked FFT estimates, and tests substitute
//! a canned backend to pin down the front-end arithmetic.
//!
//! A sweep evaluates one isosceles configuration family: the two equal legs
//! `k1 = k2` are fixed and the closing leg varies with the opening angle. The
//! result uses named fields throughout; which leg a power spectrum belongs to
//! is never encoded positionally.

pub mod fft_grid;

pub use fft_grid::FftGridBackend;

use crate::bispec_errors::BispecError;
use crate::constants::{Radian, Wavenumber};
use crate::field::GridField;

/// Closing-leg magnitude of a triangle with legs `k1`, `k2` and opening angle
/// `theta`, by the law of cosines.
///
/// `theta` is the angle between the `k1` and `k2` **vectors**, not the interior
/// angle of the triangle; the closing leg is `k3 = -(k1 + k2)`.
#[inline]
pub fn closing_leg(k1: Wavenumber, k2: Wavenumber, theta: Radian) -> Wavenumber {
    ((k2 * theta.sin()).powi(2) + (k2 * theta.cos() + k1).powi(2)).sqrt()
}

/// Closing-leg quantities for a single opening angle of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepLeg {
    /// Wavenumber of the closing leg targeted by the shell.
    pub k3: Wavenumber,
    /// Power spectrum at the closing leg.
    pub p3: f64,
    /// Raw (unnormalized) bispectrum of the triangle.
    pub b: f64,
}

/// Bulk result of one isosceles sweep: the two fixed legs, their power spectra,
/// and one [`SweepLeg`] per requested angle, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpectrum {
    pub k1: Wavenumber,
    pub k2: Wavenumber,
    /// Power spectrum at `k1`.
    pub p1: f64,
    /// Power spectrum at `k2`.
    pub p2: f64,
    pub legs: Vec<SweepLeg>,
}

/// Outcome of a sweep over one `(k1, k2)` pair.
///
/// A degenerate sweep is a recoverable per-row condition, not an error: a
/// requested shell may hold no grid modes, or no closed triangles exist for a
/// leg. Callers zero-fill the row instead of propagating a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    /// At least one leg of the sweep could not be estimated on this grid.
    Degenerate,
    /// Every leg was estimated.
    Spectrum(SweepSpectrum),
}

/// A bulk bispectrum/power-spectrum estimator over a 3D periodic grid.
pub trait SpectralBackend {
    /// Estimate the bispectrum of the isosceles triangles `(k1, k2, θ)` for
    /// every opening angle, together with the power spectrum of each leg.
    ///
    /// Arguments
    /// ---------------
    /// * `field`: the input cube, not mutated
    /// * `k1`, `k2`: magnitudes of the two fixed legs
    /// * `angles`: opening angles between the `k1` and `k2` vectors, in radians
    /// * `threads`: worker count forwarded to the backend's own pool
    ///
    /// Return
    /// ----------
    /// * One [`SweepOutcome`] covering all angles, or an invalid-input error
    ///   raised before any computation.
    fn isosceles_sweep(
        &self,
        field: &GridField,
        k1: Wavenumber,
        k2: Wavenumber,
        angles: &[Radian],
        threads: usize,
    ) -> Result<SweepOutcome, BispecError>;
}
