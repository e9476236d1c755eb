//! # Isosceles-configuration bispectrum
//!
//! Front-end estimator for the bispectrum of a 21-cm cube over a grid of
//! isosceles triangle configurations: the two equal legs `k1 = k2` run over the
//! requested k bins and the closing leg follows the opening angle between the
//! `k1` and `k2` vectors. The heavy spectral work is delegated to a
//! [`SpectralBackend`] chosen when the estimator is built.
//!
//! ## Overview
//!
//! - One bulk backend call per k bin covers every opening angle at once
//! - Optional reduced-bispectrum normalization `B / √(P₁P₂P₃ / (k₁k₂k₃))`
//!   (Watkinson et al. 2019)
//! - Degenerate rows (a fully ionized cube has no power at some leg) come back
//!   as zeros instead of failing the whole sweep
//! - Only triangles whose closing leg satisfies `kF < k3 < max(kbins)` are
//!   returned; the rest are dropped, not zeroed

use ndarray::Array2;

use crate::bispec_errors::BispecError;
use crate::constants::{
    fundamental_mode, Mpc, Radian, Wavenumber, DEFAULT_ANGLE_FRACTIONS, DEFAULT_KBIN_MULTIPLIERS,
};
use crate::field::GridField;
use crate::spectral::{closing_leg, FftGridBackend, SpectralBackend, SweepOutcome};

/// Default k bins for a box of the given size: the fundamental mode times
/// [`DEFAULT_KBIN_MULTIPLIERS`].
pub fn default_kbins(box_size: Mpc) -> Vec<Wavenumber> {
    let kf = fundamental_mode(box_size);
    DEFAULT_KBIN_MULTIPLIERS.iter().map(|m| kf * m).collect()
}

/// Default opening angles: [`DEFAULT_ANGLE_FRACTIONS`] times π.
pub fn default_angles() -> Vec<Radian> {
    DEFAULT_ANGLE_FRACTIONS
        .iter()
        .map(|f| f * std::f64::consts::PI)
        .collect()
}

/// Closing-leg magnitude of the isosceles triangle with legs `k` and opening
/// angle `theta`: `k3 = √((k·sinθ)² + (k·cosθ + k)²)`.
#[inline]
pub fn isosceles_k3(k: Wavenumber, theta: Radian) -> Wavenumber {
    closing_leg(k, k, theta)
}

/// Validity mask over the `(kbin, angle)` grid: `true` where the closing leg
/// satisfies `kF < k3 < max(kbins)`.
pub fn valid_triangles(box_size: Mpc, kbins: &[Wavenumber], angles: &[Radian]) -> Array2<bool> {
    let kf = fundamental_mode(box_size);
    let kmax = kbins.last().copied().unwrap_or(0.0);
    Array2::from_shape_fn((kbins.len(), angles.len()), |(i, j)| {
        let k3 = isosceles_k3(kbins[i], angles[j]);
        k3 > kf && k3 < kmax
    })
}

/// Bispectrum of the retained triangles, one entry per triangle.
///
/// The three vectors always have the same length. `k1` is the magnitude of the
/// two equal legs, `k3` the law-of-cosines closing leg, and `b` the raw or
/// normalized bispectrum value depending on the `normalize` flag of the call
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bispectrum {
    pub k1: Vec<Wavenumber>,
    pub k3: Vec<Wavenumber>,
    pub b: Vec<f64>,
}

impl Bispectrum {
    /// Number of retained triangles.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }
}

/// Bispectrum estimator over isosceles triangle configurations.
///
/// The backend is fixed at construction time; [`FftGridBackend`] is the
/// default. The worker count is an opaque performance knob forwarded to the
/// backend unchanged.
#[derive(Debug, Clone)]
pub struct BispectrumEstimator<B = FftGridBackend> {
    backend: B,
    threads: usize,
}

impl BispectrumEstimator<FftGridBackend> {
    /// Estimator backed by the shell-masked FFT implementation.
    pub fn new() -> Self {
        Self::with_backend(FftGridBackend::new())
    }
}

impl Default for BispectrumEstimator<FftGridBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SpectralBackend> BispectrumEstimator<B> {
    /// Estimator over a caller-supplied spectral backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            threads: 1,
        }
    }

    /// Set the worker count forwarded to the backend.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Compute the (optionally normalized) bispectrum of `field` over every
    /// `(kbin, angle)` isosceles configuration, keeping only triangles with
    /// `kF < k3 < max(kbins)`.
    ///
    /// Arguments
    /// ---------------
    /// * `field`: the input cube; not mutated
    /// * `kbins`: ordered wavenumber magnitudes for the two equal legs, or
    ///   `None` for `kF · [1..8]`
    /// * `angles`: ordered opening angles in `(0, π)`, or `None` for the
    ///   default 10-angle sweep
    /// * `normalize`: divide each value by `√(P₁P₂P₃ / (k₁k₂k₃))`
    ///
    /// Return
    /// ----------
    /// * A [`Bispectrum`] with one entry per retained triangle. All triangles
    ///   filtered out yields empty vectors, not an error.
    pub fn compute(
        &self,
        field: &GridField,
        kbins: Option<&[Wavenumber]>,
        angles: Option<&[Radian]>,
        normalize: bool,
    ) -> Result<Bispectrum, BispecError> {
        let kbins = match kbins {
            Some(bins) => {
                for &k in bins {
                    if !k.is_finite() || k <= 0.0 {
                        return Err(BispecError::InvalidKBin(k));
                    }
                }
                bins.to_vec()
            }
            None => default_kbins(field.box_size()),
        };
        let angles = match angles {
            Some(list) => {
                for &theta in list {
                    if !theta.is_finite() || theta <= 0.0 || theta >= std::f64::consts::PI {
                        return Err(BispecError::InvalidAngle(theta));
                    }
                }
                list.to_vec()
            }
            None => default_angles(),
        };

        let mut result = Bispectrum::default();
        if kbins.is_empty() || angles.is_empty() {
            return Ok(result);
        }

        let retained = valid_triangles(field.box_size(), &kbins, &angles);

        for (row, &k) in kbins.iter().enumerate() {
            if !retained.row(row).iter().any(|&keep| keep) {
                continue;
            }

            let outcome = self
                .backend
                .isosceles_sweep(field, k, k, &angles, self.threads)?;
            let values = self.row_values(outcome, angles.len(), normalize);

            for (col, (&theta, value)) in angles.iter().zip(values).enumerate() {
                if retained[[row, col]] {
                    result.k1.push(k);
                    result.k3.push(isosceles_k3(k, theta));
                    result.b.push(value);
                }
            }
        }

        Ok(result)
    }

    /// Map one sweep outcome to the per-angle bispectrum values of its row.
    /// Degenerate rows, including a zero-power leg under normalization, are
    /// zero-filled rather than propagated.
    fn row_values(&self, outcome: SweepOutcome, n_angles: usize, normalize: bool) -> Vec<f64> {
        let sweep = match outcome {
            SweepOutcome::Degenerate => return vec![0.0; n_angles],
            SweepOutcome::Spectrum(sweep) => sweep,
        };

        if !normalize {
            return sweep.legs.iter().map(|leg| leg.b).collect();
        }

        let zero_power =
            sweep.p1 <= 0.0 || sweep.p2 <= 0.0 || sweep.legs.iter().any(|leg| leg.p3 <= 0.0);
        if zero_power {
            return vec![0.0; n_angles];
        }

        sweep
            .legs
            .iter()
            .map(|leg| {
                let normal_fac =
                    (sweep.p1 * sweep.p2 * leg.p3 / (sweep.k1 * sweep.k2 * leg.k3)).sqrt();
                leg.b / normal_fac
            })
            .collect()
    }
}
