//! # Shell-masked FFT estimator
//!
//! [`FftGridBackend`] estimates the bispectrum and per-leg power spectra of a
//! periodic cube with the classic shell-masking construction: forward-transform
//! the field once, carve a spherical shell of modes around each requested leg,
//! and inverse-transform both the masked spectrum and the bare mask back to
//! configuration space. Summing the product of the three masked fields counts
//! every closed `k1 + k2 + k3 = 0` triangle at once, and the same sum over the
//! unit masks provides the triangle count that normalizes it:
//!
//! ```text
//! B(k1, k2, k3) = (V² / N⁹) · Σₓ D₁D₂D₃ / Σₓ U₁U₂U₃
//! P(k)          = (V / N⁶)  · ⟨|δₖ|²⟩ over the shell
//! ```
//!
//! with `V` the box volume and `N` the grid side. All transforms run in single
//! precision; the reductions accumulate in `f64`.

use itertools::izip;
use ndarray::{Array3, Axis, Zip};
use rayon::prelude::*;
use rustfft::{num_complex::Complex32, FftPlanner};

use super::{closing_leg, SpectralBackend, SweepLeg, SweepOutcome, SweepSpectrum};
use crate::bispec_errors::BispecError;
use crate::constants::{Radian, Wavenumber};
use crate::field::GridField;

/// FFT-based spectral backend over the native simulation grid.
#[derive(Debug, Clone)]
pub struct FftGridBackend {
    /// Shell half-width in units of the fundamental mode.
    half_width_modes: f64,
}

impl Default for FftGridBackend {
    fn default() -> Self {
        // One fundamental mode per shell
        Self {
            half_width_modes: 0.5,
        }
    }
}

impl FftGridBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the shell half-width, in units of the fundamental mode.
    ///
    /// Wider shells trade k-resolution for more modes (and triangles) per
    /// estimate.
    pub fn with_shell_half_width(mut self, modes: f64) -> Self {
        self.half_width_modes = modes;
        self
    }

    /// Spherically averaged power spectrum over caller-supplied bin edges.
    ///
    /// Arguments
    /// ---------------
    /// * `field`: the input cube
    /// * `edges`: strictly increasing bin edges; a mode at magnitude `k` lands
    ///   in bin `i` when `edges[i] <= k < edges[i + 1]`
    ///
    /// Return
    /// ----------
    /// * `(k, pk)`: per non-empty bin, the mean mode magnitude and the power
    ///   spectrum estimate. Empty bins are dropped.
    pub fn binned_power(&self, field: &GridField, edges: &[f64]) -> (Vec<Wavenumber>, Vec<f64>) {
        if edges.len() < 2 {
            return (Vec::new(), Vec::new());
        }
        let nf = field.n() as f64;
        let volume = field.box_size().powi(3);
        let dk = delta_k(field);
        let kmag = mode_magnitudes(field.n(), field.fundamental_mode());

        let nbins = edges.len() - 1;
        let mut ksum = vec![0.0f64; nbins];
        let mut psum = vec![0.0f64; nbins];
        let mut counts = vec![0usize; nbins];

        for (d, &km) in dk.iter().zip(kmag.iter()) {
            if km <= 0.0 || km < edges[0] || km >= edges[nbins] {
                continue;
            }
            let bin = edges.partition_point(|&e| e <= km) - 1;
            ksum[bin] += km;
            psum[bin] += d.norm_sqr() as f64;
            counts[bin] += 1;
        }

        let mut k_out = Vec::with_capacity(nbins);
        let mut pk_out = Vec::with_capacity(nbins);
        for (ks, ps, count) in izip!(ksum, psum, counts) {
            if count == 0 {
                continue;
            }
            k_out.push(ks / count as f64);
            pk_out.push(volume / nf.powi(6) * ps / count as f64);
        }
        (k_out, pk_out)
    }
}

impl SpectralBackend for FftGridBackend {
    fn isosceles_sweep(
        &self,
        field: &GridField,
        k1: Wavenumber,
        k2: Wavenumber,
        angles: &[Radian],
        threads: usize,
    ) -> Result<SweepOutcome, BispecError> {
        for k in [k1, k2] {
            if !k.is_finite() || k <= 0.0 {
                return Err(BispecError::InvalidKBin(k));
            }
        }
        for &theta in angles {
            if !theta.is_finite() || theta <= 0.0 || theta >= std::f64::consts::PI {
                return Err(BispecError::InvalidAngle(theta));
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()?;

        let nf = field.n() as f64;
        let volume = field.box_size().powi(3);
        let half_width = self.half_width_modes * field.fundamental_mode();

        let dk = delta_k(field);
        let kmag = mode_magnitudes(field.n(), field.fundamental_mode());

        let Some(shell1) = carve_shell(&dk, &kmag, k1, half_width, volume) else {
            return Ok(SweepOutcome::Degenerate);
        };
        let equal_legs = (k2 - k1).abs() <= f64::EPSILON * k1.max(k2);
        let shell2_own = if equal_legs {
            None
        } else {
            match carve_shell(&dk, &kmag, k2, half_width, volume) {
                Some(shell) => Some(shell),
                None => return Ok(SweepOutcome::Degenerate),
            }
        };
        let shell2 = shell2_own.as_ref().unwrap_or(&shell1);

        let legs: Vec<Option<SweepLeg>> = pool.install(|| {
            angles
                .par_iter()
                .map(|&theta| {
                    let k3 = closing_leg(k1, k2, theta);
                    let shell3 = carve_shell(&dk, &kmag, k3, half_width, volume)?;

                    let mut num = 0.0f64;
                    let mut den = 0.0f64;
                    for (d1, d2, d3, u1, u2, u3) in izip!(
                        shell1.d.iter(),
                        shell2.d.iter(),
                        shell3.d.iter(),
                        shell1.u.iter(),
                        shell2.u.iter(),
                        shell3.u.iter()
                    ) {
                        num += d1 * d2 * d3;
                        den += u1 * u2 * u3;
                    }
                    // den approximates N³ · (closed-triangle count)
                    if den < 0.5 * nf.powi(3) {
                        return None;
                    }
                    Some(SweepLeg {
                        k3,
                        p3: shell3.power,
                        b: volume.powi(2) / nf.powi(9) * num / den,
                    })
                })
                .collect()
        });

        let mut out = Vec::with_capacity(legs.len());
        for leg in legs {
            match leg {
                Some(leg) => out.push(leg),
                None => return Ok(SweepOutcome::Degenerate),
            }
        }

        Ok(SweepOutcome::Spectrum(SweepSpectrum {
            k1,
            k2,
            p1: shell1.power,
            p2: shell2.power,
            legs: out,
        }))
    }
}

/// One spherical shell of modes, inverse-transformed to configuration space.
struct Shell {
    /// Real part of the inverse transform of the masked spectrum.
    d: Array3<f64>,
    /// Real part of the inverse transform of the bare mask.
    u: Array3<f64>,
    /// Power spectrum of the shell.
    power: f64,
}

/// Mask the modes with `||k| - center| <= half_width`, inverse-transform the
/// masked spectrum and the mask, and average the shell power. Returns `None`
/// when the shell holds no grid mode.
fn carve_shell(
    dk: &Array3<Complex32>,
    kmag: &Array3<f64>,
    center: Wavenumber,
    half_width: f64,
    volume: f64,
) -> Option<Shell> {
    let nf = dk.len_of(Axis(0)) as f64;
    let mut masked = Array3::<Complex32>::zeros(dk.raw_dim());
    let mut unit = Array3::<Complex32>::zeros(dk.raw_dim());
    let mut count = 0usize;
    let mut power_sum = 0.0f64;

    Zip::from(&mut masked)
        .and(&mut unit)
        .and(dk)
        .and(kmag)
        .for_each(|m, u, &d, &km| {
            if km > 0.0 && (km - center).abs() <= half_width {
                *m = d;
                *u = Complex32::new(1.0, 0.0);
                count += 1;
                power_sum += d.norm_sqr() as f64;
            }
        });

    if count == 0 {
        return None;
    }

    fft3(&mut masked, true);
    fft3(&mut unit, true);

    // The shell is symmetric under k -> -k, so both transforms are real up to
    // rounding; keep the real part only.
    Some(Shell {
        d: masked.map(|c| c.re as f64),
        u: unit.map(|c| c.re as f64),
        power: volume / nf.powi(6) * power_sum / count as f64,
    })
}

/// Forward transform of the field samples, unnormalized.
fn delta_k(field: &GridField) -> Array3<Complex32> {
    let mut dk = field.data().map(|&v| Complex32::new(v, 0.0));
    fft3(&mut dk, false);
    dk
}

/// In-place 3D FFT, applied lane by lane along each axis. Neither direction is
/// normalized, matching the estimator prefactors above.
fn fft3(data: &mut Array3<Complex32>, inverse: bool) {
    let mut planner = FftPlanner::<f32>::new();
    for axis in 0..3 {
        let len = data.len_of(Axis(axis));
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };
        let mut buf = vec![Complex32::new(0.0, 0.0); len];
        for mut lane in data.lanes_mut(Axis(axis)) {
            for (b, v) in buf.iter_mut().zip(lane.iter()) {
                *b = *v;
            }
            fft.process(&mut buf);
            for (v, b) in lane.iter_mut().zip(buf.iter()) {
                *v = *b;
            }
        }
    }
}

/// Magnitude of the wavevector carried by every grid mode, with the usual
/// signed DFT frequency layout along each axis.
fn mode_magnitudes(n: usize, kf: Wavenumber) -> Array3<f64> {
    let modes: Vec<f64> = (0..n).map(|i| signed_mode(i, n)).collect();
    Array3::from_shape_fn((n, n, n), |(i, j, l)| {
        kf * (modes[i].powi(2) + modes[j].powi(2) + modes[l].powi(2)).sqrt()
    })
}

#[inline]
fn signed_mode(i: usize, n: usize) -> f64 {
    if i <= n / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}
