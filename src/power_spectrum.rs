//! # Spherically averaged 1D power spectrum
//!
//! Companion statistic to the bispectrum sweep: `P(k)` averaged over spherical
//! shells of the k-grid, with an optional dimensionless normalization
//! `Δ²(k) = P(k) · k³ / (2π²)`.

use crate::bispec_errors::BispecError;
use crate::constants::Wavenumber;
use crate::field::GridField;
use crate::spectral::FftGridBackend;

/// How to bin the k-grid for the 1D power spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum KBinning {
    /// Linear bins between the fundamental mode and the Nyquist mode.
    Count(usize),
    /// Explicit bin edges, finite, positive and strictly increasing.
    Edges(Vec<Wavenumber>),
}

/// Spherically averaged power spectrum, one entry per non-empty bin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerSpectrum1d {
    /// Mean mode magnitude of each bin.
    pub k: Vec<Wavenumber>,
    /// `P(k)`, or `Δ²(k)` when the spectrum was normalized.
    pub pk: Vec<f64>,
}

/// Compute the spherically averaged power spectrum of `field`.
///
/// Arguments
/// ---------------
/// * `field`: the input cube; not mutated
/// * `binning`: bin count or explicit edges, see [`KBinning`]
/// * `normalize`: return the dimensionless `Δ²(k) = P(k)·k³/(2π²)` instead of
///   `P(k)`
///
/// Return
/// ----------
/// * A [`PowerSpectrum1d`] over the non-empty bins, or an invalid-input error
///   for an empty binning or malformed edges.
pub fn compute_power_spectrum_1d(
    field: &GridField,
    binning: &KBinning,
    normalize: bool,
) -> Result<PowerSpectrum1d, BispecError> {
    let edges = resolve_edges(field, binning)?;
    let (k, mut pk) = FftGridBackend::new().binned_power(field, &edges);

    if normalize {
        for (p, &kv) in pk.iter_mut().zip(k.iter()) {
            *p *= kv.powi(3) / (2.0 * std::f64::consts::PI.powi(2));
        }
    }

    Ok(PowerSpectrum1d { k, pk })
}

fn resolve_edges(field: &GridField, binning: &KBinning) -> Result<Vec<Wavenumber>, BispecError> {
    match binning {
        KBinning::Count(0) => Err(BispecError::EmptyBinning),
        KBinning::Count(n) => {
            let lo = field.fundamental_mode();
            let hi = field.nyquist_mode();
            let step = (hi - lo) / *n as f64;
            Ok((0..=*n).map(|i| lo + step * i as f64).collect())
        }
        KBinning::Edges(edges) => {
            if edges.len() < 2 {
                return Err(BispecError::EmptyBinning);
            }
            let well_formed = edges.iter().all(|e| e.is_finite() && *e > 0.0)
                && edges.windows(2).all(|w| w[0] < w[1]);
            if !well_formed {
                return Err(BispecError::InvalidBinEdges);
            }
            Ok(edges.clone())
        }
    }
}

#[cfg(test)]
mod power_spectrum_test {
    use super::*;
    use crate::constants::DPI;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn unit_field(n: usize, box_size: f64) -> GridField {
        GridField::new(Array3::from_elem((n, n, n), 1.0), box_size).unwrap()
    }

    #[test]
    fn test_count_binning_spans_fundamental_to_nyquist() {
        let field = unit_field(16, 100.0);
        let edges = resolve_edges(&field, &KBinning::Count(5)).unwrap();
        assert_eq!(edges.len(), 6);
        assert_relative_eq!(edges[0], field.fundamental_mode(), epsilon = 1e-14);
        assert_relative_eq!(edges[5], field.nyquist_mode(), epsilon = 1e-14);
    }

    #[test]
    fn test_rejects_bad_binnings() {
        let field = unit_field(8, 100.0);
        assert_eq!(
            resolve_edges(&field, &KBinning::Count(0)).unwrap_err(),
            BispecError::EmptyBinning
        );
        assert_eq!(
            resolve_edges(&field, &KBinning::Edges(vec![0.1])).unwrap_err(),
            BispecError::EmptyBinning
        );
        assert_eq!(
            resolve_edges(&field, &KBinning::Edges(vec![0.2, 0.1])).unwrap_err(),
            BispecError::InvalidBinEdges
        );
        assert_eq!(
            resolve_edges(&field, &KBinning::Edges(vec![-0.1, 0.1])).unwrap_err(),
            BispecError::InvalidBinEdges
        );
    }

    #[test]
    fn test_constant_field_has_no_power_off_dc() {
        // All power of a constant cube sits in the excluded k = 0 mode
        let field = unit_field(16, 100.0);
        let ps = compute_power_spectrum_1d(&field, &KBinning::Count(6), false).unwrap();
        for p in &ps.pk {
            assert_relative_eq!(*p, 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_dimensionless_normalization() {
        let field = unit_field(16, 100.0);
        let raw = compute_power_spectrum_1d(&field, &KBinning::Count(4), false).unwrap();
        let norm = compute_power_spectrum_1d(&field, &KBinning::Count(4), true).unwrap();
        assert_eq!(raw.k, norm.k);
        for ((p, d), k) in raw.pk.iter().zip(&norm.pk).zip(&raw.k) {
            assert_relative_eq!(
                *d,
                p * k.powi(3) / (2.0 * std::f64::consts::PI.powi(2)),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_uses_dpi_constant_consistently() {
        // kF edge equals 2π / box_size
        let field = unit_field(8, DPI);
        let edges = resolve_edges(&field, &KBinning::Count(2)).unwrap();
        assert_relative_eq!(edges[0], 1.0, epsilon = 1e-14);
    }
}
