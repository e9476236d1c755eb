mod common;

use std::sync::{Arc, Mutex};

use bispec21::bispectrum::{isosceles_k3, BispectrumEstimator};
use bispec21::constants::{fundamental_mode, Radian, Wavenumber};
use bispec21::spectral::{SpectralBackend, SweepLeg, SweepOutcome, SweepSpectrum};
use bispec21::{BispecError, GridField};

use approx::assert_relative_eq;
use common::noise_field;

/// Canned backend: hands back a fixed power level and bispectrum value for
/// every leg, and records the sweeps it was asked for.
struct CannedBackend {
    power: f64,
    raw_b: f64,
    degenerate: bool,
    calls: Arc<Mutex<Vec<(Wavenumber, Wavenumber, usize)>>>,
}

impl CannedBackend {
    fn new(power: f64, raw_b: f64) -> Self {
        Self {
            power,
            raw_b,
            degenerate: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn degenerate() -> Self {
        Self {
            degenerate: true,
            ..Self::new(0.0, 0.0)
        }
    }
}

impl SpectralBackend for CannedBackend {
    fn isosceles_sweep(
        &self,
        _field: &GridField,
        k1: Wavenumber,
        k2: Wavenumber,
        angles: &[Radian],
        _threads: usize,
    ) -> Result<SweepOutcome, BispecError> {
        self.calls.lock().unwrap().push((k1, k2, angles.len()));
        if self.degenerate {
            return Ok(SweepOutcome::Degenerate);
        }
        let legs = angles
            .iter()
            .map(|&theta| SweepLeg {
                k3: isosceles_k3(k1, theta),
                p3: self.power,
                b: self.raw_b,
            })
            .collect();
        Ok(SweepOutcome::Spectrum(SweepSpectrum {
            k1,
            k2,
            p1: self.power,
            p2: self.power,
            legs,
        }))
    }
}

#[test]
fn test_raw_values_pass_through_without_normalization() {
    let field = noise_field(8, 100.0, 1);
    let estimator = BispectrumEstimator::with_backend(CannedBackend::new(4.0, 1.25e3));
    let result = estimator.compute(&field, None, None, false).unwrap();

    assert!(!result.is_empty());
    for &b in &result.b {
        assert_eq!(b, 1.25e3);
    }
}

#[test]
fn test_reduced_normalization_formula() {
    let power = 4.0;
    let raw_b = 1.25e3;
    let field = noise_field(8, 100.0, 1);
    let estimator = BispectrumEstimator::with_backend(CannedBackend::new(power, raw_b));
    let result = estimator.compute(&field, None, None, true).unwrap();

    assert!(!result.is_empty());
    for ((&k1, &k3), &b) in result.k1.iter().zip(&result.k3).zip(&result.b) {
        let normal_fac = (power * power * power / (k1 * k1 * k3)).sqrt();
        assert_relative_eq!(b, raw_b / normal_fac, epsilon = 1e-12);
    }
}

#[test]
fn test_degenerate_rows_zero_fill() {
    let field = noise_field(8, 100.0, 1);
    let estimator = BispectrumEstimator::with_backend(CannedBackend::degenerate());
    let result = estimator.compute(&field, None, None, true).unwrap();

    assert!(!result.is_empty());
    for &b in &result.b {
        assert_eq!(b, 0.0);
    }
}

#[test]
fn test_zero_power_legs_zero_fill_under_normalization_only() {
    let field = noise_field(8, 100.0, 1);

    let normalized = BispectrumEstimator::with_backend(CannedBackend::new(0.0, 7.0))
        .compute(&field, None, None, true)
        .unwrap();
    for &b in &normalized.b {
        assert_eq!(b, 0.0);
    }

    let raw = BispectrumEstimator::with_backend(CannedBackend::new(0.0, 7.0))
        .compute(&field, None, None, false)
        .unwrap();
    for &b in &raw.b {
        assert_eq!(b, 7.0);
    }
}

#[test]
fn test_one_bulk_sweep_per_kbin_with_equal_legs() {
    let field = noise_field(8, 100.0, 1);
    let kf = fundamental_mode(100.0);
    let kbins = [2.0 * kf, 3.0 * kf, 4.0 * kf];

    let backend = CannedBackend::new(1.0, 1.0);
    let calls = Arc::clone(&backend.calls);
    let estimator = BispectrumEstimator::with_backend(backend);
    estimator.compute(&field, Some(&kbins), None, true).unwrap();

    let calls = calls.lock().unwrap();
    // One bulk sweep per k bin that retains at least one triangle, all ten
    // default angles in a single call, and k1 = k2 throughout
    assert_eq!(calls.len(), kbins.len());
    for ((k1, k2, n_angles), &kbin) in calls.iter().zip(kbins.iter()) {
        assert_relative_eq!(*k1, kbin, epsilon = 1e-14);
        assert_relative_eq!(*k2, kbin, epsilon = 1e-14);
        assert_eq!(*n_angles, 10);
    }
}

#[test]
fn test_retained_triangles_are_ordered_row_major() {
    let field = noise_field(8, 100.0, 1);
    let estimator = BispectrumEstimator::with_backend(CannedBackend::new(1.0, 1.0));
    let result = estimator.compute(&field, None, None, false).unwrap();

    // k1 never decreases along the output, and k3 matches the law of cosines
    // bookkeeping for its own k1
    assert!(result.k1.windows(2).all(|w| w[0] <= w[1]));
    let kf = fundamental_mode(100.0);
    for (&k1, &k3) in result.k1.iter().zip(&result.k3) {
        assert!(k1 >= kf);
        assert!(k3 > 0.0);
    }
}
