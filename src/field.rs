//! # Scalar fields on a periodic cubic grid
//!
//! [`GridField`] couples a 3D single-precision cube with the physical size of the
//! periodic box it samples. Construction validates the grid once, so every
//! estimator downstream can assume a non-empty cubic field and a positive box
//! size without re-checking.
//!
//! The dimensionality itself is enforced by [`ndarray::Array3`]: a caller cannot
//! hand the estimators a 2D or 4D array in the first place.

use ndarray::{Array3, ArrayView3};
use num_traits::AsPrimitive;

use crate::bispec_errors::BispecError;
use crate::constants::{fundamental_mode, Mpc, Wavenumber};

/// An immutable real-valued field sampled on a periodic cubic grid.
///
/// Samples are stored as `f32`: the spectral estimators work in single precision
/// regardless of the numeric type the cube was produced with.
#[derive(Debug, Clone)]
pub struct GridField {
    data: Array3<f32>,
    box_size: Mpc,
}

impl GridField {
    /// Wrap an owned single-precision cube.
    ///
    /// Arguments
    /// ---------------
    /// * `data`: the field samples, `n x n x n`
    /// * `box_size`: physical size of the cubic domain
    ///
    /// Return
    /// ----------
    /// * The validated field, or an invalid-input error if the grid is empty or
    ///   not cubic, or the box size is not a positive finite number.
    pub fn new(data: Array3<f32>, box_size: Mpc) -> Result<Self, BispecError> {
        let (nx, ny, nz) = data.dim();
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(BispecError::EmptyField);
        }
        if nx != ny || ny != nz {
            return Err(BispecError::NonCubicField(nx, ny, nz));
        }
        if !box_size.is_finite() || box_size <= 0.0 {
            return Err(BispecError::InvalidBoxSize(box_size));
        }
        Ok(Self { data, box_size })
    }

    /// Build a field from a view of any real numeric type, converting the
    /// samples to single precision.
    ///
    /// Arguments
    /// ---------------
    /// * `data`: a view of the field samples (`f64`, `f32`, integers, ...)
    /// * `box_size`: physical size of the cubic domain
    ///
    /// Return
    /// ----------
    /// * The validated field, or the same invalid-input errors as [`GridField::new`].
    pub fn from_array<T>(data: ArrayView3<'_, T>, box_size: Mpc) -> Result<Self, BispecError>
    where
        T: Copy + AsPrimitive<f32>,
    {
        Self::new(data.map(|v| v.as_()), box_size)
    }

    /// Number of grid points along one axis.
    #[inline]
    pub fn n(&self) -> usize {
        self.data.dim().0
    }

    /// Physical size of the cubic domain.
    #[inline]
    pub fn box_size(&self) -> Mpc {
        self.box_size
    }

    /// Smallest non-zero wavenumber resolvable in this box, `2π / box_size`.
    #[inline]
    pub fn fundamental_mode(&self) -> Wavenumber {
        fundamental_mode(self.box_size)
    }

    /// Nyquist wavenumber of the grid, `kF · n / 2`.
    #[inline]
    pub fn nyquist_mode(&self) -> Wavenumber {
        self.fundamental_mode() * (self.n() as f64) / 2.0
    }

    /// Read-only view of the samples.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}
