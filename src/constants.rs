//! # Constants and type definitions for bispec21
//!
//! This module centralizes the **numerical constants**, **default triangle
//! configurations**, and **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - 2π and the fundamental-mode helper
//! - Default k-bin multipliers and opening-angle fractions for the isosceles sweep
//! - Unit type aliases used across the crate
//!
//! These definitions are shared by the bispectrum front-end and the spectral
//! backends.

// -------------------------------------------------------------------------------------------------
// Numerical constants
// -------------------------------------------------------------------------------------------------

/// 2π, useful for wavenumber conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Multipliers of the fundamental mode used for the default k bins.
///
/// Cubes carrying observational effects only resolve the largest scales, so the
/// default sweep stays at small k.
pub const DEFAULT_KBIN_MULTIPLIERS: [f64; 8] = [1., 2., 3., 4., 5., 6., 7., 8.];

/// Fractions of π used for the default opening angles between the two equal legs.
pub const DEFAULT_ANGLE_FRACTIONS: [f64; 10] =
    [0.05, 0.1, 0.2, 0.33, 0.4, 0.5, 0.6, 0.7, 0.85, 0.95];

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Wavenumber magnitude, in inverse length units of the box
pub type Wavenumber = f64;
/// Comoving length in megaparsecs (the usual box-size unit for 21-cm cubes)
pub type Mpc = f64;

/// Smallest non-zero wavenumber resolvable in a periodic box of the given size.
#[inline]
pub fn fundamental_mode(box_size: Mpc) -> Wavenumber {
    DPI / box_size
}
