use bispec21::GridField;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Cube of independent standard-normal samples with a fixed seed.
pub fn noise_field(n: usize, box_size: f64, seed: u64) -> GridField {
    let mut rng = StdRng::seed_from_u64(seed);
    let cube = Array3::from_shape_fn((n, n, n), |_| {
        let x: f64 = StandardNormal.sample(&mut rng);
        x as f32
    });
    GridField::new(cube, box_size).unwrap()
}
