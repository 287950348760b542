//!
//! # Sequential Ray Tracing
//!
//! Exact geometric propagation of light through an ordered stack of optical
//! surfaces: ray-surface intersection, Snell refraction and law-of-reflection
//! applied surface by surface. The library returns plain data (intersection
//! points, directions, bundle statistics); plotting belongs to the consumer.

pub mod aperture;
pub mod bundle;
pub mod frame;
pub mod medium;
pub mod ray;
pub mod surface;
pub mod system;
pub mod trace;

pub use aperture::Aperture;
pub use bundle::{new_bundle, BundleBuilder, Pattern, RayBundle, SpotStatistics};
pub use frame::Frame;
pub use medium::Medium;
pub use ray::{new_ray, NewRay, Ray};
pub use surface::{Intersection, Shape, Surface};
pub use system::{Element, OpticalSystem, SystemBuilder};
pub use trace::{trace, trace_bundle, PathRecord, TraceOutcome, TracedPath};

use thiserror::Error;

pub type Vector = [f64; 3];

#[derive(Debug, Error)]
pub enum OpticsError {
    /// Malformed optical system description, raised at construction
    #[error("invalid optical system: {0}")]
    InvalidSystem(String),
    /// Malformed ray, raised at ray construction
    #[error("invalid ray: {0}")]
    InvalidRay(String),
}
pub type Result<T> = std::result::Result<T, OpticsError>;

pub trait Arithmetic {
    fn dot(&self, other: &[f64]) -> f64;
    fn norm_square(&self) -> f64;
    fn norm(&self) -> f64;
    fn normalize(&mut self) -> Self;
    fn add(&self, other: Self) -> Self;
    fn sub(&self, other: Self) -> Self;
    fn scale(&self, s: f64) -> Self;
}
impl Arithmetic for Vector {
    fn dot(&self, other: &[f64]) -> f64 {
        self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
    }
    fn norm_square(&self) -> f64 {
        self.dot(self)
    }
    fn norm(&self) -> f64 {
        self.norm_square().sqrt()
    }
    fn normalize(&mut self) -> Self {
        let n = self.norm();
        self[0] /= n;
        self[1] /= n;
        self[2] /= n;
        *self
    }
    fn add(&self, other: Self) -> Self {
        [self[0] + other[0], self[1] + other[1], self[2] + other[2]]
    }
    fn sub(&self, other: Self) -> Self {
        [self[0] - other[0], self[1] - other[1], self[2] - other[2]]
    }
    fn scale(&self, s: f64) -> Self {
        [self[0] * s, self[1] * s, self[2] * s]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vector_arithmetic() {
        let u: Vector = [1., 2., 2.];
        assert_relative_eq!(u.norm(), 3.);
        assert_relative_eq!(u.dot(&[1., 0., 0.]), 1.);
        assert_relative_eq!([1f64, 2., 2.].normalize().norm(), 1.);
        assert_relative_eq!(u.sub(u).norm(), 0.);
        assert_relative_eq!(u.scale(2.).norm(), 6.);
    }
}
