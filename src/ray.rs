use super::{Arithmetic, OpticsError, Result, Vector};
use std::fmt;

/// # Ray definition
///
/// A ray is defined with:
///  - a point of origin: $\vec p = [x,y,z]$,
///  - a unit direction vector: $\vec u = [k,l,m]$ such as $\| \vec u \|=1$,
///  - a wavelength $\lambda>0$ in meters.
///
/// The ray tracing equation is given by: $$\vec{p^\prime} = \vec p + s \vec u,$$ where $s$ is the path length.
///
/// A ray is immutable: tracing produces new positions and directions in a
/// [`TracedPath`](crate::trace::TracedPath), never an in-place update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray point of origin
    pub p: Vector,
    /// Ray unit direction vector
    pub u: Vector,
    /// Wavelength \[m\]
    pub wavelength: f64,
}
impl Ray {
    /// Creates a new [`Ray`], normalizing the direction vector
    ///
    /// Fails with [`OpticsError::InvalidRay`] if the direction is zero or
    /// non-finite or if the wavelength is not strictly positive.
    pub fn new(p: Vector, u: Vector, wavelength: f64) -> Result<Self> {
        if !p.iter().chain(u.iter()).all(|x| x.is_finite()) {
            return Err(OpticsError::InvalidRay(
                "non-finite origin or direction".into(),
            ));
        }
        let n = u.norm();
        if n < f64::EPSILON {
            return Err(OpticsError::InvalidRay("zero-length direction".into()));
        }
        if !(wavelength.is_finite() && wavelength > 0f64) {
            return Err(OpticsError::InvalidRay(format!(
                "non-positive wavelength: {wavelength:e}"
            )));
        }
        Ok(Self {
            p,
            u: u.scale(1f64 / n),
            wavelength,
        })
    }
    /// Point at path length $s$ from the origin
    pub fn at(&self, s: f64) -> Vector {
        self.p.add(self.u.scale(s))
    }
}
impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P: [{:+15.9},{:+15.9},{:+15.9}] ; U: [{:+.9},{:+.9},{:+.9}] ; W: {:.1}nm",
            self.p[0],
            self.p[1],
            self.p[2],
            self.u[0],
            self.u[1],
            self.u[2],
            self.wavelength * 1e9,
        )
    }
}

/// # Ray builder
///
/// Build a new [`Ray`] propagating toward $z>0$ by default
pub struct NewRay {
    /// Ray point of origin
    pub p: Vector,
    /// Ray direction vector
    pub u: Vector,
    /// Wavelength \[m\]
    pub wavelength: f64,
}
impl Default for NewRay {
    fn default() -> Self {
        Self {
            p: [0f64; 3],
            u: [0f64, 0f64, 1f64],
            wavelength: 550e-9,
        }
    }
}
impl NewRay {
    /// Set the [`Ray`] point of origin
    pub fn point_of_origin(self, p: Vector) -> Self {
        Self { p, ..self }
    }
    /// Set the [`Ray`] direction vector
    pub fn direction_vector(self, u: Vector) -> Self {
        Self { u, ..self }
    }
    /// Set the [`Ray`] direction vector from polar coordinates
    ///
    /// `z` is the zenith angle off the $+z$ optical axis and `a` the azimuth
    /// in the $(x,y)$ plane, both in radians
    pub fn polar_direction_vector(self, z: f64, a: f64) -> Self {
        let u = [z.sin() * a.cos(), z.sin() * a.sin(), z.cos()];
        Self { u, ..self }
    }
    /// Set the [`Ray`] wavelength \[m\]
    pub fn wavelength(self, wavelength: f64) -> Self {
        Self { wavelength, ..self }
    }
    /// Build the [`Ray`]
    pub fn build(self) -> Result<Ray> {
        Ray::new(self.p, self.u, self.wavelength)
    }
}
/// Create a [`NewRay`] at the origin propagating upward (z>0)
pub fn new_ray() -> NewRay {
    NewRay::default()
}
