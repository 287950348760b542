use super::{
    trace_bundle, Arithmetic, OpticalSystem, OpticsError, Ray, Result, TraceOutcome, TracedPath,
    Vector,
};
use log::info;
use nalgebra as na;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Transverse sampling pattern of a bundle generator
///
/// Every pattern is a pure function of its parameters; the random disk takes
/// an explicit seed so a given configuration always yields the same rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Meridional fan: `n` pupil heights evenly spaced across the y diameter
    Fan { n: usize },
    /// Center ray plus `rings` concentric rings, ring $k$ carrying $6k$ rays
    Hexapolar { rings: usize },
    /// `n` by `n` square grid clipped to the pupil disk
    Grid { n: usize },
    /// `n` uniformly distributed points on the pupil disk
    RandomDisk { n: usize, seed: u64 },
}

/// # Ray bundle builder
///
/// Deterministic generation of structured input rays: a transverse
/// [`Pattern`] over a pupil of the given radius, one copy per wavelength, all
/// rays sharing the field direction given in polar coordinates.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    pattern: Pattern,
    radius: f64,
    z0: f64,
    zenith: f64,
    azimuth: f64,
    wavelengths: Vec<f64>,
}
impl Default for BundleBuilder {
    fn default() -> Self {
        Self {
            pattern: Pattern::Fan { n: 11 },
            radius: 1e-2,
            z0: 0f64,
            zenith: 0f64,
            azimuth: 0f64,
            wavelengths: vec![550e-9],
        }
    }
}
impl BundleBuilder {
    /// Sets the transverse sampling pattern
    pub fn pattern(self, pattern: Pattern) -> Self {
        Self { pattern, ..self }
    }
    /// Sets the pupil radius \[m\]
    pub fn radius(self, radius: f64) -> Self {
        Self { radius, ..self }
    }
    /// Sets the z coordinate of the launch plane
    pub fn launch_plane(self, z0: f64) -> Self {
        Self { z0, ..self }
    }
    /// Sets the common field direction from polar coordinates \[rd\]
    pub fn field(self, zenith: f64, azimuth: f64) -> Self {
        Self {
            zenith,
            azimuth,
            ..self
        }
    }
    /// Sets the wavelength list \[m\], one bundle copy per wavelength
    pub fn wavelengths(self, wavelengths: Vec<f64>) -> Self {
        Self {
            wavelengths,
            ..self
        }
    }
    fn pupil_points(&self) -> Vec<(f64, f64)> {
        match self.pattern {
            Pattern::Fan { n } => {
                if n == 1 {
                    return vec![(0f64, 0f64)];
                }
                (0..n)
                    .map(|k| {
                        let y = self.radius * (2f64 * k as f64 / (n - 1) as f64 - 1f64);
                        (0f64, y)
                    })
                    .collect()
            }
            Pattern::Hexapolar { rings } => {
                let mut points = vec![(0f64, 0f64)];
                for ring in 1..=rings {
                    let r = self.radius * ring as f64 / rings as f64;
                    let n = 6 * ring;
                    for k in 0..n {
                        let o = 2f64 * std::f64::consts::PI * k as f64 / n as f64;
                        points.push((r * o.cos(), r * o.sin()));
                    }
                }
                points
            }
            Pattern::Grid { n } => {
                if n == 1 {
                    return vec![(0f64, 0f64)];
                }
                let mut points = Vec::with_capacity(n * n);
                for i in 0..n {
                    for j in 0..n {
                        let x = self.radius * (2f64 * i as f64 / (n - 1) as f64 - 1f64);
                        let y = self.radius * (2f64 * j as f64 / (n - 1) as f64 - 1f64);
                        if x.hypot(y) <= self.radius {
                            points.push((x, y));
                        }
                    }
                }
                points
            }
            Pattern::RandomDisk { n, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..n)
                    .map(|_| {
                        let r = self.radius * rng.gen::<f64>().sqrt();
                        let o = 2f64 * std::f64::consts::PI * rng.gen::<f64>();
                        (r * o.cos(), r * o.sin())
                    })
                    .collect()
            }
        }
    }
    /// Build the [`RayBundle`]
    ///
    /// Fails with [`OpticsError::InvalidRay`] on a non-positive pupil radius
    /// or wavelength.
    pub fn build(self) -> Result<RayBundle> {
        if !(self.radius.is_finite() && self.radius > 0f64) {
            return Err(OpticsError::InvalidRay(format!(
                "bundle configuration: pupil radius must be positive, got {}",
                self.radius
            )));
        }
        if self.wavelengths.is_empty() {
            return Err(OpticsError::InvalidRay(
                "bundle configuration: empty wavelength list".into(),
            ));
        }
        let u = [
            self.zenith.sin() * self.azimuth.cos(),
            self.zenith.sin() * self.azimuth.sin(),
            self.zenith.cos(),
        ];
        let mut rays = Vec::new();
        for &wavelength in &self.wavelengths {
            for (x, y) in self.pupil_points() {
                rays.push(Ray::new([x, y, self.z0], u, wavelength)?);
            }
        }
        if rays.is_empty() {
            return Err(OpticsError::InvalidRay(format!(
                "bundle configuration: {:?} generates no rays",
                self.pattern
            )));
        }
        Ok(RayBundle { rays, paths: None })
    }
}
/// Create a default [`BundleBuilder`]: an 11-ray meridional fan at 550nm
/// launched from $z=0$ along the axis
pub fn new_bundle() -> BundleBuilder {
    BundleBuilder::default()
}

/// # Ray bundle
///
/// Ordered collection of input rays and, after tracing, the parallel
/// collection of their paths.
#[derive(Debug, Clone)]
pub struct RayBundle {
    pub rays: Vec<Ray>,
    pub paths: Option<Vec<TracedPath>>,
}
impl RayBundle {
    /// Number of rays
    pub fn len(&self) -> usize {
        self.rays.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
    /// Trace every ray through the system, preserving ray order
    pub fn trace(&mut self, system: &OpticalSystem) -> &mut Self {
        self.paths = Some(trace_bundle(&self.rays, system));
        info!("traced {} rays through {} surfaces", self.len(), system.len());
        self
    }
    /// Spot statistics over the terminal points of the traced bundle
    ///
    /// Vignetted and escaped rays are excluded from the centroid and RMS and
    /// reported in the exclusion counts. `None` before tracing.
    pub fn spot(&self) -> Option<SpotStatistics> {
        let paths = self.paths.as_deref()?;
        let mut vignetted = 0;
        let mut escaped = 0;
        let mut terminal = Vec::with_capacity(paths.len());
        for path in paths {
            match path.outcome {
                TraceOutcome::Terminated => {
                    terminal.push(path.records.last().map(|r| r.point).unwrap_or(path.ray.p))
                }
                TraceOutcome::Vignetted { .. } => vignetted += 1,
                TraceOutcome::Escaped { .. } => escaped += 1,
            }
        }
        let centroid = if terminal.is_empty() {
            [0f64; 3]
        } else {
            terminal
                .iter()
                .fold([0f64; 3], |s, p| s.add(*p))
                .scale(1f64 / terminal.len() as f64)
        };
        let rms_radius = if terminal.is_empty() {
            0f64
        } else {
            (terminal
                .iter()
                .map(|p| p.sub(centroid).norm_square())
                .sum::<f64>()
                / terminal.len() as f64)
                .sqrt()
        };
        Some(SpotStatistics {
            traced: terminal.len(),
            vignetted,
            escaped,
            centroid,
            rms_radius,
        })
    }
    /// Least-squares best focus of the traced bundle
    ///
    /// The point minimizing the summed squared distance to the terminal ray
    /// lines, solved through the normal equations with an SVD. Needs at least
    /// two non-parallel terminated rays; degenerate bundles yield `None`.
    pub fn best_focus(&self) -> Option<Vector> {
        let paths = self.paths.as_deref()?;
        let lines: Vec<(Vector, Vector)> = paths
            .iter()
            .filter_map(|path| path.terminal().map(|r| (r.point, r.direction)))
            .collect();
        if lines.len() < 2 {
            return None;
        }
        let mut a = na::Matrix3::<f64>::zeros();
        let mut b = na::Vector3::<f64>::zeros();
        for (p, u) in &lines {
            let u = na::Vector3::from(*u);
            let p = na::Vector3::from(*p);
            let projector = na::Matrix3::identity() - u * u.transpose();
            a += projector;
            b += projector * p;
        }
        let svd = a.svd(true, true);
        if svd.singular_values.min() < 1e-9 {
            // all terminal rays parallel
            return None;
        }
        svd.solve(&b, f64::EPSILON).ok().map(|x| x.into())
    }
}

/// Aggregate spot-diagram statistics of a traced bundle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotStatistics {
    /// Rays that reached the end of the surface sequence
    pub traced: usize,
    /// Rays clipped by a clear aperture
    pub vignetted: usize,
    /// Rays that missed a surface
    pub escaped: usize,
    /// Mean terminal point of the traced rays
    pub centroid: Vector,
    /// Root mean square distance of the terminal points to the centroid
    pub rms_radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Aperture, Medium, Shape, Surface};
    use approx::assert_abs_diff_eq;

    #[test]
    fn fan_spans_the_pupil_diameter() {
        let bundle = new_bundle()
            .pattern(Pattern::Fan { n: 5 })
            .radius(0.01)
            .build()
            .unwrap();
        assert_eq!(bundle.len(), 5);
        assert_abs_diff_eq!(bundle.rays[0].p[1], -0.01);
        assert_abs_diff_eq!(bundle.rays[2].p[1], 0.);
        assert_abs_diff_eq!(bundle.rays[4].p[1], 0.01);
        assert!(bundle.rays.iter().all(|r| r.p[0] == 0.));
    }

    #[test]
    fn hexapolar_ray_count() {
        let bundle = new_bundle()
            .pattern(Pattern::Hexapolar { rings: 3 })
            .build()
            .unwrap();
        // 1 + 6 + 12 + 18
        assert_eq!(bundle.len(), 37);
    }

    #[test]
    fn single_ray_grid_is_the_center_ray() {
        let bundle = new_bundle()
            .pattern(Pattern::Grid { n: 1 })
            .radius(0.01)
            .build()
            .unwrap();
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.rays[0].p, [0., 0., 0.]);
    }

    #[test]
    fn grid_keeps_the_corners_out_of_the_pupil() {
        let bundle = new_bundle()
            .pattern(Pattern::Grid { n: 5 })
            .radius(0.01)
            .build()
            .unwrap();
        assert!(bundle
            .rays
            .iter()
            .all(|r| r.p[0].hypot(r.p[1]) <= 0.01 + 1e-12));
        assert!(bundle.len() < 25);
    }

    #[test]
    fn empty_generation_is_rejected() {
        assert!(new_bundle().pattern(Pattern::Fan { n: 0 }).build().is_err());
        assert!(new_bundle()
            .pattern(Pattern::RandomDisk { n: 0, seed: 1 })
            .build()
            .is_err());
    }

    #[test]
    fn generators_are_deterministic() {
        let make = || {
            new_bundle()
                .pattern(Pattern::RandomDisk { n: 100, seed: 42 })
                .radius(0.02)
                .build()
                .unwrap()
        };
        assert_eq!(make().rays, make().rays);
        let other = new_bundle()
            .pattern(Pattern::RandomDisk { n: 100, seed: 43 })
            .radius(0.02)
            .build()
            .unwrap();
        assert_ne!(other.rays, make().rays);
    }

    #[test]
    fn random_disk_stays_in_the_pupil() {
        let bundle = new_bundle()
            .pattern(Pattern::RandomDisk { n: 500, seed: 7 })
            .radius(0.015)
            .build()
            .unwrap();
        assert!(bundle
            .rays
            .iter()
            .all(|r| r.p[0].hypot(r.p[1]) <= 0.015 + 1e-12));
    }

    #[test]
    fn wavelength_copies() {
        let bundle = new_bundle()
            .pattern(Pattern::Fan { n: 3 })
            .wavelengths(vec![450e-9, 650e-9])
            .build()
            .unwrap();
        assert_eq!(bundle.len(), 6);
        assert_eq!(bundle.rays[0].wavelength, 450e-9);
        assert_eq!(bundle.rays[3].wavelength, 650e-9);
    }

    #[test]
    fn bad_configuration_is_rejected() {
        assert!(new_bundle().radius(0.).build().is_err());
        assert!(new_bundle().wavelengths(vec![]).build().is_err());
        assert!(new_bundle().wavelengths(vec![-1e-9]).build().is_err());
    }

    #[test]
    fn spot_counts_exclusions() {
        // stop small enough to clip the fan edges
        let system = crate::OpticalSystem::builder()
            .refract(
                Surface::new(Shape::Plane, [0., 0., 0.01]).apertured(Aperture::circular(5e-3)),
                Medium::air(),
            )
            .screen(Surface::new(Shape::Plane, [0., 0., 0.02]))
            .build()
            .unwrap();
        let mut bundle = new_bundle()
            .pattern(Pattern::Fan { n: 11 })
            .radius(0.01)
            .launch_plane(-0.01)
            .build()
            .unwrap();
        let spot = bundle.trace(&system).spot().unwrap();
        assert_eq!(spot.traced + spot.vignetted + spot.escaped, 11);
        assert!(spot.vignetted > 0);
        assert_eq!(spot.escaped, 0);
        assert_abs_diff_eq!(spot.centroid[1], 0., epsilon = 1e-12);
    }

    #[test]
    fn parallel_bundle_has_no_focus() {
        let system = crate::OpticalSystem::builder()
            .screen(Surface::new(Shape::Plane, [0., 0., 0.1]))
            .build()
            .unwrap();
        let mut bundle = new_bundle().pattern(Pattern::Fan { n: 7 }).build().unwrap();
        bundle.trace(&system);
        assert!(bundle.best_focus().is_none());
    }
}
