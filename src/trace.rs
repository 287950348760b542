use super::{Arithmetic, OpticalSystem, Ray, Vector};
use log::{debug, trace as log_trace};
use rayon::prelude::*;

/// Unit-length tolerance on every emitted direction
pub const DIRECTION_TOLERANCE: f64 = 1e-9;

/// Reflect the unit direction $\vec d$ off the unit normal $\vec n$:
/// $$\vec{d^\prime} = \vec d - 2 (\vec d \cdot \vec n)\vec n$$
pub fn reflect(d: Vector, n: Vector) -> Vector {
    d.sub(n.scale(2f64 * d.dot(&n))).normalize()
}

/// Refract the unit direction $\vec d$ through the interface of unit normal
/// $\vec n$ (oriented against $\vec d$) between indices `n1` and `n2`
///
/// Vector form of Snell's law:
/// $$\vec{d^\prime} = \frac{n_1}{n_2}\vec d
///   + \left(\frac{n_1}{n_2}\cos\theta_1 - \cos\theta_2\right)\vec n$$
/// with $\cos\theta_1 = -\vec d\cdot\vec n$ and
/// $\sin^2\theta_2 = (n_1/n_2)^2(1-\cos^2\theta_1)$. Past the critical angle,
/// $\sin^2\theta_2>1$, the ray reflects instead; the boolean is the total
/// internal reflection flag.
pub fn refract(d: Vector, n: Vector, n1: f64, n2: f64) -> (Vector, bool) {
    let eta = n1 / n2;
    let cos1 = -d.dot(&n);
    let sin2_2 = eta * eta * (1f64 - cos1 * cos1);
    if sin2_2 > 1f64 {
        (reflect(d, n), true)
    } else {
        let cos2 = (1f64 - sin2_2).sqrt();
        (d.scale(eta).add(n.scale(eta * cos1 - cos2)).normalize(), false)
    }
}

/// One surface encounter along a traced path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRecord {
    /// Position of the surface in the system sequence
    pub surface: usize,
    /// Intersection point in global coordinates, kept even when vignetted
    pub point: Vector,
    /// Unit direction leaving the surface; the incoming direction when the
    /// surface was not validly hit
    pub direction: Vector,
    /// False when the intersection fell outside the clear aperture
    pub hit: bool,
    /// Total internal reflection occurred at this surface
    pub tir: bool,
    /// Cumulative optical path length $\sum n_i s_i$ up to this point
    pub optical_path: f64,
}

/// Terminal state of a traced ray
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The ray passed every surface of the sequence
    Terminated,
    /// The ray was clipped by the clear aperture of `surface` and stopped
    Vignetted { surface: usize },
    /// The ray missed `surface` and never reached the rest of the sequence
    Escaped { surface: usize },
}

/// # Traced path
///
/// Ordered surface encounters of one input ray, plus its terminal outcome.
/// Missing a surface or being clipped by an aperture is an expected physical
/// outcome carried here, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    /// The input ray the path starts from
    pub ray: Ray,
    /// One record per surface encounter, in sequence order
    pub records: Vec<PathRecord>,
    pub outcome: TraceOutcome,
}
impl TracedPath {
    /// Ray origin followed by every recorded intersection point
    pub fn points(&self) -> Vec<Vector> {
        std::iter::once(self.ray.p)
            .chain(self.records.iter().map(|r| r.point))
            .collect()
    }
    /// Last record of a fully terminated trace
    pub fn terminal(&self) -> Option<&PathRecord> {
        (self.outcome == TraceOutcome::Terminated)
            .then(|| self.records.last())
            .flatten()
    }
    /// Cumulative optical path length of a fully terminated trace
    pub fn optical_path_length(&self) -> Option<f64> {
        self.terminal().map(|r| r.optical_path)
    }
    /// Whether total internal reflection occurred anywhere along the path
    pub fn had_tir(&self) -> bool {
        self.records.iter().any(|r| r.tir)
    }
}

/// Propagate one ray through the system in surface sequence order
///
/// Pure function of its inputs: identical calls yield identical paths.
pub fn trace(ray: &Ray, system: &OpticalSystem) -> TracedPath {
    let mut p = ray.p;
    let mut u = ray.u;
    let mut medium = system.medium_before(0);
    let mut optical_path = 0f64;
    let mut records = Vec::with_capacity(system.len());
    for (index, element) in system.elements().iter().enumerate() {
        let probe = Ray {
            p,
            u,
            wavelength: ray.wavelength,
        };
        let Some(ix) = element.surface.intersect(&probe) else {
            debug!("ray escaped at surface #{index}");
            return TracedPath {
                ray: *ray,
                records,
                outcome: TraceOutcome::Escaped { surface: index },
            };
        };
        optical_path += medium.index_at(ray.wavelength) * ix.distance;
        if !ix.within_aperture {
            // vignetting policy: stop, no refraction direction is defined
            // without a valid surface hit
            debug!("ray vignetted at surface #{index}");
            records.push(PathRecord {
                surface: index,
                point: ix.point,
                direction: u,
                hit: false,
                tir: false,
                optical_path,
            });
            return TracedPath {
                ray: *ray,
                records,
                outcome: TraceOutcome::Vignetted { surface: index },
            };
        }
        let (direction, tir) = if element.reflective {
            (reflect(u, ix.normal), false)
        } else {
            refract(
                u,
                ix.normal,
                medium.index_at(ray.wavelength),
                element.medium_after.index_at(ray.wavelength),
            )
        };
        log_trace!(
            "surface #{index}: s={:.9} p={:?} tir={tir}",
            ix.distance,
            ix.point
        );
        if !tir {
            medium = element.medium_after;
        }
        records.push(PathRecord {
            surface: index,
            point: ix.point,
            direction,
            hit: true,
            tir,
            optical_path,
        });
        p = ix.point;
        u = direction;
    }
    TracedPath {
        ray: *ray,
        records,
        outcome: TraceOutcome::Terminated,
    }
}

/// Propagate a set of rays through the system, one independent trace per ray
///
/// Traces fan out over the rayon thread pool; the returned paths preserve the
/// input ray order regardless of completion order.
pub fn trace_bundle(rays: &[Ray], system: &OpticalSystem) -> Vec<TracedPath> {
    rays.par_iter().map(|ray| trace(ray, system)).collect()
}
