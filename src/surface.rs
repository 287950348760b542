use super::{Aperture, Arithmetic, Frame, Ray, Vector};

/// Shortest admissible ray-surface distance; anything closer counts as a
/// self-intersection and is discarded
const MIN_DISTANCE: f64 = 1e-10;

/// # Surface shape
///
/// Shape variants expressed in the surface local frame with the vertex at the
/// local origin and the optical axis along local $+z$. A conic surface is the
/// set of coordinates $(x,y,z)$ that satisfies
/// $$ F(x,y,z) = r^2 - 2zR + z^2(\kappa+1)=0,$$
/// where $r^2=x^2+y^2$, $R$ is the radius of curvature and $\kappa$ is the
/// conic constant; a sphere is $\kappa=0$, a plane is the degenerate $z=0$
/// case. Positive $R$ puts the center of curvature at local $+z$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Plane,
    Sphere { roc: f64 },
    Conic { roc: f64, kappa: f64 },
}
impl Shape {
    /// Radius of curvature and conic constant, `None` for a plane
    fn prescription(&self) -> Option<(f64, f64)> {
        match self {
            Self::Plane => None,
            Self::Sphere { roc } => Some((*roc, 0f64)),
            Self::Conic { roc, kappa } => Some((*roc, *kappa)),
        }
    }
    /// Closest strictly positive ray-shape intersection in the local frame
    ///
    /// Solves $F(\vec p + s\vec u)=0$ for the smallest $s>0$ and returns
    /// $(s, \vec p + s\vec u)$, or `None` if the ray misses the shape or only
    /// meets it backward. The quadratic is solved directly in $\kappa+1$ so
    /// hyperbolic constants ($\kappa<-1$) are admissible.
    pub fn intersect(&self, p: Vector, u: Vector) -> Option<(f64, Vector)> {
        let s = match self.prescription() {
            None => {
                if u[2].abs() < f64::EPSILON {
                    return None;
                }
                -p[2] / u[2]
            }
            Some((roc, kappa)) => {
                let kp1 = kappa + 1f64;
                let a = u[0] * u[0] + u[1] * u[1] + kp1 * u[2] * u[2];
                let b = 2f64 * (p[0] * u[0] + p[1] * u[1] + kp1 * p[2] * u[2] - roc * u[2]);
                let c = p[0] * p[0] + p[1] * p[1] + kp1 * p[2] * p[2] - 2f64 * roc * p[2];
                if a.abs() < 1e-30 {
                    // parabola traversed along its axis
                    if b.abs() < 1e-30 {
                        return None;
                    }
                    -c / b
                } else {
                    let discriminant = b * b - 4f64 * a * c;
                    // tangency counts as a miss
                    if discriminant <= 0f64 {
                        return None;
                    }
                    let sq = discriminant.sqrt();
                    let (s1, s2) = (0.5 * (-b - sq) / a, 0.5 * (-b + sq) / a);
                    let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
                    if lo > MIN_DISTANCE {
                        lo
                    } else {
                        hi
                    }
                }
            }
        };
        (s > MIN_DISTANCE).then(|| (s, [p[0] + s * u[0], p[1] + s * u[1], p[2] + s * u[2]]))
    }
    /// Surface sag: solve $F(x,y,z)=0$ for $z$ at the radial coordinate
    /// $r^2 = x^2+y^2$
    pub fn height_at(&self, x: f64, y: f64) -> f64 {
        match self.prescription() {
            None => 0f64,
            Some((roc, kappa)) => {
                let r2 = x * x + y * y;
                let c = 1f64 / roc;
                c * r2 / (1f64 + (1f64 - (kappa + 1f64) * c * c * r2).sqrt())
            }
        }
    }
    /// Unit normal $\vec n = \nabla F / \|\nabla F\|$ at a point on the shape,
    /// in the local frame
    ///
    /// The gradient orientation is geometric; [`Surface::intersect`] flips it
    /// against the incoming ray.
    pub fn normal_at(&self, p: Vector) -> Vector {
        match self.prescription() {
            None => [0f64, 0f64, 1f64],
            Some((roc, kappa)) => {
                [p[0], p[1], (kappa + 1f64) * p[2] - roc].normalize()
            }
        }
    }
}

/// # Optical surface
///
/// A [`Shape`] placed in the system by its [`Frame`], with an optional clear
/// [`Aperture`] tested in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub shape: Shape,
    pub frame: Frame,
    pub aperture: Option<Aperture>,
}
impl Surface {
    /// Creates a new axis-aligned `Surface` with the vertex at `origin` and no
    /// aperture
    pub fn new(shape: Shape, origin: Vector) -> Self {
        Self {
            shape,
            frame: Frame::new(origin),
            aperture: None,
        }
    }
    /// Sets the surface placement
    pub fn framed(self, frame: Frame) -> Self {
        Self { frame, ..self }
    }
    /// Sets the clear aperture
    pub fn apertured(self, aperture: Aperture) -> Self {
        Self {
            aperture: Some(aperture),
            ..self
        }
    }
    /// Closest forward intersection of a ray with the surface
    ///
    /// The geometric point is reported even when it falls outside the clear
    /// aperture; `within_aperture` is then false and the point is kept for
    /// diagnostics. The returned normal is a global unit vector oriented
    /// against the ray, $\vec u \cdot \vec n < 0$.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let p = self.frame.to_local_point(ray.p);
        let u = self.frame.to_local_direction(ray.u);
        let (distance, local) = self.shape.intersect(p, u)?;
        let mut normal = self.shape.normal_at(local);
        if normal.dot(&u) > 0f64 {
            normal = normal.scale(-1f64);
        }
        Some(Intersection {
            distance,
            point: self.frame.to_global_point(local),
            normal: self.frame.to_global_direction(normal),
            within_aperture: self
                .aperture
                .map_or(true, |ap| ap.contains(local[0], local[1])),
        })
    }
}

/// Ray-surface intersection record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Path length from the ray origin to the surface, strictly positive
    pub distance: f64,
    /// Intersection point in global coordinates
    pub point: Vector,
    /// Global unit normal oriented against the incoming ray
    pub normal: Vector,
    /// False when the point falls outside the clear aperture (vignetted)
    pub within_aperture: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_ray;
    use approx::assert_relative_eq;

    #[test]
    fn plane_intersection() {
        let (s, p) = Shape::Plane.intersect([0., 1., -2.], [0., 0., 1.]).unwrap();
        assert_relative_eq!(s, 2.);
        assert_eq!(p, [0., 1., 0.]);
    }

    #[test]
    fn parallel_ray_misses_plane() {
        assert!(Shape::Plane.intersect([0., 0., 1.], [1., 0., 0.]).is_none());
    }

    #[test]
    fn behind_the_surface_is_a_miss() {
        // strictly positive distance, no self-intersection
        assert!(Shape::Plane.intersect([0., 0., 1.], [0., 0., 1.]).is_none());
        assert!(Shape::Plane.intersect([0., 0., 0.], [1., 0., 0.]).is_none());
    }

    #[test]
    fn sphere_intersection() {
        // vertex sheet of a R=0.1 sphere, axial ray at height 0.02
        let shape = Shape::Sphere { roc: 0.1 };
        let (s, p) = shape.intersect([0., 0.02, -0.1], [0., 0., 1.]).unwrap();
        let z = 0.1 - (0.1f64 * 0.1 - 0.02 * 0.02).sqrt();
        assert_relative_eq!(p[2], z, epsilon = 1e-12);
        assert_relative_eq!(s, z + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn sphere_miss_and_tangency() {
        let shape = Shape::Sphere { roc: 0.1 };
        assert!(shape.intersect([0., 0.3, -1.], [0., 0., 1.]).is_none());
        // tangent ray grazing the equator
        assert!(shape
            .intersect([0., 0.1 + 1e-6, -1.], [0., 0., 1.])
            .is_none());
        // exact tangency, zero discriminant: R, height and origin all
        // representable so b*b == 4ac to the last bit
        assert!(Shape::Sphere { roc: 0.25 }
            .intersect([0., 0.25, -1.], [0., 0., 1.])
            .is_none());
    }

    #[test]
    fn sag_matches_intersection() {
        let shape = Shape::Conic {
            roc: 0.2,
            kappa: -0.5,
        };
        let (_, p) = shape.intersect([0.01, 0.02, -1.], [0., 0., 1.]).unwrap();
        assert_relative_eq!(p[2], shape.height_at(0.01, 0.02), epsilon = 1e-12);
    }

    #[test]
    fn hyperbolic_constant_is_admissible() {
        let shape = Shape::Conic {
            roc: -1.,
            kappa: -1.5,
        };
        let z = shape.height_at(0.1, 0.);
        assert!(z.is_finite() && z < 0.);
        assert!(shape.intersect([0.1, 0., 1.], [0., 0., -1.]).is_some());
    }

    #[test]
    fn sphere_normal_points_along_the_radius() {
        let shape = Shape::Sphere { roc: 0.1 };
        let (_, p) = shape.intersect([0., 0.02, -1.], [0., 0., 1.]).unwrap();
        let n = shape.normal_at(p);
        // the normal at p is collinear with p - center, center = [0,0,R]
        let radial = p.sub([0., 0., 0.1]).normalize();
        for i in 0..3 {
            assert_relative_eq!(n[i], radial[i], epsilon = 1e-12);
        }
        assert_relative_eq!(n.norm(), 1., epsilon = 1e-12);
    }

    #[test]
    fn oriented_normal_faces_the_ray() {
        let surface = Surface::new(Shape::Sphere { roc: -0.1 }, [0., 0., 1.]);
        let ray = new_ray().point_of_origin([0., 0.01, 0.]).build().unwrap();
        let ix = surface.intersect(&ray).unwrap();
        assert!(ix.normal.dot(&ray.u) < 0.);
    }

    #[test]
    fn aperture_vignettes_but_keeps_the_point() {
        let surface =
            Surface::new(Shape::Plane, [0., 0., 1.]).apertured(Aperture::circular(0.01));
        let ray = new_ray().point_of_origin([0., 0.02, 0.]).build().unwrap();
        let ix = surface.intersect(&ray).unwrap();
        assert!(!ix.within_aperture);
        assert_relative_eq!(ix.point[1], 0.02);
        assert_relative_eq!(ix.point[2], 1.);
    }
}
