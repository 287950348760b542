use super::{Arithmetic, Vector};
use nalgebra as na;

/// # Local surface frame
///
/// Placement of a surface within the optical system: the surface vertex sits
/// at `origin` and the `rotation` matrix maps local surface coordinates to
/// global coordinates. The local optical axis is local $+z$.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Surface vertex in global coordinates
    pub origin: Vector,
    /// Local to global rotation
    pub rotation: na::Rotation3<f64>,
}
impl Default for Frame {
    fn default() -> Self {
        Self {
            origin: [0f64; 3],
            rotation: na::Rotation3::identity(),
        }
    }
}
impl Frame {
    /// Creates a new axis-aligned `Frame` at `origin`
    pub fn new(origin: Vector) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }
    /// Sets the local to global rotation
    pub fn rotated(self, rotation: na::Rotation3<f64>) -> Self {
        Self { rotation, ..self }
    }
    /// Global to local point transform
    pub fn to_local_point(&self, p: Vector) -> Vector {
        (self.rotation.inverse() * na::Vector3::from(p.sub(self.origin))).into()
    }
    /// Local to global point transform
    pub fn to_global_point(&self, p: Vector) -> Vector {
        let q: Vector = (self.rotation * na::Vector3::from(p)).into();
        q.add(self.origin)
    }
    /// Global to local direction transform
    pub fn to_local_direction(&self, u: Vector) -> Vector {
        (self.rotation.inverse() * na::Vector3::from(u)).into()
    }
    /// Local to global direction transform
    pub fn to_global_direction(&self, u: Vector) -> Vector {
        (self.rotation * na::Vector3::from(u)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn round_trip() {
        let frame = Frame::new([1., -2., 3.]).rotated(na::Rotation3::from_axis_angle(
            &na::Vector3::x_axis(),
            0.3,
        ));
        let p = [0.1, 0.2, -0.5];
        let q = frame.to_local_point(frame.to_global_point(p));
        for i in 0..3 {
            assert_relative_eq!(p[i], q[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn quarter_turn_about_x() {
        let frame = Frame::new([0.; 3]).rotated(na::Rotation3::from_axis_angle(
            &na::Vector3::x_axis(),
            FRAC_PI_2,
        ));
        // right-hand rotation about +x maps local +z to global -y
        let u = frame.to_global_direction([0., 0., 1.]);
        assert_relative_eq!(u[1], -1., epsilon = 1e-12);
        assert_relative_eq!(u[2], 0., epsilon = 1e-12);
        // and local +y to global +z
        let v = frame.to_global_direction([0., 1., 0.]);
        assert_relative_eq!(v[1], 0., epsilon = 1e-12);
        assert_relative_eq!(v[2], 1., epsilon = 1e-12);
    }

    #[test]
    fn translation_leaves_directions_alone() {
        let frame = Frame::new([5., 5., 5.]);
        assert_eq!(frame.to_local_direction([0., 0., 1.]), [0., 0., 1.]);
        assert_eq!(frame.to_local_point([5., 5., 6.]), [0., 0., 1.]);
    }
}
