/// # Clear aperture
///
/// Limit on the $(x,y)$ extent of a surface in its local frame. A ray whose
/// intersection point falls outside the aperture is vignetted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aperture {
    /// Disk of the given radius centered on the local axis
    Circular { radius: f64 },
    /// Axis-aligned rectangle of the given half extents
    Rectangular { half_width: f64, half_height: f64 },
}
impl Aperture {
    /// Creates a circular aperture
    pub fn circular(radius: f64) -> Self {
        Self::Circular { radius }
    }
    /// Creates a rectangular aperture from its full extents
    pub fn rectangular(size_x: f64, size_y: f64) -> Self {
        Self::Rectangular {
            half_width: 0.5 * size_x,
            half_height: 0.5 * size_y,
        }
    }
    /// Checks that the local coordinates $(x,y)$ fall inside the aperture
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Self::Circular { radius } => x.hypot(y) <= *radius,
            Self::Rectangular {
                half_width,
                half_height,
            } => x.abs() <= *half_width && y.abs() <= *half_height,
        }
    }
    /// Largest distance from the local axis still inside the aperture
    pub fn semi_diameter(&self) -> f64 {
        match self {
            Self::Circular { radius } => *radius,
            Self::Rectangular {
                half_width,
                half_height,
            } => half_width.hypot(*half_height),
        }
    }
    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Self::Circular { radius } => radius.is_finite() && *radius > 0f64,
            Self::Rectangular {
                half_width,
                half_height,
            } => {
                half_width.is_finite()
                    && half_height.is_finite()
                    && *half_width > 0f64
                    && *half_height > 0f64
            }
        }
    }
}
