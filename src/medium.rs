/// # Optical medium
///
/// Refractive index as a function of wavelength. Every surface of an
/// [`OpticalSystem`](crate::system::OpticalSystem) separates two media; a
/// mirror keeps the ray in its incidence medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Medium {
    /// Dispersion-free medium
    Constant { n: f64 },
    /// Two-term Cauchy dispersion, $n(\lambda) = a + b/\lambda^2$ with
    /// $\lambda$ in meters
    Cauchy { a: f64, b: f64 },
}
impl Medium {
    /// Refractive index at the given wavelength \[m\]
    pub fn index_at(&self, wavelength: f64) -> f64 {
        match self {
            Self::Constant { n } => *n,
            Self::Cauchy { a, b } => a + b / (wavelength * wavelength),
        }
    }
    /// Air, $n=1$
    pub fn air() -> Self {
        Self::Constant { n: 1f64 }
    }
    /// BK7-like crown glass, Cauchy fit ($n\approx1.519$ at 550nm)
    pub fn bk7() -> Self {
        Self::Cauchy {
            a: 1.5046,
            b: 4.2e-15,
        }
    }
    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Self::Constant { n } => n.is_finite() && *n > 0f64,
            Self::Cauchy { a, b } => a.is_finite() && b.is_finite() && *a > 0f64 && *b >= 0f64,
        }
    }
}
impl Default for Medium {
    fn default() -> Self {
        Self::air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_index_ignores_wavelength() {
        let glass = Medium::Constant { n: 1.5 };
        assert_eq!(glass.index_at(450e-9), glass.index_at(650e-9));
    }

    #[test]
    fn cauchy_dispersion() {
        let bk7 = Medium::bk7();
        assert_relative_eq!(bk7.index_at(550e-9), 1.5185, epsilon = 1e-3);
        // blue bends more than red
        assert!(bk7.index_at(450e-9) > bk7.index_at(650e-9));
    }

    #[test]
    fn degenerate_indices() {
        assert!(!Medium::Constant { n: 0. }.is_valid());
        assert!(!Medium::Constant { n: f64::NAN }.is_valid());
        assert!(!Medium::Cauchy { a: -1., b: 0. }.is_valid());
        assert!(Medium::bk7().is_valid());
    }
}
