use super::{Medium, OpticsError, Result, Shape, Surface};

/// One entry of the surface sequence: the surface, the medium a transmitted
/// ray continues into, and whether the surface is a mirror
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub surface: Surface,
    pub medium_after: Medium,
    pub reflective: bool,
}

/// # Optical system
///
/// Ordered sequence of surfaces a ray passes through, threaded from an
/// object-space medium. The order is semantically meaningful: a ray visits
/// the surfaces in sequence position order, never re-routed.
///
/// Built by [`SystemBuilder`]; validation happens once at build time so a
/// trace never has to fail.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalSystem {
    object_medium: Medium,
    elements: Vec<Element>,
}
impl OpticalSystem {
    /// Starts a [`SystemBuilder`] with air as the object-space medium
    pub fn builder() -> SystemBuilder {
        SystemBuilder::default()
    }
    /// Surface sequence in traversal order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
    /// Number of surfaces
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
    /// Medium on the incidence side of surface `index`
    pub fn medium_before(&self, index: usize) -> Medium {
        if index == 0 {
            self.object_medium
        } else {
            self.elements[index - 1].medium_after
        }
    }
}

/// # Optical system builder
///
/// Surfaces are appended in traversal order; each refractive surface names
/// the medium behind it, mirrors and screens keep the ray in its incidence
/// medium. [`SystemBuilder::build`] validates the description and fails fast
/// with [`OpticsError::InvalidSystem`], returning no partial system.
#[derive(Debug, Default)]
pub struct SystemBuilder {
    object_medium: Medium,
    entries: Vec<Element>,
}
impl SystemBuilder {
    /// Sets the medium the first surface is immersed in (default: air)
    pub fn object_medium(self, medium: Medium) -> Self {
        Self {
            object_medium: medium,
            ..self
        }
    }
    /// Appends a refractive surface with the medium behind it
    pub fn refract(mut self, surface: Surface, medium_after: Medium) -> Self {
        self.entries.push(Element {
            surface,
            medium_after,
            reflective: false,
        });
        self
    }
    /// Appends a mirror; the ray stays in its incidence medium
    pub fn mirror(mut self, surface: Surface) -> Self {
        let medium_after = self.incidence_medium();
        self.entries.push(Element {
            surface,
            medium_after,
            reflective: true,
        });
        self
    }
    /// Appends a screen: an index-matched, non-reflective surface whose path
    /// records are analysis points (e.g. a spot-diagram plane)
    pub fn screen(mut self, surface: Surface) -> Self {
        let medium_after = self.incidence_medium();
        self.entries.push(Element {
            surface,
            medium_after,
            reflective: false,
        });
        self
    }
    fn incidence_medium(&self) -> Medium {
        self.entries
            .last()
            .map_or(self.object_medium, |e| e.medium_after)
    }
    /// Validates the description and builds the [`OpticalSystem`]
    pub fn build(self) -> Result<OpticalSystem> {
        if self.entries.is_empty() {
            return Err(OpticsError::InvalidSystem("empty surface sequence".into()));
        }
        if !self.object_medium.is_valid() {
            return Err(OpticsError::InvalidSystem(format!(
                "degenerate object medium: {:?}",
                self.object_medium
            )));
        }
        for (k, element) in self.entries.iter().enumerate() {
            match element.surface.shape {
                Shape::Plane => (),
                Shape::Sphere { roc } | Shape::Conic { roc, .. } => {
                    if !roc.is_finite() || roc == 0f64 {
                        return Err(OpticsError::InvalidSystem(format!(
                            "surface #{k}: degenerate radius of curvature {roc}"
                        )));
                    }
                }
            }
            if !element.surface.frame.origin.iter().all(|x| x.is_finite()) {
                return Err(OpticsError::InvalidSystem(format!(
                    "surface #{k}: non-finite placement"
                )));
            }
            if let Some(aperture) = element.surface.aperture {
                if !aperture.is_valid() {
                    return Err(OpticsError::InvalidSystem(format!(
                        "surface #{k}: degenerate aperture {aperture:?}"
                    )));
                }
            }
            if !element.medium_after.is_valid() {
                return Err(OpticsError::InvalidSystem(format!(
                    "surface #{k}: degenerate medium {:?}",
                    element.medium_after
                )));
            }
        }
        Ok(OpticalSystem {
            object_medium: self.object_medium,
            elements: self.entries,
        })
    }
}
