//! Sparse-type overrides from run configuration.

use crate::chars::{ElementChars, FaceChars};
use serde::Deserialize;
use std::fmt;

/// Which kind of entity an override targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverrideCategory {
    /// Mesh vertices.
    Vertex,
    /// Faces between elements.
    Face,
    /// Elements.
    Element,
}

impl fmt::Display for OverrideCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Face => write!(f, "face"),
            Self::Element => write!(f, "element"),
        }
    }
}

/// Tags every entity located inside `domain` with the bits of `value`.
///
/// Bits are OR-ed into the existing sparse type, so overrides compose.
///
/// # Examples
///
/// ```
/// use cadence_mesh::{sparse_type, FaceChars, SparseTypeOverride};
///
/// let mut faces: Vec<FaceChars> = (0..5)
///     .map(|i| FaceChars { position: i as f64 * 0.25, sparse_type: 0 })
///     .collect();
/// let wall = SparseTypeOverride { domain: [0.4, 0.6], value: sparse_type::FREE_SURFACE };
/// assert_eq!(wall.apply_faces(&mut faces), 1);
/// assert_eq!(faces[2].sparse_type, sparse_type::FREE_SURFACE);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SparseTypeOverride {
    /// Closed interval `[lo, hi]` of positions to tag.
    pub domain: [f64; 2],
    /// Sparse-type bits to set.
    pub value: u32,
}

impl SparseTypeOverride {
    /// Whether `x` lies in the closed override domain.
    pub fn contains(&self, x: f64) -> bool {
        let [lo, hi] = self.domain;
        lo <= x && x <= hi
    }

    /// Set the bits on every face inside the domain. Returns how many
    /// faces were tagged.
    pub fn apply_faces(&self, faces: &mut [FaceChars]) -> usize {
        let mut tagged = 0;
        for face in faces.iter_mut().filter(|f| self.contains(f.position)) {
            face.sparse_type |= self.value;
            tagged += 1;
        }
        tagged
    }

    /// Set the bits on every element whose centroid lies inside the
    /// domain. Returns how many elements were tagged.
    pub fn apply_elements(&self, elements: &mut [ElementChars]) -> usize {
        let mut tagged = 0;
        for el in elements.iter_mut().filter(|e| self.contains(e.centroid)) {
            el.sparse_type |= self.value;
            tagged += 1;
        }
        tagged
    }
}
