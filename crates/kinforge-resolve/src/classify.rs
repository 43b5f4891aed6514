//! Mate classification.
//!
//! A pure function over one mate plus the override table — no side
//! effects, no shared state. Geometry decides the joint kind unless the
//! user forced one by mate name; name suffixes carry the axis-inversion
//! convention from the source CAD model.

use kinforge_ir::{JointKind, Mate, MateKind};

use crate::config::ResolveConfig;

/// Structural role of a mate in the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MateRole {
    /// A single-DOF joint (or rigid mount) between two links.
    Joint(JointKind),
    /// A `frame_*` marker: fused rigidly, recorded as a named frame.
    Frame,
    /// Multi-DOF geometry the tree model cannot represent.
    Unsupported,
    /// Not a structural relation; excluded from the tree.
    NonStructural,
}

/// A mate annotated with its resolved role and naming metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedMate {
    /// Structural role.
    pub role: MateRole,
    /// Joint name: the mate name minus the `dof_` prefix and the
    /// inversion suffix.
    pub joint_name: String,
    /// The `_inv`/`_inverted` suffix was present: flip the joint axis
    /// and negate-swap the limits.
    pub inverted: bool,
}

/// Classify one mate.
///
/// Priority: an explicit override by mate name always wins; then the
/// `frame_` naming convention; then geometric kind. Cylindrical maps to
/// [`MateRole::Unsupported`] — two degrees of freedom are reported,
/// never silently demoted. Anything else non-articulating is
/// [`MateRole::NonStructural`].
pub fn classify(mate: &Mate, config: &ResolveConfig) -> ClassifiedMate {
    let (stem, inverted) = strip_inversion(&mate.name);
    let stem = stem.strip_prefix("dof_").unwrap_or(stem);
    let joint_name = if stem.is_empty() {
        mate.name.clone()
    } else {
        stem.to_string()
    };

    let role = if let Some(kind) = config.mate_overrides.get(&mate.name) {
        MateRole::Joint(*kind)
    } else if mate.name.starts_with("frame_") {
        MateRole::Frame
    } else {
        match mate.kind {
            MateKind::Fastened => MateRole::Joint(JointKind::Fixed),
            MateKind::Revolute | MateKind::Pin => MateRole::Joint(JointKind::Revolute),
            MateKind::Slider => MateRole::Joint(JointKind::Prismatic),
            MateKind::Cylindrical => MateRole::Unsupported,
            _ => MateRole::NonStructural,
        }
    };

    ClassifiedMate {
        role,
        joint_name,
        inverted,
    }
}

fn strip_inversion(name: &str) -> (&str, bool) {
    if let Some(stem) = name.strip_suffix("_inverted") {
        (stem, true)
    } else if let Some(stem) = name.strip_suffix("_inv") {
        (stem, true)
    } else {
        (name, false)
    }
}
