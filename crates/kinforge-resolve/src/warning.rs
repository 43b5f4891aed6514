//! Non-fatal conditions reported alongside a successful resolution.

use kinforge_ir::MateKind;
use thiserror::Error;

/// A non-fatal condition encountered during resolution.
///
/// Warnings are accumulated in the [`Resolution`](crate::Resolution)
/// rather than logged, so the engine stays a pure function and callers
/// decide how to surface them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    /// A mate whose endpoints were already connected by a prior path;
    /// the tree keeps the first path discovered in traversal order.
    #[error("redundant mate '{mate}' dropped (endpoints already connected)")]
    RedundantMate {
        /// Mate name.
        mate: String,
    },

    /// A mate whose geometry does not describe a joint or rigid mount.
    #[error("non-structural mate '{mate}' ({kind:?}) excluded from the tree")]
    NonStructuralMate {
        /// Mate name.
        mate: String,
        /// Source geometric kind.
        kind: MateKind,
    },

    /// A multi-DOF mate excluded under the `Warn` policy.
    #[error("mate '{mate}' maps to unsupported joint geometry {kind:?}; excluded")]
    UnsupportedMate {
        /// Mate name.
        mate: String,
        /// Source geometric kind.
        kind: MateKind,
    },

    /// A joint carrying no motion limits (continuous revolute or
    /// unbounded slider).
    #[error("joint '{joint}' has no limits")]
    UnlimitedJoint {
        /// Joint name.
        joint: String,
    },

    /// A mate referencing a suppressed occurrence; skipped.
    #[error("mate '{mate}' references a suppressed occurrence; skipped")]
    SuppressedMate {
        /// Mate name.
        mate: String,
    },

    /// Two occurrences fused into one link carried distinct link-name
    /// tags; the first tag in flattening order wins.
    #[error("link '{link}': name tag '{rejected}' conflicts with '{kept}'")]
    LinkNameConflict {
        /// Final link name.
        link: String,
        /// The tag that was kept.
        kept: String,
        /// The tag that was discarded.
        rejected: String,
    },
}
