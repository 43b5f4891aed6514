//! Error types for assembly resolution.

use kinforge_ir::MateKind;
use kinforge_math::TransformError;
use thiserror::Error;

/// Errors that can occur while resolving an assembly.
///
/// All variants are terminal for the assembly being processed; a
/// malformed tree cannot safely be partially serialized. Callers
/// converting many assemblies catch the error per assembly and continue.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Structural input invalid: unknown reference, duplicate or cyclic
    /// occurrence parentage, or a self-mate.
    #[error("malformed assembly: {0}")]
    MalformedAssembly(String),

    /// Tree resolution could not reach every link from the root.
    #[error("disconnected assembly; unreached link(s): {}", links.join(", "))]
    DisconnectedAssembly {
        /// Names of the links not reachable from the root.
        links: Vec<String>,
    },

    /// A joint's motion axis has near-zero length.
    #[error("joint '{joint}' has a degenerate axis (norm {norm:.3e})")]
    DegenerateAxis {
        /// Joint name.
        joint: String,
        /// Norm of the offending axis.
        norm: f64,
    },

    /// A rotation component was not orthonormal within tolerance.
    #[error("invalid transform: {0}")]
    InvalidTransform(#[from] TransformError),

    /// A mate maps to a multi-DOF joint the tree model cannot represent.
    #[error("mate '{mate}' maps to unsupported joint geometry {kind:?}")]
    UnsupportedJointKind {
        /// Mate name.
        mate: String,
        /// Source geometric kind.
        kind: MateKind,
    },
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
