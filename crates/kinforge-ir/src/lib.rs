#![warn(missing_docs)]

//! Data model for the kinforge assembly-to-robot pipeline.
//!
//! This crate defines the two value types exchanged with the external
//! collaborators: the [`AssemblySnapshot`] handed in by the CAD-fetch
//! step, and the [`KinematicTree`] handed off to serialization and mesh
//! export. Both are plain serde records — no math types, no behavior
//! beyond (de)serialization helpers. All output collections are `Vec`s
//! with index ids so repeated runs serialize byte-identically.

use serde::{Deserialize, Serialize};

/// Stable opaque identifier of one instance in the source assembly.
pub type OccurrenceId = String;

/// Path of instance ids from the root assembly down to one occurrence.
///
/// The path is the occurrence's identity in the flattened graph: the
/// same part instanced through two different sub-assembly instances
/// yields two distinct paths sharing a leaf id.
pub type OccurrencePath = Vec<OccurrenceId>;

/// 3D vector with f64 components (conventionally meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Whether an instance is a leaf part or a sub-assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    /// A leaf part carrying geometry.
    Part,
    /// A sub-assembly instance (no geometry of its own).
    Assembly,
}

/// Reference to a part or sub-assembly definition in the CAD service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRef {
    /// Document holding the definition.
    pub document_id: String,
    /// Element (tab) holding the definition.
    pub element_id: String,
    /// Part id within the element; `None` for sub-assemblies.
    #[serde(default)]
    pub part_id: Option<String>,
}

/// One instantiated part or sub-assembly in the flattened assembly graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Path of instance ids from the root assembly.
    pub path: OccurrencePath,
    /// Instance name as authored in the CAD model.
    pub name: String,
    /// Leaf part or sub-assembly.
    pub kind: InstanceKind,
    /// Definition this occurrence instantiates.
    pub definition: PartRef,
    /// Local-to-parent rigid transform, row-major 4x4.
    pub transform: [f64; 16],
    /// Excluded from the conversion when set.
    #[serde(default)]
    pub suppressed: bool,
    /// Link-name tag (from a `link_*` connector in the source model).
    #[serde(default)]
    pub link_name: Option<String>,
}

impl Occurrence {
    /// The occurrence's own instance id (last path segment).
    pub fn id(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Geometric kind of a mate as reported by the CAD service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MateKind {
    /// Rigid fastening, zero degrees of freedom.
    Fastened,
    /// One rotational degree of freedom.
    Revolute,
    /// Pin joint — treated like revolute.
    Pin,
    /// One translational degree of freedom.
    Slider,
    /// Rotation plus translation along the same axis (two DOF).
    Cylindrical,
    /// Three rotational degrees of freedom.
    Ball,
    /// Planar constraint.
    Planar,
    /// Parallel constraint.
    Parallel,
    /// Tangent constraint.
    Tangent,
    /// Any kind this model does not distinguish.
    #[serde(other)]
    Other,
}

/// The mate's local coordinate system on one endpoint, expressed in that
/// occurrence's local space. The mate's motion axis is the connector Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MateConnector {
    /// Connector origin.
    pub origin: Vec3,
    /// Connector X axis.
    pub x_axis: Vec3,
    /// Connector Y axis.
    pub y_axis: Vec3,
    /// Connector Z axis (motion axis).
    pub z_axis: Vec3,
}

/// One side of a mate: the constrained occurrence and the mate's frame
/// in that occurrence's local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MateEndpoint {
    /// Path of the constrained occurrence.
    pub occurrence: OccurrencePath,
    /// Mate frame on this side.
    pub connector: MateConnector,
}

/// Motion limits on a mate. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MateLimits {
    /// Lower bound (radians or meters), if declared.
    #[serde(default)]
    pub lower: Option<f64>,
    /// Upper bound (radians or meters), if declared.
    #[serde(default)]
    pub upper: Option<f64>,
}

impl MateLimits {
    /// True when neither bound is declared.
    pub fn is_unlimited(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

/// A named geometric constraint between exactly two occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mate {
    /// Mate name as authored in the CAD model.
    pub name: String,
    /// Geometric kind.
    pub kind: MateKind,
    /// The two constrained endpoints. Index 0 is the child side, index 1
    /// the parent side, matching the CAD service's mated-entity order.
    pub endpoints: [MateEndpoint; 2],
    /// Declared motion limits, if any.
    #[serde(default)]
    pub limits: Option<MateLimits>,
}

/// A materialized assembly snapshot: the complete input to resolution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssemblySnapshot {
    /// All occurrences, parents listed before children.
    pub occurrences: Vec<Occurrence>,
    /// All mates, in declaration order.
    pub mates: Vec<Mate>,
}

impl AssemblySnapshot {
    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// =============================================================================
// Output model
// =============================================================================

/// Index of a link in [`KinematicTree::links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub usize);

/// Kind of a resolved single-DOF joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Rigid connection.
    Fixed,
    /// Rotation about the joint axis.
    Revolute,
    /// Translation along the joint axis.
    Prismatic,
}

/// A directed, axis-bearing connection between two links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Joint name (derived from the source mate name).
    pub name: String,
    /// Joint kind.
    pub kind: JointKind,
    /// Parent link.
    pub parent: LinkId,
    /// Child link.
    pub child: LinkId,
    /// Joint frame expressed in the parent link frame, row-major 4x4.
    pub origin: [f64; 16],
    /// Unit motion axis expressed in the parent link frame.
    pub axis: Vec3,
    /// Motion limits carried through from the source mate.
    #[serde(default)]
    pub limits: Option<MateLimits>,
}

/// One occurrence's geometry placement within a link — the handoff unit
/// for the mesh-export collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPart {
    /// Leaf instance id of the occurrence.
    pub occurrence: OccurrenceId,
    /// Full occurrence path.
    pub path: OccurrencePath,
    /// Definition reference for geometry lookup.
    pub definition: PartRef,
    /// Placement relative to the link body frame, row-major 4x4.
    pub origin: [f64; 16],
}

/// A named auxiliary frame attached to a link (from a `frame_*` mate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFrame {
    /// Frame name (source mate name minus the `frame_` prefix).
    pub name: String,
    /// Frame relative to the link body, row-major 4x4.
    pub origin: [f64; 16],
}

/// A rigid body in the output tree, possibly fusing several occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link name.
    pub name: String,
    /// Body frame of the link in world space, row-major 4x4.
    pub body: [f64; 16],
    /// Constituent part placements, in flattening order.
    pub parts: Vec<LinkPart>,
    /// Auxiliary named frames.
    #[serde(default)]
    pub frames: Vec<LinkFrame>,
}

/// The resolved rooted tree of links and joints.
///
/// Invariants (enforced by the resolver, relied on by consumers): the
/// root has no incoming joint, every other link has exactly one, and
/// every link is reachable from the root exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicTree {
    /// The root link.
    pub root: LinkId,
    /// All links; `LinkId` indexes into this list.
    pub links: Vec<Link>,
    /// All joints, in traversal order from the root.
    pub joints: Vec<Joint>,
}

impl KinematicTree {
    /// Look up a link by id.
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON. Output ordering is the stored `Vec` ordering,
    /// so identical trees serialize byte-identically.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
