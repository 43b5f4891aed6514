#![warn(missing_docs)]

//! kinforge — CAD assembly to robot kinematic tree conversion.
//!
//! Facade over the kinforge member crates. Feed a materialized
//! [`AssemblySnapshot`] (from the CAD-fetch step) and a
//! [`ResolveConfig`] to [`resolve`], and get back a [`KinematicTree`]
//! plus the warnings accumulated along the way.
//!
//! # Example
//!
//! ```
//! use kinforge::{resolve, AssemblySnapshot, ResolveConfig};
//!
//! let snapshot = AssemblySnapshot::from_json(
//!     r#"{
//!       "occurrences": [
//!         {"path": ["base"], "name": "Base <1>", "kind": "part",
//!          "definition": {"document_id": "d", "element_id": "e", "part_id": "p1"},
//!          "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]},
//!         {"path": ["arm"], "name": "Arm <1>", "kind": "part",
//!          "definition": {"document_id": "d", "element_id": "e", "part_id": "p2"},
//!          "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0.2, 0,0,0,1]}
//!       ],
//!       "mates": [
//!         {"name": "dof_shoulder", "kind": "REVOLUTE",
//!          "endpoints": [
//!            {"occurrence": ["arm"],
//!             "connector": {"origin": {"x":0,"y":0,"z":0},
//!                           "x_axis": {"x":1,"y":0,"z":0},
//!                           "y_axis": {"x":0,"y":1,"z":0},
//!                           "z_axis": {"x":0,"y":0,"z":1}}},
//!            {"occurrence": ["base"],
//!             "connector": {"origin": {"x":0,"y":0,"z":0},
//!                           "x_axis": {"x":1,"y":0,"z":0},
//!                           "y_axis": {"x":0,"y":1,"z":0},
//!                           "z_axis": {"x":0,"y":0,"z":1}}}
//!          ],
//!          "limits": {"lower": -1.57, "upper": 1.57}}
//!       ]
//!     }"#,
//! )
//! .unwrap();
//!
//! let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
//! assert_eq!(resolution.tree.links.len(), 2);
//! assert_eq!(resolution.tree.joints.len(), 1);
//! assert_eq!(resolution.tree.joints[0].name, "shoulder");
//! ```

pub use kinforge_ir;
pub use kinforge_math;
pub use kinforge_resolve;

pub use kinforge_ir::{AssemblySnapshot, Joint, JointKind, KinematicTree, Link, LinkId};
pub use kinforge_resolve::{
    resolve, Resolution, ResolveConfig, ResolveError, UnsupportedPolicy, Warning,
};
