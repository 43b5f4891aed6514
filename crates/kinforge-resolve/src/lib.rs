#![warn(missing_docs)]

//! Assembly-to-kinematic-tree resolution engine.
//!
//! Takes a materialized CAD assembly snapshot — occurrences plus named
//! geometric mates — and produces a rooted tree of rigid links connected
//! by single-DOF joints, with fully resolved frames, axes, and motion
//! limits. Resolution is a pure function of (snapshot, configuration):
//! no I/O, no shared state, one synchronous pass per assembly.
//!
//! Pipeline: [`AssemblyGraph::build`] indexes and validates the input;
//! [`classify`] annotates each mate; the tree resolver merges fixed
//! relations union-find style and spans a breadth-first joint tree from
//! the root; the link aggregator and joint resolver then express every
//! geometry placement and joint frame in its link's frame.
//!
//! Terminal failures are [`ResolveError`]s; recoverable oddities
//! (redundant constraints, non-structural mates, unlimited joints) are
//! accumulated as [`Warning`]s next to the successful result, never
//! silently dropped.

mod classify;
mod config;
mod error;
mod graph;
mod joints;
mod links;
mod tree;
mod warning;

pub use classify::{classify, ClassifiedMate, MateRole};
pub use config::{ResolveConfig, UnsupportedPolicy};
pub use error::{ResolveError, Result};
pub use graph::AssemblyGraph;
pub use warning::Warning;

use kinforge_ir::{AssemblySnapshot, KinematicTree, LinkId};

/// A successful resolution: the kinematic tree plus every non-fatal
/// condition encountered while producing it.
#[derive(Debug)]
pub struct Resolution {
    /// The resolved tree. Root is always `LinkId(0)`.
    pub tree: KinematicTree,
    /// Accumulated warnings, in detection order.
    pub warnings: Vec<Warning>,
}

/// Resolve one assembly snapshot into a kinematic tree.
///
/// Deterministic: identical input (including occurrence and mate
/// ordering) produces byte-identical serialized output.
pub fn resolve(snapshot: &AssemblySnapshot, config: &ResolveConfig) -> Result<Resolution> {
    let mut warnings = Vec::new();
    let graph = AssemblyGraph::build(snapshot)?;
    let classified: Vec<ClassifiedMate> = graph
        .mates()
        .iter()
        .map(|mate| classify(mate, config))
        .collect();
    let resolved = tree::resolve_tree(&graph, &classified, config, &mut warnings)?;
    let (links, bodies) = links::aggregate_links(&graph, &resolved);
    let joints = joints::resolve_joints(&graph, &resolved, &bodies, &mut warnings)?;
    Ok(Resolution {
        tree: KinematicTree {
            root: LinkId(0),
            links,
            joints,
        },
        warnings,
    })
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;
    use approx::assert_relative_eq;
    use kinforge_ir::{JointKind, MateKind, MateLimits, Vec3};
    use kinforge_math::Frame;

    /// Base, upper arm, forearm with a fastened bracket: the canonical
    /// two-joint chain.
    fn arm_snapshot() -> kinforge_ir::AssemblySnapshot {
        let mut upper = occurrence("upper", translation(0.0, 0.0, 0.1));
        upper.name = "Upper Arm <1>".into();
        snapshot_of(
            vec![
                occurrence("base", translation(0.0, 0.0, 0.0)),
                upper,
                occurrence("fore", translation(0.0, 0.0, 0.4)),
                occurrence("bracket", translation(0.1, 0.0, 0.4)),
            ],
            vec![
                revolute_mate_with(
                    "dof_shoulder",
                    &["upper"],
                    &["base"],
                    connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
                    Some(MateLimits {
                        lower: Some(-1.57),
                        upper: Some(1.57),
                    }),
                ),
                revolute_mate_with(
                    "dof_elbow",
                    &["fore"],
                    &["upper"],
                    connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
                    None,
                ),
                plain_mate("mount", MateKind::Fastened, &["bracket"], &["fore"]),
            ],
        )
    }

    #[test]
    fn two_joint_arm_resolves() {
        let resolution = resolve(&arm_snapshot(), &ResolveConfig::default()).unwrap();
        let tree = &resolution.tree;

        assert_eq!(tree.root.0, 0);
        let names: Vec<&str> = tree.links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["base", "upper_arm", "fore"]);

        // The bracket is fused into the forearm link.
        assert_eq!(tree.links[2].parts.len(), 2);
        let bracket = &tree.links[2].parts[1];
        assert_eq!(bracket.occurrence, "bracket");
        assert_relative_eq!(bracket.origin[3], 0.1, epsilon = 1e-12);
        assert_relative_eq!(bracket.origin[11], 0.0, epsilon = 1e-12);

        assert_eq!(tree.joints.len(), 2);
        let shoulder = &tree.joints[0];
        assert_eq!(shoulder.name, "shoulder");
        assert_eq!(shoulder.kind, JointKind::Revolute);
        assert_eq!((shoulder.parent.0, shoulder.child.0), (0, 1));
        assert_relative_eq!(shoulder.origin[11], 0.1, epsilon = 1e-12);
        assert_relative_eq!(shoulder.axis.z, 1.0, epsilon = 1e-12);
        assert_eq!(
            shoulder.limits,
            Some(MateLimits {
                lower: Some(-1.57),
                upper: Some(1.57),
            })
        );

        let elbow = &tree.joints[1];
        assert_eq!(elbow.name, "elbow");
        assert_eq!((elbow.parent.0, elbow.child.0), (1, 2));
        // Expressed in the upper-arm frame (body at z = 0.1).
        assert_relative_eq!(elbow.origin[11], 0.3, epsilon = 1e-12);
        assert_relative_eq!(elbow.axis.y, 1.0, epsilon = 1e-12);
        assert_eq!(elbow.limits, None);

        assert_eq!(
            resolution.warnings,
            vec![Warning::UnlimitedJoint {
                joint: "elbow".into()
            }]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let snapshot = arm_snapshot();
        let a = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let b = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        assert_eq!(a.tree.to_json().unwrap(), b.tree.to_json().unwrap());
    }

    #[test]
    fn fixed_permutation_preserves_link_partition() {
        let occurrences = || {
            vec![
                occurrence("a", translation(0.0, 0.0, 0.0)),
                occurrence("b", translation(1.0, 0.0, 0.0)),
                occurrence("c", translation(2.0, 0.0, 0.0)),
                occurrence("d", translation(3.0, 0.0, 0.0)),
            ]
        };
        let fixed = |name: &str, x: &str, y: &str| {
            plain_mate(name, MateKind::Fastened, &[x], &[y])
        };
        let hinge = plain_mate("dof_j", MateKind::Revolute, &["d"], &["a"]);

        let mut partitions = Vec::new();
        for mates in [
            vec![fixed("m1", "a", "b"), fixed("m2", "b", "c"), hinge.clone()],
            vec![fixed("m2", "b", "c"), fixed("m1", "a", "b"), hinge.clone()],
            vec![fixed("m2", "c", "b"), hinge.clone(), fixed("m1", "b", "a")],
        ] {
            let resolution =
                resolve(&snapshot_of(occurrences(), mates), &ResolveConfig::default()).unwrap();
            let partition: Vec<Vec<String>> = resolution
                .tree
                .links
                .iter()
                .map(|link| link.parts.iter().map(|p| p.occurrence.clone()).collect())
                .collect();
            partitions.push(partition);
        }
        assert_eq!(partitions[0], partitions[1]);
        assert_eq!(partitions[0], partitions[2]);
    }

    #[test]
    fn joint_frame_composition_round_trips() {
        // Rotated, translated base so the re-expression is non-trivial.
        let axis = kinforge_math::Dir3::new_normalize(kinforge_math::Vec3::new(0.2, 1.0, 0.3));
        let base_frame =
            Frame::translation(0.5, -0.2, 0.8).compose(&Frame::rotation_about_axis(&axis, 0.9));
        let snapshot = snapshot_of(
            vec![
                occurrence("base", base_frame.to_matrix()),
                occurrence("arm", translation(0.0, 0.3, 0.0)),
            ],
            vec![revolute_mate_with(
                "dof_j",
                &["arm"],
                &["base"],
                connector_at(Vec3::new(0.05, 0.0, 0.02), Vec3::new(0.0, 1.0, 0.0)),
                None,
            )],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let joint = &resolution.tree.joints[0];
        let body = Frame::from_matrix(&resolution.tree.links[0].body).unwrap();
        let origin = Frame::from_matrix(&joint.origin).unwrap();

        // Composing the body frame with the joint frame and inverting
        // recovers the connector-local axis.
        let world = body.compose(&origin);
        let axis_world = world.transform_vector(&kinforge_math::Vec3::z());
        let recovered = world.inverse().transform_vector(&axis_world);
        assert_relative_eq!(recovered, kinforge_math::Vec3::z(), epsilon = 1e-9);

        // And the joint axis is that world axis re-expressed in the
        // parent body frame.
        let expected = body.inverse().transform_vector(&axis_world);
        assert_relative_eq!(joint.axis.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(joint.axis.y, expected.y, epsilon = 1e-9);
        assert_relative_eq!(joint.axis.z, expected.z, epsilon = 1e-9);
    }

    #[test]
    fn inverted_mate_flips_axis_and_limits() {
        let snapshot = snapshot_of(
            vec![
                occurrence("base", translation(0.0, 0.0, 0.0)),
                occurrence("arm", translation(0.0, 0.0, 0.2)),
            ],
            vec![revolute_mate_with(
                "dof_j_inv",
                &["arm"],
                &["base"],
                connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
                Some(MateLimits {
                    lower: Some(-0.5),
                    upper: Some(1.0),
                }),
            )],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let joint = &resolution.tree.joints[0];
        assert_eq!(joint.name, "j");
        assert_relative_eq!(joint.axis.z, -1.0, epsilon = 1e-12);
        assert_eq!(
            joint.limits,
            Some(MateLimits {
                lower: Some(-1.0),
                upper: Some(0.5),
            })
        );
    }

    #[test]
    fn cylindrical_is_never_silently_demoted() {
        let snapshot = || {
            snapshot_of(
                vec![
                    occurrence("a", translation(0.0, 0.0, 0.0)),
                    occurrence("b", translation(1.0, 0.0, 0.0)),
                ],
                vec![
                    plain_mate("dof_j", MateKind::Revolute, &["b"], &["a"]),
                    plain_mate("spindle", MateKind::Cylindrical, &["b"], &["a"]),
                ],
            )
        };

        match resolve(&snapshot(), &ResolveConfig::default()) {
            Err(ResolveError::UnsupportedJointKind { mate, kind }) => {
                assert_eq!(mate, "spindle");
                assert_eq!(kind, MateKind::Cylindrical);
            }
            other => panic!("expected UnsupportedJointKind, got {other:?}"),
        }

        let config = ResolveConfig {
            on_unsupported: UnsupportedPolicy::Warn,
            ..ResolveConfig::default()
        };
        let resolution = resolve(&snapshot(), &config).unwrap();
        assert_eq!(resolution.tree.joints.len(), 1);
        assert_eq!(resolution.tree.joints[0].kind, JointKind::Revolute);
        assert_eq!(
            resolution.warnings,
            vec![Warning::UnsupportedMate {
                mate: "spindle".into(),
                kind: MateKind::Cylindrical,
            }]
        );
    }

    #[test]
    fn excluded_unsupported_mate_can_disconnect() {
        let snapshot = snapshot_of(
            vec![
                occurrence("a", translation(0.0, 0.0, 0.0)),
                occurrence("b", translation(1.0, 0.0, 0.0)),
            ],
            vec![plain_mate("spindle", MateKind::Cylindrical, &["b"], &["a"])],
        );
        let config = ResolveConfig {
            on_unsupported: UnsupportedPolicy::Warn,
            ..ResolveConfig::default()
        };
        assert!(matches!(
            resolve(&snapshot, &config),
            Err(ResolveError::DisconnectedAssembly { .. })
        ));
    }

    #[test]
    fn sub_assembly_contents_ride_rigidly() {
        let snapshot = snapshot_of(
            vec![
                occurrence("base", translation(0.0, 0.0, 0.0)),
                sub_assembly("arm", translation(0.0, 0.0, 0.5)),
                sub_occurrence(&["arm", "p1"], translation(0.0, 0.0, 0.0)),
                sub_occurrence(&["arm", "p2"], translation(0.0, 0.1, 0.0)),
            ],
            vec![revolute_mate_with(
                "dof_shoulder",
                &["arm", "p1"],
                &["base"],
                connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
                None,
            )],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let tree = &resolution.tree;
        assert_eq!(tree.links.len(), 2);
        // Both interior parts land in the arm link; the sub-assembly
        // occurrence itself carries no geometry.
        let arm_parts: Vec<&str> = tree.links[1]
            .parts
            .iter()
            .map(|p| p.occurrence.as_str())
            .collect();
        assert_eq!(arm_parts, ["p1", "p2"]);
        // Joint frame anchors on the deep endpoint occurrence.
        assert_relative_eq!(tree.joints[0].origin[11], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn frame_mate_attaches_named_frame() {
        let snapshot = snapshot_of(
            vec![
                occurrence("base", translation(0.0, 0.0, 0.0)),
                occurrence("marker", translation(0.0, 0.0, 0.3)),
            ],
            vec![plain_mate(
                "frame_tool_tip",
                MateKind::Fastened,
                &["marker"],
                &["base"],
            )],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let tree = &resolution.tree;
        assert_eq!(tree.links.len(), 1);
        assert_eq!(tree.links[0].frames.len(), 1);
        let frame = &tree.links[0].frames[0];
        assert_eq!(frame.name, "tool_tip");
        assert_relative_eq!(frame.origin[11], 0.3, epsilon = 1e-12);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn suppressed_occurrence_contributes_no_geometry() {
        let mut ghost = sub_occurrence(&["arm", "ghost"], translation(0.0, 0.0, 0.0));
        ghost.suppressed = true;
        let snapshot = snapshot_of(
            vec![
                occurrence("base", translation(0.0, 0.0, 0.0)),
                sub_assembly("arm", translation(0.0, 0.0, 0.5)),
                sub_occurrence(&["arm", "p1"], translation(0.0, 0.0, 0.0)),
                ghost,
            ],
            vec![revolute_mate_with(
                "dof_j",
                &["arm", "p1"],
                &["base"],
                connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
                None,
            )],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let arm_parts: Vec<&str> = resolution.tree.links[1]
            .parts
            .iter()
            .map(|p| p.occurrence.as_str())
            .collect();
        assert_eq!(arm_parts, ["p1"]);
    }

    #[test]
    fn tree_is_single_rooted_and_acyclic() {
        let resolution = resolve(&arm_snapshot(), &ResolveConfig::default()).unwrap();
        let tree = &resolution.tree;
        let mut incoming = vec![0usize; tree.links.len()];
        for joint in &tree.joints {
            incoming[joint.child.0] += 1;
            // Edges always point away from the root.
            assert!(joint.parent.0 < joint.child.0 || joint.parent.0 == 0);
        }
        assert_eq!(incoming[tree.root.0], 0);
        for (link, &n) in incoming.iter().enumerate() {
            if link != tree.root.0 {
                assert_eq!(n, 1, "link {link} must have exactly one incoming joint");
            }
        }
    }

    #[test]
    fn prismatic_mate_resolves_with_one_sided_limit() {
        let snapshot = snapshot_of(
            vec![
                occurrence("rail", translation(0.0, 0.0, 0.0)),
                occurrence("slide", translation(0.0, 0.0, 0.05)),
            ],
            vec![{
                let mut mate = plain_mate("dof_lift", MateKind::Slider, &["slide"], &["rail"]);
                mate.limits = Some(MateLimits {
                    lower: None,
                    upper: Some(0.25),
                });
                mate
            }],
        );
        let resolution = resolve(&snapshot, &ResolveConfig::default()).unwrap();
        let joint = &resolution.tree.joints[0];
        assert_eq!(joint.kind, JointKind::Prismatic);
        // One open bound stays open; no zero default is invented.
        assert_eq!(
            joint.limits,
            Some(MateLimits {
                lower: None,
                upper: Some(0.25),
            })
        );
        assert!(resolution.warnings.is_empty());
    }
}
