//! Joint frame resolution.
//!
//! For every edge of the resolved tree, composes the chain of
//! occurrence-to-root transforms with the mate's local connector frame
//! and re-expresses the result — origin and motion axis — in the parent
//! link's frame.

use kinforge_ir::{Joint, LinkId, MateConnector, MateLimits};
use kinforge_math::{Frame, Vec3, AXIS_EPS};
use nalgebra::Matrix3;

use crate::error::{ResolveError, Result};
use crate::graph::AssemblyGraph;
use crate::tree::ResolvedTree;
use crate::warning::Warning;

/// Rotation by π about the connector X axis, used for `_inv` mates.
fn x_flip() -> Frame {
    Frame {
        rotation: Matrix3::from_diagonal(&Vec3::new(1.0, -1.0, -1.0)),
        translation: Vec3::zeros(),
    }
}

fn vec3(v: &kinforge_ir::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// The connector's frame in its occurrence's local space: translation to
/// the connector origin, then the connector axes as rotation columns.
fn connector_frame(connector: &MateConnector) -> std::result::Result<Frame, kinforge_math::TransformError> {
    let rotation = Matrix3::from_columns(&[
        vec3(&connector.x_axis),
        vec3(&connector.y_axis),
        vec3(&connector.z_axis),
    ]);
    Frame::from_parts(rotation, vec3(&connector.origin))
}

/// Resolve joint origins, axes, and limits for every tree edge.
pub(crate) fn resolve_joints(
    graph: &AssemblyGraph,
    resolved: &ResolvedTree,
    bodies: &[Frame],
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Joint>> {
    let mut joints = Vec::with_capacity(resolved.joints.len());
    for edge in &resolved.joints {
        let mate = &graph.mates()[edge.mate];
        let endpoints = graph.mate_endpoints(edge.mate);
        let anchor = endpoints[edge.child_endpoint];
        let connector = &mate.endpoints[edge.child_endpoint].connector;

        let z = vec3(&connector.z_axis);
        let z_norm = z.norm();
        if z_norm < AXIS_EPS {
            return Err(ResolveError::DegenerateAxis {
                joint: edge.name.clone(),
                norm: z_norm,
            });
        }

        let mut world = graph.world(anchor).compose(&connector_frame(connector)?);
        if edge.inverted {
            world = world.compose(&x_flip());
        }
        let origin = bodies[edge.parent].inverse().compose(&world);

        // The motion axis is the connector Z expressed in the parent
        // link frame.
        let axis = origin.transform_vector(&Vec3::z());
        let axis_norm = axis.norm();
        if axis_norm < AXIS_EPS {
            return Err(ResolveError::DegenerateAxis {
                joint: edge.name.clone(),
                norm: axis_norm,
            });
        }
        let axis = axis / axis_norm;

        let limits = match (mate.limits, edge.inverted) {
            (Some(l), true) => Some(MateLimits {
                lower: l.upper.map(|v| -v),
                upper: l.lower.map(|v| -v),
            }),
            (l, _) => l,
        };
        if limits.map_or(true, |l| l.is_unlimited()) {
            warnings.push(Warning::UnlimitedJoint {
                joint: edge.name.clone(),
            });
        }

        joints.push(Joint {
            name: edge.name.clone(),
            kind: edge.kind,
            parent: LinkId(edge.parent),
            child: LinkId(edge.child),
            origin: origin.to_matrix(),
            axis: kinforge_ir::Vec3::new(axis.x, axis.y, axis.z),
            limits,
        });
    }
    Ok(joints)
}

#[cfg(test)]
mod tests {
    use crate::test_fixtures::{
        connector_at, occurrence, revolute_mate_with, snapshot_of, translation,
    };
    use crate::{resolve, ResolveConfig, ResolveError};
    use kinforge_ir::Vec3;

    #[test]
    fn degenerate_connector_axis_fails() {
        let snapshot = snapshot_of(
            vec![
                occurrence("a", translation(0.0, 0.0, 0.0)),
                occurrence("b", translation(1.0, 0.0, 0.0)),
            ],
            vec![revolute_mate_with(
                "dof_bad",
                &["b"],
                &["a"],
                connector_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
                None,
            )],
        );
        match resolve(&snapshot, &ResolveConfig::default()) {
            Err(ResolveError::DegenerateAxis { joint, .. }) => assert_eq!(joint, "bad"),
            other => panic!("expected DegenerateAxis, got {other:?}"),
        }
    }

    #[test]
    fn skewed_connector_frame_is_invalid_transform() {
        // Unit-length z but x not orthogonal to it.
        let connector = kinforge_ir::MateConnector {
            origin: Vec3::new(0.0, 0.0, 0.0),
            x_axis: Vec3::new(0.7, 0.0, 0.7),
            y_axis: Vec3::new(0.0, 1.0, 0.0),
            z_axis: Vec3::new(0.0, 0.0, 1.0),
        };
        let snapshot = snapshot_of(
            vec![
                occurrence("a", translation(0.0, 0.0, 0.0)),
                occurrence("b", translation(1.0, 0.0, 0.0)),
            ],
            vec![revolute_mate_with(
                "dof_skew",
                &["b"],
                &["a"],
                connector,
                None,
            )],
        );
        assert!(matches!(
            resolve(&snapshot, &ResolveConfig::default()),
            Err(ResolveError::InvalidTransform(_))
        ));
    }
}
