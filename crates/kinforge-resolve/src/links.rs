//! Link aggregation: canonical body frames and per-link geometry
//! placements for the mesh-export handoff.
//!
//! Purely a reorganization step — every transform here is a re-expression
//! of already-resolved world frames relative to each link's body frame.

use std::collections::HashMap;

use kinforge_ir::{InstanceKind, Link, LinkFrame, LinkPart};
use kinforge_math::Frame;

use crate::graph::AssemblyGraph;
use crate::tree::ResolvedTree;

/// Build the output links and return them alongside their body frames
/// (the joint resolver re-expresses joint frames against these).
pub(crate) fn aggregate_links(
    graph: &AssemblyGraph,
    resolved: &ResolvedTree,
) -> (Vec<Link>, Vec<Frame>) {
    let unit_of_top: HashMap<usize, usize> = resolved
        .units
        .iter()
        .enumerate()
        .map(|(unit, &occ)| (occ, unit))
        .collect();
    let link_of_occurrence =
        |index: usize| resolved.link_of_unit[unit_of_top[&graph.top_level(index)]];

    // Body frame: the anchor occurrence's world frame.
    let bodies: Vec<Frame> = resolved
        .links
        .iter()
        .map(|node| *graph.world(node.anchor))
        .collect();
    let inverse_bodies: Vec<Frame> = bodies.iter().map(Frame::inverse).collect();

    // Geometry placements, flattening order.
    let mut parts: Vec<Vec<LinkPart>> = vec![Vec::new(); resolved.links.len()];
    for (index, occ) in graph.occurrences() {
        if occ.kind != InstanceKind::Part {
            continue;
        }
        let link = link_of_occurrence(index);
        let relative = inverse_bodies[link].compose(graph.world(index));
        parts[link].push(LinkPart {
            occurrence: occ.id().to_string(),
            path: occ.path.clone(),
            definition: occ.definition.clone(),
            origin: relative.to_matrix(),
        });
    }

    // Named auxiliary frames from frame_* mates, declaration order. The
    // frame rides on the link owning the parent-side endpoint; its
    // transform is the marker occurrence's frame re-expressed there.
    let mut frames: Vec<Vec<LinkFrame>> = vec![Vec::new(); resolved.links.len()];
    for &m in &resolved.frame_mates {
        let mate = &graph.mates()[m];
        let [marker, owner] = graph.mate_endpoints(m);
        let link = link_of_occurrence(owner);
        let relative = inverse_bodies[link].compose(graph.world(marker));
        let name = mate.name.strip_prefix("frame_").unwrap_or(&mate.name);
        frames[link].push(LinkFrame {
            name: name.to_string(),
            origin: relative.to_matrix(),
        });
    }

    let links = resolved
        .links
        .iter()
        .zip(bodies.iter())
        .zip(parts.into_iter().zip(frames))
        .map(|((node, body), (parts, frames))| Link {
            name: node.name.clone(),
            body: body.to_matrix(),
            parts,
            frames,
        })
        .collect();

    (links, bodies)
}
