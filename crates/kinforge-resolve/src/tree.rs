//! Tree resolution: merge rigidly connected occurrences into links,
//! choose a root, and span the joint tree.
//!
//! Linkage granularity is the top-level instance: an occurrence deep in
//! a sub-assembly is rigid with its top-level ancestor, so mates merge
//! or articulate the top-level units containing their endpoints while
//! joint frames still anchor on the deep endpoint occurrences.
//!
//! Fixed mates are merged union-find style before any traversal, which
//! makes the final link partition insensitive to their declaration
//! order; only the traversal tie-break among articulated mates follows
//! declaration order, and that order is itself part of the input.

use std::collections::{BTreeMap, HashMap, VecDeque};

use kinforge_ir::JointKind;

use crate::classify::{ClassifiedMate, MateRole};
use crate::config::ResolveConfig;
use crate::error::{ResolveError, Result};
use crate::graph::AssemblyGraph;
use crate::warning::Warning;

/// One output link before frame/geometry aggregation.
#[derive(Debug)]
pub(crate) struct LinkNode {
    /// Final unique link name.
    pub name: String,
    /// Occurrence index of the link's anchor (the flattening-first
    /// top-level occurrence in the merged set).
    pub anchor: usize,
    /// Merged unit indices, ascending.
    pub units: Vec<usize>,
}

/// One directed joint edge selected by the traversal.
#[derive(Debug)]
pub(crate) struct JointEdge {
    /// Index into the graph's mate list.
    pub mate: usize,
    /// Joint name from classification.
    pub name: String,
    /// Joint kind.
    pub kind: JointKind,
    /// Axis inversion flag from classification.
    pub inverted: bool,
    /// Parent link (output index).
    pub parent: usize,
    /// Child link (output index).
    pub child: usize,
    /// Which mate endpoint (0 or 1) landed on the child side.
    pub child_endpoint: usize,
}

/// Resolver output: the link partition and the spanning joint tree.
#[derive(Debug)]
pub(crate) struct ResolvedTree {
    /// Links in output order; the root is index 0.
    pub links: Vec<LinkNode>,
    /// Occurrence index per unit, flattening order.
    pub units: Vec<usize>,
    /// Output link index per unit.
    pub link_of_unit: Vec<usize>,
    /// Joints in traversal order.
    pub joints: Vec<JointEdge>,
    /// Mate indices classified as `frame_*` markers.
    pub frame_mates: Vec<usize>,
}

struct StructuralEdge {
    mate: usize,
    name: String,
    kind: JointKind,
    inverted: bool,
    a: usize,
    b: usize,
}

/// Union-find over unit indices. Roots are always the smallest index in
/// their component, so representatives are deterministic regardless of
/// union order.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the components of `a` and `b`. Returns false when they were
    /// already one component.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[high] = low;
        true
    }
}

/// Resolve the link partition and spanning joint tree.
pub(crate) fn resolve_tree(
    graph: &AssemblyGraph,
    classified: &[ClassifiedMate],
    config: &ResolveConfig,
    warnings: &mut Vec<Warning>,
) -> Result<ResolvedTree> {
    // Units: non-suppressed top-level occurrences, flattening order.
    let mut units: Vec<usize> = Vec::new();
    let mut unit_by_top: HashMap<usize, usize> = HashMap::new();
    for (index, occ) in graph.occurrences() {
        if occ.path.len() == 1 {
            unit_by_top.insert(index, units.len());
            units.push(index);
        }
    }
    if units.is_empty() {
        return Err(ResolveError::MalformedAssembly(
            "assembly has no unsuppressed occurrences".into(),
        ));
    }

    // Pass 1: fixed merges first, articulated mates collected as edges.
    let mut uf = UnionFind::new(units.len());
    let mut structural: Vec<StructuralEdge> = Vec::new();
    let mut frame_mates: Vec<usize> = Vec::new();
    for (m, cm) in classified.iter().enumerate() {
        let [occ_a, occ_b] = graph.mate_endpoints(m);
        let mate = &graph.mates()[m];
        if graph.is_suppressed(occ_a) || graph.is_suppressed(occ_b) {
            warnings.push(Warning::SuppressedMate {
                mate: mate.name.clone(),
            });
            continue;
        }
        let unit_a = unit_by_top[&graph.top_level(occ_a)];
        let unit_b = unit_by_top[&graph.top_level(occ_b)];

        match cm.role {
            MateRole::Joint(JointKind::Fixed) => {
                if !uf.union(unit_a, unit_b) {
                    warnings.push(Warning::RedundantMate {
                        mate: mate.name.clone(),
                    });
                }
            }
            MateRole::Frame => {
                // The marker occurrence rides rigidly on the link it
                // annotates; re-fusing an already fused pair is normal.
                uf.union(unit_a, unit_b);
                frame_mates.push(m);
            }
            MateRole::Joint(kind) => structural.push(StructuralEdge {
                mate: m,
                name: cm.joint_name.clone(),
                kind,
                inverted: cm.inverted,
                a: unit_a,
                b: unit_b,
            }),
            MateRole::Unsupported => match config.on_unsupported {
                crate::config::UnsupportedPolicy::Strict => {
                    return Err(ResolveError::UnsupportedJointKind {
                        mate: mate.name.clone(),
                        kind: mate.kind,
                    })
                }
                crate::config::UnsupportedPolicy::Warn => warnings.push(Warning::UnsupportedMate {
                    mate: mate.name.clone(),
                    kind: mate.kind,
                }),
            },
            MateRole::NonStructural => warnings.push(Warning::NonStructuralMate {
                mate: mate.name.clone(),
                kind: mate.kind,
            }),
        }
    }

    // Root link: configured occurrence, else first top-level occurrence.
    let root_unit = match &config.root_occurrence {
        Some(id) => {
            let occ = graph.find_by_leaf_id(id).ok_or_else(|| {
                ResolveError::MalformedAssembly(format!("root occurrence '{id}' not found"))
            })?;
            unit_by_top[&graph.top_level(occ)]
        }
        None => 0,
    };
    let root_rep = uf.find(root_unit);

    // Components keyed by representative (ascending = flattening order).
    let mut component_units: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for unit in 0..units.len() {
        component_units.entry(uf.find(unit)).or_default().push(unit);
    }

    // Breadth-first traversal over articulated edges; per-link edge
    // lists keep declaration order, which is the tie-break rule.
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for (e, edge) in structural.iter().enumerate() {
        let rep_a = uf.find(edge.a);
        let rep_b = uf.find(edge.b);
        if rep_a == rep_b {
            // Articulating a link against itself; handled by the
            // redundancy sweep below.
            continue;
        }
        adjacency.entry(rep_a).or_default().push(e);
        adjacency.entry(rep_b).or_default().push(e);
    }

    let mut output_index: HashMap<usize, usize> = HashMap::new();
    let mut output_reps: Vec<usize> = Vec::new();
    let mut joints: Vec<JointEdge> = Vec::new();
    let mut used = vec![false; structural.len()];
    output_index.insert(root_rep, 0);
    output_reps.push(root_rep);
    let mut queue = VecDeque::from([root_rep]);
    while let Some(rep) = queue.pop_front() {
        let Some(edges) = adjacency.get(&rep) else {
            continue;
        };
        for &e in edges {
            if used[e] {
                continue;
            }
            let edge = &structural[e];
            let rep_a = uf.find(edge.a);
            let other = if rep_a == rep { uf.find(edge.b) } else { rep_a };
            if output_index.contains_key(&other) {
                continue;
            }
            used[e] = true;
            let child = output_reps.len();
            output_index.insert(other, child);
            output_reps.push(other);
            queue.push_back(other);
            joints.push(JointEdge {
                mate: edge.mate,
                name: edge.name.clone(),
                kind: edge.kind,
                inverted: edge.inverted,
                parent: output_index[&rep],
                child,
                child_endpoint: if uf.find(edge.a) == other { 0 } else { 1 },
            });
        }
    }

    // Redundancy sweep, declaration order: an unused edge whose
    // endpoints both ended up in the tree adds no new link.
    for (e, edge) in structural.iter().enumerate() {
        if used[e] {
            continue;
        }
        let rep_a = uf.find(edge.a);
        let rep_b = uf.find(edge.b);
        if output_index.contains_key(&rep_a) && output_index.contains_key(&rep_b) {
            warnings.push(Warning::RedundantMate {
                mate: graph.mates()[edge.mate].name.clone(),
            });
        }
    }

    // Anything not reached from the root is a hard failure.
    let unreached: Vec<String> = component_units
        .iter()
        .filter(|(rep, _)| !output_index.contains_key(rep))
        .map(|(rep, _)| graph.occurrence(units[*rep]).name.clone())
        .collect();
    if !unreached.is_empty() {
        return Err(ResolveError::DisconnectedAssembly { links: unreached });
    }

    // Materialize links in output order.
    let mut link_of_unit = vec![0usize; units.len()];
    let mut links: Vec<LinkNode> = Vec::with_capacity(output_reps.len());
    for (out, rep) in output_reps.iter().enumerate() {
        let members = component_units[rep].clone();
        for &unit in &members {
            link_of_unit[unit] = out;
        }
        links.push(LinkNode {
            name: String::new(),
            anchor: units[*rep],
            units: members,
        });
    }

    assign_names(graph, &unit_by_top, &link_of_unit, &mut links, warnings);

    Ok(ResolvedTree {
        links,
        units,
        link_of_unit,
        joints,
        frame_mates,
    })
}

/// Name links: a `link_*` tag from any constituent occurrence wins,
/// otherwise the anchor occurrence's part name; duplicates get a
/// positional suffix in output order.
fn assign_names(
    graph: &AssemblyGraph,
    unit_by_top: &HashMap<usize, usize>,
    link_of_unit: &[usize],
    links: &mut [LinkNode],
    warnings: &mut Vec<Warning>,
) {
    let mut tags: Vec<Option<String>> = vec![None; links.len()];
    let mut conflicts: Vec<(usize, String, String)> = Vec::new();
    for (index, occ) in graph.occurrences() {
        let Some(tag) = &occ.link_name else {
            continue;
        };
        let link = link_of_unit[unit_by_top[&graph.top_level(index)]];
        if let Some(kept) = &tags[link] {
            if kept != tag {
                conflicts.push((link, kept.clone(), tag.clone()));
            }
        } else {
            tags[link] = Some(tag.clone());
        }
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for (out, link) in links.iter_mut().enumerate() {
        let base = match tags[out].take() {
            Some(tag) => tag,
            None => part_name(&graph.occurrence(link.anchor).name),
        };
        let n = seen.entry(base.clone()).and_modify(|n| *n += 1).or_insert(1);
        link.name = if *n == 1 {
            base
        } else {
            format!("{base}_{n}")
        };
    }

    for (link, kept, rejected) in conflicts {
        warnings.push(Warning::LinkNameConflict {
            link: links[link].name.clone(),
            kept,
            rejected,
        });
    }
}

/// Derive a link name from an instance name: strip the trailing instance
/// counter token, lowercase, underscore-join, and replace the unit marks
/// that break downstream file naming.
fn part_name(instance_name: &str) -> String {
    let sanitized = instance_name.replace('"', "in").replace('\'', "ft");
    let mut tokens: Vec<&str> = sanitized.split_whitespace().collect();
    if tokens.len() > 1 {
        tokens.pop();
    }
    if tokens.is_empty() {
        return "link".to_string();
    }
    tokens.join("_").to_lowercase()
}
