//! Indexed, immutable view of one assembly snapshot.
//!
//! All downstream stages work over the indices built here: occurrences
//! flattened in first-seen depth-first order (the deterministic tie-break
//! order for the whole pipeline), world transforms composed once, and
//! mate endpoints resolved to occurrence indices. The graph is built
//! once per resolution and never mutated.

use std::collections::HashMap;

use kinforge_ir::{AssemblySnapshot, Mate, Occurrence, OccurrenceId, OccurrencePath};
use kinforge_math::Frame;

use crate::error::{ResolveError, Result};

/// Path depth interval at which composed world transforms are
/// re-orthonormalized to bound drift on deeply nested assemblies.
const RENORM_DEPTH: usize = 16;

/// Immutable indexed assembly graph.
#[derive(Debug)]
pub struct AssemblyGraph {
    /// Occurrences in depth-first flattening order, suppressed included
    /// (so mates to suppressed occurrences still resolve).
    occurrences: Vec<Occurrence>,
    /// World transform per occurrence (composed local-to-parent chain).
    world: Vec<Frame>,
    /// Effective suppression: the occurrence or any ancestor is suppressed.
    suppressed: Vec<bool>,
    by_path: HashMap<OccurrencePath, usize>,
    mates: Vec<Mate>,
    mate_endpoints: Vec<[usize; 2]>,
}

impl AssemblyGraph {
    /// Build and validate the graph from a snapshot.
    ///
    /// Fails with `MalformedAssembly` on empty/duplicate/cyclic paths,
    /// dangling parent chains, unknown mate references, or self-mates,
    /// and with `InvalidTransform` if any occurrence transform carries a
    /// non-orthonormal rotation.
    pub fn build(snapshot: &AssemblySnapshot) -> Result<Self> {
        let mut source_by_path: HashMap<&[OccurrenceId], usize> = HashMap::new();
        for (index, occ) in snapshot.occurrences.iter().enumerate() {
            if occ.path.is_empty() {
                return Err(ResolveError::MalformedAssembly(format!(
                    "occurrence '{}' has an empty path",
                    occ.name
                )));
            }
            for (depth, id) in occ.path.iter().enumerate() {
                if occ.path[depth + 1..].contains(id) {
                    return Err(ResolveError::MalformedAssembly(format!(
                        "cyclic sub-assembly instancing in path {:?}",
                        occ.path
                    )));
                }
            }
            if source_by_path.insert(&occ.path, index).is_some() {
                return Err(ResolveError::MalformedAssembly(format!(
                    "duplicate occurrence path {:?}",
                    occ.path
                )));
            }
        }

        // Children grouped under their parent path, in source order.
        let mut roots: Vec<usize> = Vec::new();
        let mut children: HashMap<&[OccurrenceId], Vec<usize>> = HashMap::new();
        for (index, occ) in snapshot.occurrences.iter().enumerate() {
            if occ.path.len() == 1 {
                roots.push(index);
            } else {
                let parent = &occ.path[..occ.path.len() - 1];
                if !source_by_path.contains_key(parent) {
                    return Err(ResolveError::MalformedAssembly(format!(
                        "occurrence {:?} has no parent occurrence {:?}",
                        occ.path, parent
                    )));
                }
                children.entry(parent).or_default().push(index);
            }
        }

        // First-seen depth-first flattening: parents before children,
        // source order among siblings.
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        let mut occurrences: Vec<Occurrence> = Vec::with_capacity(snapshot.occurrences.len());
        let mut world: Vec<Frame> = Vec::with_capacity(snapshot.occurrences.len());
        let mut suppressed: Vec<bool> = Vec::with_capacity(snapshot.occurrences.len());
        let mut by_path: HashMap<OccurrencePath, usize> = HashMap::new();
        while let Some(source_index) = stack.pop() {
            let occ = snapshot.occurrences[source_index].clone();
            if let Some(kids) = children.get(occ.path.as_slice()) {
                stack.extend(kids.iter().rev());
            }

            let local = Frame::from_matrix(&occ.transform)?;
            let (parent_world, parent_suppressed) = if occ.path.len() == 1 {
                (Frame::identity(), false)
            } else {
                let parent = by_path[&occ.path[..occ.path.len() - 1]];
                (world[parent], suppressed[parent])
            };
            let mut composed = parent_world.compose(&local);
            if occ.path.len() % RENORM_DEPTH == 0 {
                composed = composed.renormalized();
            }

            by_path.insert(occ.path.clone(), occurrences.len());
            world.push(composed);
            suppressed.push(parent_suppressed || occ.suppressed);
            occurrences.push(occ);
        }

        let mut mate_endpoints = Vec::with_capacity(snapshot.mates.len());
        for mate in &snapshot.mates {
            let mut resolved = [0usize; 2];
            for (side, endpoint) in mate.endpoints.iter().enumerate() {
                resolved[side] = *by_path.get(endpoint.occurrence.as_slice()).ok_or_else(|| {
                    ResolveError::MalformedAssembly(format!(
                        "mate '{}' references unknown occurrence {:?}",
                        mate.name, endpoint.occurrence
                    ))
                })?;
            }
            if resolved[0] == resolved[1] {
                return Err(ResolveError::MalformedAssembly(format!(
                    "mate '{}' connects an occurrence to itself",
                    mate.name
                )));
            }
            mate_endpoints.push(resolved);
        }

        Ok(Self {
            occurrences,
            world,
            suppressed,
            by_path,
            mates: snapshot.mates.clone(),
            mate_endpoints,
        })
    }

    /// Number of occurrences, suppressed included.
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// True when the graph holds no occurrences.
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Occurrence by flattening index.
    pub fn occurrence(&self, index: usize) -> &Occurrence {
        &self.occurrences[index]
    }

    /// World transform of an occurrence.
    pub fn world(&self, index: usize) -> &Frame {
        &self.world[index]
    }

    /// Effective suppression (the occurrence or any ancestor).
    pub fn is_suppressed(&self, index: usize) -> bool {
        self.suppressed[index]
    }

    /// Non-suppressed occurrences in depth-first flattening order.
    pub fn occurrences(&self) -> impl Iterator<Item = (usize, &Occurrence)> {
        self.occurrences
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.suppressed[*index])
    }

    /// All mates, in declaration order.
    pub fn mates(&self) -> &[Mate] {
        &self.mates
    }

    /// Occurrence indices of a mate's two endpoints.
    pub fn mate_endpoints(&self, mate: usize) -> [usize; 2] {
        self.mate_endpoints[mate]
    }

    /// Occurrence index by exact path.
    pub fn index_of_path(&self, path: &[OccurrenceId]) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// First non-suppressed occurrence (flattening order) whose leaf
    /// instance id matches.
    pub fn find_by_leaf_id(&self, id: &str) -> Option<usize> {
        self.occurrences
            .iter()
            .enumerate()
            .find(|(index, occ)| !self.suppressed[*index] && occ.id() == id)
            .map(|(index, _)| index)
    }

    /// Index of the top-level occurrence owning this one (itself when
    /// already top-level).
    pub fn top_level(&self, index: usize) -> usize {
        let path = &self.occurrences[index].path;
        if path.len() == 1 {
            index
        } else {
            self.by_path[&path[..1]]
        }
    }
}
